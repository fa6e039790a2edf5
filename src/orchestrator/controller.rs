//! Request controller for interactive sessions.
//!
//! Runs on the Tokio runtime, executes submissions handed over by the UI and
//! emits their outcomes back. The UI thread owns the [`Session`] and applies
//! outcomes itself, so stale ones are filtered where the state lives.
//!
//! [`Session`]: super::Session

use super::{Orchestrator, Outcome, Ticket};
use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Events sent back to the UI layer.
#[derive(Debug)]
pub(crate) enum SessionEvent {
    // Boxed: outcomes carry the whole prediction.
    Settled(Box<Outcome>),
}

/// Commands emitted by the UI layer.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Submit(Ticket),
    Quit,
}

/// Execute submissions and report outcomes until the UI quits or hangs up.
pub(crate) async fn run_controller(
    orchestrator: Orchestrator,
    event_tx: UnboundedSender<SessionEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut in_flight = FuturesUnordered::new();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit(ticket)) => {
                        let seq = ticket.seq;
                        let handle = tokio::spawn(orchestrator.dispatch(ticket));
                        in_flight.push(async move { (seq, handle.await) });
                    }
                    Some(UiCommand::Quit) | None => {
                        // In-flight requests are abandoned; their outcomes have no reader.
                        if !in_flight.is_empty() {
                            tracing::debug!(pending = in_flight.len(), "quitting with requests in flight");
                        }
                        break;
                    }
                }
            }
            Some((seq, joined)) = in_flight.next(), if !in_flight.is_empty() => {
                let outcome = joined.unwrap_or_else(|e| {
                    tracing::error!(seq, error = %e, "prediction task failed to join");
                    Outcome::lost(seq)
                });
                if event_tx.send(SessionEvent::Settled(Box::new(outcome))).is_err() {
                    break;
                }
            }
        }
    }

    Ok(())
}
