//! Prediction orchestration.
//!
//! This module owns the request lifecycle: a [`Session`] holds the form and
//! the visible state, [`Orchestrator`] runs requests against a scorer with
//! the minimum-duration gate, and the controller task serves the TUI over
//! channels so the UI thread never blocks on the network.

#[cfg(feature = "tui")]
mod controller;
mod request;
mod session;
#[cfg(test)]
pub(crate) mod testing;

#[cfg(feature = "tui")]
pub(crate) use controller::{run_controller, SessionEvent, UiCommand};
pub use request::{Failure, Gate, Outcome, Ticket, MSG_TRANSPORT, MSG_UNEXPECTED};
pub use session::Session;

use crate::engine::Scorer;
use crate::model::RunConfig;
use std::future::Future;
use std::sync::Arc;

#[derive(Clone)]
pub struct Orchestrator {
    scorer: Arc<dyn Scorer>,
    gate: Gate,
}

impl Orchestrator {
    pub fn new(scorer: Arc<dyn Scorer>, cfg: &RunConfig) -> Self {
        Self::with_gate(
            scorer,
            Gate {
                min_duration: cfg.min_duration,
                timeout: cfg.request_timeout,
            },
        )
    }

    pub fn with_gate(scorer: Arc<dyn Scorer>, gate: Gate) -> Self {
        Self { scorer, gate }
    }

    /// Run a ticket to completion. The future owns everything it needs and can be spawned.
    pub fn dispatch(&self, ticket: Ticket) -> impl Future<Output = Outcome> + Send + 'static {
        let scorer = self.scorer.clone();
        let gate = self.gate;
        async move { request::run_request(scorer.as_ref(), ticket, gate).await }
    }

    /// Submit the session's form and wait for it to settle.
    ///
    /// Returns `false` if the session refused the submission.
    pub async fn submit(&self, session: &mut Session) -> bool {
        let Some(ticket) = session.begin_submit() else {
            return false;
        };
        let outcome = self.dispatch(ticket).await;
        session.settle(outcome)
    }
}
