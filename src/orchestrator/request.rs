//! A single scoring request joined with the minimum-duration gate.

use crate::engine::{ScoreError, Scorer};
use crate::model::{FormState, PredictionResult};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::Instant;

pub const MSG_TRANSPORT: &str = "Failed to get prediction from the model";
pub const MSG_UNEXPECTED: &str = "An error occurred while processing your request";

/// User-facing failure class. Raw error detail is logged, never shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Non-2xx status, connection error or timeout.
    Transport,
    /// Anything else on the request/parse path.
    Unexpected,
}

impl Failure {
    pub fn message(self) -> &'static str {
        match self {
            Failure::Transport => MSG_TRANSPORT,
            Failure::Unexpected => MSG_UNEXPECTED,
        }
    }
}

impl From<&ScoreError> for Failure {
    fn from(e: &ScoreError) -> Self {
        if e.is_transport() {
            Failure::Transport
        } else {
            Failure::Unexpected
        }
    }
}

/// Snapshot of the form taken when a submission starts.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub seq: u64,
    pub form: FormState,
}

/// Result of one submission, tagged with its sequence number.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub seq: u64,
    pub result: Result<PredictionResult, Failure>,
    /// Time the scorer actually took.
    pub network_elapsed: Duration,
    /// Time from dispatch to settlement; never below the minimum duration.
    pub total_elapsed: Duration,
}

impl Outcome {
    /// Outcome for a submission whose task died before reporting.
    pub fn lost(seq: u64) -> Self {
        Self {
            seq,
            result: Err(Failure::Unexpected),
            network_elapsed: Duration::ZERO,
            total_elapsed: Duration::ZERO,
        }
    }
}

/// Timing rules applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct Gate {
    pub min_duration: Duration,
    pub timeout: Option<Duration>,
}

/// Run the scorer and the minimum-duration timer side by side; return after both finish.
pub async fn run_request(scorer: &dyn Scorer, ticket: Ticket, gate: Gate) -> Outcome {
    let started = Instant::now();

    let network = async {
        let t0 = Instant::now();
        let call = AssertUnwindSafe(scorer.score(&ticket.form)).catch_unwind();
        let res = match gate.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(r) => r,
                Err(_) => Ok(Err(ScoreError::Timeout(limit))),
            },
            None => call.await,
        };
        (res, t0.elapsed())
    };

    let ((res, network_elapsed), ()) = tokio::join!(network, tokio::time::sleep(gate.min_duration));

    let result = match res {
        Ok(Ok(prediction)) => Ok(prediction),
        Ok(Err(e)) => {
            let failure = Failure::from(&e);
            tracing::warn!(seq = ticket.seq, error = %e, ?failure, "prediction request failed");
            Err(failure)
        }
        Err(_) => {
            tracing::error!(seq = ticket.seq, "scorer panicked");
            Err(Failure::Unexpected)
        }
    };

    Outcome {
        seq: ticket.seq,
        result,
        network_elapsed,
        total_elapsed: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::testing::{prediction, Scripted};

    fn ticket() -> Ticket {
        Ticket {
            seq: 1,
            form: FormState::default(),
        }
    }

    const GATE: Gate = Gate {
        min_duration: Duration::from_millis(5000),
        timeout: None,
    };

    #[tokio::test(start_paused = true)]
    async fn fast_response_still_waits_for_the_gate() {
        let scorer = Scripted::ok(Duration::from_millis(20), prediction(0.3));
        let start = Instant::now();
        let out = run_request(&scorer, ticket(), GATE).await;
        assert!(start.elapsed() >= Duration::from_millis(5000));
        assert!(out.total_elapsed >= Duration::from_millis(5000));
        assert_eq!(out.network_elapsed, Duration::from_millis(20));
        assert!(out.result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn errors_also_wait_for_the_gate() {
        let scorer = Scripted::status(Duration::ZERO, 500);
        let start = Instant::now();
        let out = run_request(&scorer, ticket(), GATE).await;
        assert!(start.elapsed() >= Duration::from_millis(5000));
        assert_eq!(out.result, Err(Failure::Transport));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_response_settles_when_network_finishes() {
        let scorer = Scripted::ok(Duration::from_millis(7500), prediction(0.3));
        let start = Instant::now();
        let out = run_request(&scorer, ticket(), GATE).await;
        assert_eq!(start.elapsed(), Duration::from_millis(7500));
        assert_eq!(out.network_elapsed, Duration::from_millis(7500));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_a_transport_failure() {
        let scorer = Scripted::ok(Duration::from_secs(3600), prediction(0.3));
        let gate = Gate {
            timeout: Some(Duration::from_secs(30)),
            ..GATE
        };
        let start = Instant::now();
        let out = run_request(&scorer, ticket(), gate).await;
        assert_eq!(start.elapsed(), Duration::from_secs(30));
        assert_eq!(out.result, Err(Failure::Transport));
        assert_eq!(out.result.unwrap_err().message(), MSG_TRANSPORT);
    }

    #[tokio::test(start_paused = true)]
    async fn decode_errors_and_panics_are_unexpected() {
        let out = run_request(&Scripted::malformed(), ticket(), GATE).await;
        assert_eq!(out.result, Err(Failure::Unexpected));

        let out = run_request(&Scripted::panics(), ticket(), GATE).await;
        assert_eq!(out.result, Err(Failure::Unexpected));
        assert_eq!(Failure::Unexpected.message(), MSG_UNEXPECTED);
    }
}
