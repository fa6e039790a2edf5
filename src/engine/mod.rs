//! Scoring backends.
//!
//! The orchestrator talks to a [`Scorer`]; the production implementation is
//! [`ScoringClient`], which posts the form to `{base_url}/predict`.

mod client;

pub use client::ScoringClient;

use crate::model::{FormState, PredictionResult};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("scoring endpoint returned HTTP {status}")]
    Status { status: reqwest::StatusCode },
    #[error("malformed prediction body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl ScoreError {
    /// Transport-level failures, as opposed to a response we could not make sense of.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ScoreError::Transport { .. } | ScoreError::Status { .. } | ScoreError::Timeout(_)
        )
    }
}

#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, form: &FormState) -> Result<PredictionResult, ScoreError>;
}
