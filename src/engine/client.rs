use super::{ScoreError, Scorer};
use crate::model::{FormState, PredictionResult, RunConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;

/// HTTP client for the remote scoring model.
#[derive(Clone)]
pub struct ScoringClient {
    http: reqwest::Client,
    predict_url: Url,
}

impl ScoringClient {
    pub fn new(cfg: &RunConfig) -> Result<Self> {
        let predict_url = predict_url(&cfg.base_url)?;
        // No client-level timeout: the orchestrator owns request timing.
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("build HTTP client")?;
        Ok(Self { http, predict_url })
    }

    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }
}

/// Join the configured base URL and the `/predict` route.
fn predict_url(base_url: &str) -> Result<Url> {
    let base = base_url.trim().trim_end_matches('/');
    if base.is_empty() {
        anyhow::bail!("scoring service base URL is empty (set --base-url or PREDICTION_API_URL)");
    }
    Url::parse(&format!("{base}/predict")).with_context(|| format!("invalid base URL {base_url:?}"))
}

#[async_trait]
impl Scorer for ScoringClient {
    async fn score(&self, form: &FormState) -> Result<PredictionResult, ScoreError> {
        let transport = |source: reqwest::Error| ScoreError::Transport {
            url: self.predict_url.to_string(),
            source,
        };

        tracing::debug!(url = %self.predict_url, "posting prediction request");
        let resp = self
            .http
            .post(self.predict_url.clone())
            .json(form)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScoreError::Status { status });
        }

        let body = resp.bytes().await.map_err(transport)?;
        Ok(serde_json::from_slice(&body)?)
    }
}
