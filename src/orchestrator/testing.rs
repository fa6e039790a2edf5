//! Scripted scorers for orchestrator tests.

use crate::engine::{ScoreError, Scorer};
use crate::model::{Decision, FormState, PredictionResult, RiskLevel};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) fn prediction(p: f64) -> PredictionResult {
    PredictionResult {
        claim_probability: p,
        prediction: if p >= 0.4 {
            Decision::Claim
        } else {
            Decision::NoClaim
        },
        risk_level: RiskLevel::Low,
        threshold_used: 0.4,
        top_risk_drivers: Vec::new(),
    }
}

#[derive(Clone)]
enum Reply {
    Ok(PredictionResult),
    Status(u16),
    Malformed,
    Panic,
}

/// Replies the same way to every request after a fixed (tokio) delay.
pub(crate) struct Scripted {
    delay: Duration,
    reply: Reply,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(delay: Duration, reply: Reply) -> Self {
        Self {
            delay,
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn ok(delay: Duration, result: PredictionResult) -> Self {
        Self::new(delay, Reply::Ok(result))
    }

    pub fn status(delay: Duration, code: u16) -> Self {
        Self::new(delay, Reply::Status(code))
    }

    pub fn malformed() -> Self {
        Self::new(Duration::ZERO, Reply::Malformed)
    }

    pub fn panics() -> Self {
        Self::new(Duration::ZERO, Reply::Panic)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scorer for Scripted {
    async fn score(&self, _form: &FormState) -> Result<PredictionResult, ScoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match self.reply.clone() {
            Reply::Ok(r) => Ok(r),
            Reply::Status(code) => Err(ScoreError::Status {
                status: reqwest::StatusCode::from_u16(code).expect("valid status"),
            }),
            Reply::Malformed => Err(serde_json::from_str::<PredictionResult>("{").unwrap_err().into()),
            Reply::Panic => panic!("scripted scorer panic"),
        }
    }
}

/// Picks a script by the form's `policy_tenure`, so concurrent submissions can differ.
pub(crate) struct ByTenure(pub HashMap<u8, Scripted>);

#[async_trait]
impl Scorer for ByTenure {
    async fn score(&self, form: &FormState) -> Result<PredictionResult, ScoreError> {
        match self.0.get(&form.policy_tenure) {
            Some(s) => s.score(form).await,
            None => Err(ScoreError::Status {
                status: reqwest::StatusCode::NOT_FOUND,
            }),
        }
    }
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub(crate) async fn serve(app: axum::Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// A `/predict` endpoint answering every request with `status` and `body`.
pub(crate) fn predict_route(status: u16, body: serde_json::Value) -> axum::Router {
    let status = axum::http::StatusCode::from_u16(status).expect("valid status");
    axum::Router::new().route(
        "/predict",
        axum::routing::post(move || {
            let body = body.clone();
            async move { (status, axum::Json(body)) }
        }),
    )
}

/// The documented high-risk response.
pub(crate) fn high_risk_body() -> serde_json::Value {
    serde_json::json!({
        "claim_probability": 0.82,
        "prediction": 1,
        "risk_level": "High",
        "threshold_used": 0.4,
        "top_risk_drivers": ["Area Cluster", "Low NCAP rating"]
    })
}
