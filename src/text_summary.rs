//! Summary builders for non-interactive output.
//!
//! Text mode prints human-readable lines; JSON mode serializes a [`Report`].

use crate::classify::{self, Classification};
use crate::model::{FormState, Lifecycle, PredictionResult, RunConfig};
use crate::orchestrator::Session;
use serde::Serialize;
use std::time::Duration;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Machine-readable outcome of a one-shot submission.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Report {
    pub timestamp_utc: String,
    pub base_url: String,
    pub form: FormState,
    pub lifecycle: &'static str,
    pub error: Option<String>,
    pub result: Option<PredictionResult>,
    pub classification: Option<Classification>,
    #[serde(with = "humantime_serde")]
    pub network_elapsed: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub total_elapsed: Option<Duration>,
}

pub(crate) fn build_report(cfg: &RunConfig, session: &Session) -> Report {
    let timing = session.timing();
    Report {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        base_url: cfg.base_url.clone(),
        form: submitted_or_current(session).clone(),
        lifecycle: session.lifecycle().name(),
        error: session.error().map(str::to_string),
        result: session.result().cloned(),
        classification: session.classification(),
        network_elapsed: timing.map(|t| t.network),
        total_elapsed: timing.map(|t| t.total),
    }
}

pub(crate) fn build_text_summary(session: &Session) -> TextSummary {
    let mut lines = Vec::new();
    let form = submitted_or_current(session);
    lines.push(format!(
        "Policy: tenure {}y, cluster {}, segment {}, car age {}y, {} / {}",
        form.policy_tenure,
        form.area_cluster,
        form.segment.as_str(),
        form.age_of_car,
        form.fuel_type.as_str(),
        form.transmission_type.as_str(),
    ));
    lines.push(format!(
        "Safety: NCAP {} ({:?}), {} airbags; driver {}y, density {} ({})",
        form.ncap_rating,
        classify::ncap_band(form.ncap_rating),
        form.airbags.count(),
        form.age_of_policyholder,
        form.population_density,
        classify::density_band(form.population_density).as_str(),
    ));

    match (session.lifecycle(), session.result()) {
        (Lifecycle::Succeeded, Some(r)) => {
            let c = Classification::from_result(r);
            lines.push(format!(
                "Claim probability: {} ({} risk, threshold {})",
                c.probability_pct,
                c.risk_band.as_str(),
                c.threshold_pct
            ));
            lines.push(format!(
                "Reported risk level: {} {}",
                c.risk_level_icon.glyph(),
                r.risk_level.as_str()
            ));
            lines.push(format!(
                "Decision: {} {} ({})",
                c.decision_icon.glyph(),
                c.decision_label,
                c.decision_short
            ));
            if !r.top_risk_drivers.is_empty() {
                lines.push("Top risk drivers:".to_string());
                for (i, driver) in r.top_risk_drivers.iter().enumerate() {
                    lines.push(format!("  {}. {}", i + 1, driver));
                }
            }
        }
        (Lifecycle::Failed(msg), _) => lines.push(format!("Error: {msg}")),
        (other, _) => lines.push(format!("Status: {}", other.name())),
    }

    if let Some(t) = session.timing() {
        lines.push(format!(
            "Timing: model answered in {}, settled after {}",
            humantime::format_duration(round_ms(t.network)),
            humantime::format_duration(round_ms(t.total)),
        ));
    }

    TextSummary { lines }
}

/// The form behind the shown outcome, or the form being edited if nothing has settled.
fn submitted_or_current(session: &Session) -> &FormState {
    session
        .submitted_form()
        .unwrap_or_else(|| session.form().state())
}

fn round_ms(d: Duration) -> Duration {
    Duration::from_millis(d.as_millis() as u64)
}
