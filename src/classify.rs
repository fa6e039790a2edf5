//! Presentation classifications derived from a prediction and the form.
//!
//! All functions are total over their input domain and have no side effects.
//! The client-side risk band is computed from the probability alone and is
//! independent of the `risk_level` the service reports.

use crate::model::{Decision, PredictionResult, RiskLevel};
use serde::Serialize;

pub const RISK_MEDIUM_FROM: f64 = 0.4;
pub const RISK_HIGH_FROM: f64 = 0.7;
pub const DENSITY_MEDIUM_FROM: u32 = 300;
pub const DENSITY_HIGH_FROM: u32 = 700;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Band {
    Low,
    Medium,
    High,
}

impl Band {
    pub fn as_str(self) -> &'static str {
        match self {
            Band::Low => "Low",
            Band::Medium => "Medium",
            Band::High => "High",
        }
    }

    /// Lower is better for every banded quantity we show.
    pub fn tone(self) -> Tone {
        match self {
            Band::Low => Tone::Positive,
            Band::Medium => Tone::Caution,
            Band::High => Tone::Danger,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NcapBand {
    Favorable,
    Neutral,
    Unfavorable,
}

impl NcapBand {
    pub fn tone(self) -> Tone {
        match self {
            NcapBand::Favorable => Tone::Positive,
            NcapBand::Neutral => Tone::Caution,
            NcapBand::Unfavorable => Tone::Danger,
        }
    }
}

/// Color family a presentation layer maps to concrete colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tone {
    Positive,
    Caution,
    Danger,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Icon {
    Check,
    Warning,
    Shield,
}

impl Icon {
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::Check => "✔",
            Icon::Warning => "⚠",
            Icon::Shield => "⛨",
        }
    }
}

/// Band of a claim probability. 0.4 and 0.7 belong to the higher band; NaN is High.
pub fn risk_band(probability: f64) -> Band {
    if probability < RISK_MEDIUM_FROM {
        Band::Low
    } else if probability < RISK_HIGH_FROM {
        Band::Medium
    } else {
        Band::High
    }
}

pub fn decision_label(decision: Decision) -> &'static str {
    match decision {
        Decision::Claim => "Likely to Claim",
        Decision::NoClaim => "Unlikely to Claim",
    }
}

pub fn decision_short_label(decision: Decision) -> &'static str {
    match decision {
        Decision::Claim => "CLAIM",
        Decision::NoClaim => "NO CLAIM",
    }
}

pub fn decision_tone(decision: Decision) -> Tone {
    match decision {
        Decision::Claim => Tone::Danger,
        Decision::NoClaim => Tone::Positive,
    }
}

pub fn decision_icon(decision: Decision) -> Icon {
    match decision {
        Decision::Claim => Icon::Warning,
        Decision::NoClaim => Icon::Check,
    }
}

/// Affects color only; density is sent to the model unchanged.
pub fn density_band(density: u32) -> Band {
    if density < DENSITY_MEDIUM_FROM {
        Band::Low
    } else if density < DENSITY_HIGH_FROM {
        Band::Medium
    } else {
        Band::High
    }
}

pub fn ncap_band(rating: u8) -> NcapBand {
    match rating {
        r if r >= 4 => NcapBand::Favorable,
        3 => NcapBand::Neutral,
        _ => NcapBand::Unfavorable,
    }
}

pub fn risk_level_tone(level: RiskLevel) -> Tone {
    match level {
        RiskLevel::Low => Tone::Positive,
        RiskLevel::Medium => Tone::Caution,
        RiskLevel::High => Tone::Danger,
        RiskLevel::Unknown => Tone::Neutral,
    }
}

pub fn risk_level_icon(level: RiskLevel) -> Icon {
    match level {
        RiskLevel::Low => Icon::Check,
        RiskLevel::Medium | RiskLevel::High => Icon::Warning,
        RiskLevel::Unknown => Icon::Shield,
    }
}

/// Position of a slider value within its range, split in thirds.
pub fn slider_band(value: u32, min: u32, max: u32) -> Band {
    if max <= min {
        return Band::Low;
    }
    let pct = (f64::from(value.saturating_sub(min)) / f64::from(max - min)) * 100.0;
    if pct < 33.0 {
        Band::Low
    } else if pct < 66.0 {
        Band::Medium
    } else {
        Band::High
    }
}

/// Render a `[0, 1]` fraction as a percentage with fixed decimals, e.g. `82.00%`.
pub fn format_percent(fraction: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, fraction * 100.0)
}

/// Everything the result panel needs, derived from one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub risk_band: Band,
    pub risk_tone: Tone,
    pub probability_pct: String,
    pub threshold_pct: String,
    pub decision_label: &'static str,
    pub decision_short: &'static str,
    pub decision_tone: Tone,
    pub decision_icon: Icon,
    pub risk_level_tone: Tone,
    pub risk_level_icon: Icon,
}

impl Classification {
    pub fn from_result(r: &PredictionResult) -> Self {
        let band = risk_band(r.claim_probability);
        Self {
            risk_band: band,
            risk_tone: band.tone(),
            probability_pct: format_percent(r.claim_probability, 2),
            threshold_pct: format_percent(r.threshold_used, 0),
            decision_label: decision_label(r.prediction),
            decision_short: decision_short_label(r.prediction),
            decision_tone: decision_tone(r.prediction),
            decision_icon: decision_icon(r.prediction),
            risk_level_tone: risk_level_tone(r.risk_level),
            risk_level_icon: risk_level_icon(r.risk_level),
        }
    }
}
