use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub base_url: String,
    /// Minimum time a submission stays visible as in progress.
    pub min_duration: Duration,
    pub request_timeout: Option<Duration>,
    pub resubmit: ResubmitPolicy,
    pub user_agent: String,
}

/// What to do when a submission is triggered while another is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ResubmitPolicy {
    /// Drop the new submission until the current one settles.
    #[default]
    Ignore,
    /// Start the new submission; only the most recent one may settle.
    Supersede,
}

/// Vehicle market segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    A,
    B1,
    B2,
    C1,
    C2,
    D,
    Utility,
}

impl Segment {
    pub const ALL: [Segment; 7] = [
        Segment::A,
        Segment::B1,
        Segment::B2,
        Segment::C1,
        Segment::C2,
        Segment::D,
        Segment::Utility,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Segment::A => "A",
            Segment::B1 => "B1",
            Segment::B2 => "B2",
            Segment::C1 => "C1",
            Segment::C2 => "C2",
            Segment::D => "D",
            Segment::Utility => "Utility",
        }
    }

    /// Label shown in selectors.
    pub fn display_label(self) -> &'static str {
        match self {
            Segment::A => "A (Mini)",
            other => other.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    Petrol,
    Diesel,
    #[serde(rename = "CNG")]
    Cng,
    Electric,
    Hybrid,
}

impl FuelType {
    pub const ALL: [FuelType; 5] = [
        FuelType::Petrol,
        FuelType::Diesel,
        FuelType::Cng,
        FuelType::Electric,
        FuelType::Hybrid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FuelType::Petrol => "Petrol",
            FuelType::Diesel => "Diesel",
            FuelType::Cng => "CNG",
            FuelType::Electric => "Electric",
            FuelType::Hybrid => "Hybrid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransmissionType {
    Manual,
    Automatic,
}

impl TransmissionType {
    pub const ALL: [TransmissionType; 2] = [TransmissionType::Manual, TransmissionType::Automatic];

    pub fn as_str(self) -> &'static str {
        match self {
            TransmissionType::Manual => "Manual",
            TransmissionType::Automatic => "Automatic",
        }
    }
}

/// Area cluster code `C1` through `C22`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AreaCluster(u8);

impl AreaCluster {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 22;

    pub fn new(n: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&n).then_some(Self(n))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = AreaCluster> {
        (Self::MIN..=Self::MAX).map(AreaCluster)
    }
}

impl fmt::Display for AreaCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

impl FromStr for AreaCluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_prefix(['C', 'c'])
            .ok_or_else(|| format!("area cluster must look like C1..C22, got {s:?}"))?;
        digits
            .parse::<u8>()
            .ok()
            .and_then(AreaCluster::new)
            .ok_or_else(|| format!("area cluster must be C1..C22, got {s:?}"))
    }
}

impl TryFrom<String> for AreaCluster {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AreaCluster> for String {
    fn from(value: AreaCluster) -> Self {
        value.to_string()
    }
}

/// Airbag count; only the fitments the model was trained on are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Airbags {
    Zero = 0,
    One = 1,
    Two = 2,
    Four = 4,
    Six = 6,
    Eight = 8,
}

impl Airbags {
    pub const ALL: [Airbags; 6] = [
        Airbags::Zero,
        Airbags::One,
        Airbags::Two,
        Airbags::Four,
        Airbags::Six,
        Airbags::Eight,
    ];

    pub fn count(self) -> u8 {
        self as u8
    }

    pub fn from_count(n: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|a| i64::from(a.count()) == n)
    }
}

impl TryFrom<u8> for Airbags {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Airbags::from_count(i64::from(value))
            .ok_or_else(|| format!("airbags must be one of 0, 1, 2, 4, 6, 8; got {value}"))
    }
}

impl From<Airbags> for u8 {
    fn from(value: Airbags) -> Self {
        value.count()
    }
}

/// Request payload sent to the scoring endpoint.
///
/// Mutate through [`crate::form::FormStore`], which keeps every field inside
/// its domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub policy_tenure: u8,
    pub age_of_car: u8,
    pub age_of_policyholder: u8,
    pub population_density: u32,
    pub area_cluster: AreaCluster,
    pub segment: Segment,
    pub fuel_type: FuelType,
    pub transmission_type: TransmissionType,
    pub airbags: Airbags,
    pub ncap_rating: u8,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            policy_tenure: 3,
            age_of_car: 2,
            age_of_policyholder: 35,
            population_density: 200,
            area_cluster: AreaCluster(18),
            segment: Segment::B2,
            fuel_type: FuelType::Petrol,
            transmission_type: TransmissionType::Manual,
            airbags: Airbags::Two,
            ncap_rating: 4,
        }
    }
}

/// Risk level as reported by the scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[serde(other)]
    Unknown,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Unknown => "Unknown",
        }
    }
}

/// Binary model decision, `1` on the wire for a likely claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Decision {
    NoClaim,
    Claim,
}

impl TryFrom<u8> for Decision {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Decision::NoClaim),
            1 => Ok(Decision::Claim),
            other => Err(format!("prediction must be 0 or 1, got {other}")),
        }
    }
}

impl From<Decision> for u8 {
    fn from(value: Decision) -> Self {
        match value {
            Decision::NoClaim => 0,
            Decision::Claim => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub claim_probability: f64,
    pub prediction: Decision,
    pub risk_level: RiskLevel,
    pub threshold_used: f64,
    #[serde(default)]
    pub top_risk_drivers: Vec<String>,
}

/// Phase of the current prediction request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(String),
}

impl Lifecycle {
    pub fn name(&self) -> &'static str {
        match self {
            Lifecycle::Idle => "idle",
            Lifecycle::Submitting => "submitting",
            Lifecycle::Succeeded => "succeeded",
            Lifecycle::Failed(_) => "failed",
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Lifecycle::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_form_serializes_with_wire_names() {
        let v = serde_json::to_value(FormState::default()).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "policy_tenure": 3,
                "age_of_car": 2,
                "age_of_policyholder": 35,
                "population_density": 200,
                "area_cluster": "C18",
                "segment": "B2",
                "fuel_type": "Petrol",
                "transmission_type": "Manual",
                "airbags": 2,
                "ncap_rating": 4
            })
        );
    }

    #[test]
    fn cng_uses_upper_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&FuelType::Cng).unwrap(), "\"CNG\"");
    }

    #[test]
    fn area_cluster_parsing_respects_range() {
        assert_eq!("C1".parse::<AreaCluster>().unwrap().number(), 1);
        assert_eq!("c22".parse::<AreaCluster>().unwrap().number(), 22);
        assert!("C0".parse::<AreaCluster>().is_err());
        assert!("C23".parse::<AreaCluster>().is_err());
        assert!("18".parse::<AreaCluster>().is_err());
        assert_eq!(AreaCluster::all().count(), 22);
    }

    #[test]
    fn airbags_reject_unlisted_counts() {
        assert!(serde_json::from_str::<Airbags>("3").is_err());
        assert_eq!(serde_json::from_str::<Airbags>("6").unwrap(), Airbags::Six);
    }

    #[test]
    fn prediction_result_parses_service_body() {
        let body = r#"{
            "claim_probability": 0.82,
            "prediction": 1,
            "risk_level": "High",
            "threshold_used": 0.4,
            "top_risk_drivers": ["Area Cluster", "Low NCAP rating"]
        }"#;
        let r: PredictionResult = serde_json::from_str(body).unwrap();
        assert_eq!(r.prediction, Decision::Claim);
        assert_eq!(r.risk_level, RiskLevel::High);
        assert_eq!(r.top_risk_drivers, vec!["Area Cluster", "Low NCAP rating"]);
    }

    #[test]
    fn prediction_result_tolerates_missing_drivers_and_unknown_level() {
        let body = r#"{"claim_probability":0.1,"prediction":0,"risk_level":"Minimal","threshold_used":0.4}"#;
        let r: PredictionResult = serde_json::from_str(body).unwrap();
        assert_eq!(r.risk_level, RiskLevel::Unknown);
        assert!(r.top_risk_drivers.is_empty());
    }

    #[test]
    fn prediction_outside_binary_domain_is_rejected() {
        let body = r#"{"claim_probability":0.1,"prediction":2,"risk_level":"Low","threshold_used":0.4}"#;
        assert!(serde_json::from_str::<PredictionResult>(body).is_err());
    }
}
