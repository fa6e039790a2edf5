//! Form state store.
//!
//! Holds the parameters of the next scoring request and applies edits.
//! Edits outside a field's domain are rejected and leave the form unchanged.

use crate::model::{
    Airbags, AreaCluster, FormState, FuelType, Segment, TransmissionType,
};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Editable form fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PolicyTenure,
    AreaCluster,
    Segment,
    AgeOfCar,
    FuelType,
    TransmissionType,
    NcapRating,
    Airbags,
    AgeOfPolicyholder,
    PopulationDensity,
}

/// Closed integer range of a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl Bounds {
    const fn new(min: u32, max: u32, step: u32) -> Self {
        Self { min, max, step }
    }

    pub fn contains(&self, v: i64) -> bool {
        v >= i64::from(self.min) && v <= i64::from(self.max)
    }
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::PolicyTenure,
        Field::AreaCluster,
        Field::Segment,
        Field::AgeOfCar,
        Field::FuelType,
        Field::TransmissionType,
        Field::NcapRating,
        Field::Airbags,
        Field::AgeOfPolicyholder,
        Field::PopulationDensity,
    ];

    /// Wire name, as used in the request body and `--set`.
    pub fn name(self) -> &'static str {
        match self {
            Field::PolicyTenure => "policy_tenure",
            Field::AreaCluster => "area_cluster",
            Field::Segment => "segment",
            Field::AgeOfCar => "age_of_car",
            Field::FuelType => "fuel_type",
            Field::TransmissionType => "transmission_type",
            Field::NcapRating => "ncap_rating",
            Field::Airbags => "airbags",
            Field::AgeOfPolicyholder => "age_of_policyholder",
            Field::PopulationDensity => "population_density",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::PolicyTenure => "Policy Tenure",
            Field::AreaCluster => "Area Cluster",
            Field::Segment => "Segment",
            Field::AgeOfCar => "Age of Car",
            Field::FuelType => "Fuel Type",
            Field::TransmissionType => "Transmission",
            Field::NcapRating => "NCAP Safety Rating",
            Field::Airbags => "Number of Airbags",
            Field::AgeOfPolicyholder => "Policyholder Age",
            Field::PopulationDensity => "Population Density",
        }
    }

    /// Range of numeric fields; `None` for enumerated ones.
    pub fn bounds(self) -> Option<Bounds> {
        match self {
            Field::PolicyTenure => Some(Bounds::new(1, 15, 1)),
            Field::AgeOfCar => Some(Bounds::new(0, 20, 1)),
            Field::AgeOfPolicyholder => Some(Bounds::new(18, 80, 1)),
            Field::PopulationDensity => Some(Bounds::new(100, 10_000, 50)),
            Field::NcapRating => Some(Bounds::new(1, 5, 1)),
            Field::AreaCluster
            | Field::Segment
            | Field::FuelType
            | Field::TransmissionType
            | Field::Airbags => None,
        }
    }

    /// Human-readable domain, used in error messages and help.
    pub fn domain(self) -> String {
        if let Some(b) = self.bounds() {
            return format!("{}..={}", b.min, b.max);
        }
        let members: Vec<String> = match self {
            Field::AreaCluster => vec![format!("C{}..C{}", AreaCluster::MIN, AreaCluster::MAX)],
            Field::Segment => Segment::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            Field::FuelType => FuelType::ALL.iter().map(|f| f.as_str().to_string()).collect(),
            Field::TransmissionType => TransmissionType::ALL
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
            Field::Airbags => Airbags::ALL.iter().map(|a| a.count().to_string()).collect(),
            _ => Vec::new(),
        };
        members.join(", ")
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Field::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FieldError::UnknownField(wanted.to_string()))
    }
}

/// A value proposed for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Number(i64),
    Text(String),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Number(v.into())
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown field {0:?}")]
    UnknownField(String),
    #[error("{field} must be within {domain}, got {value}")]
    OutOfRange {
        field: Field,
        value: i64,
        domain: String,
    },
    #[error("{field} must be one of {domain}, got {value:?}")]
    NotAllowed {
        field: Field,
        value: String,
        domain: String,
    },
    #[error("{field} expects a number, got {value:?}")]
    NotANumber { field: Field, value: String },
    #[error("expected name=value, got {0:?}")]
    MalformedAssignment(String),
}

/// Direction for stepping a field through its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Down,
    Up,
}

/// Owns the form under construction. Every stored value is inside its field's domain.
#[derive(Debug, Clone, Default)]
pub struct FormStore {
    state: FormState,
}

impl FormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = FormState::default();
    }

    /// Replace one field. Out-of-domain values are rejected without touching the form.
    pub fn set_field(&mut self, field: Field, value: impl Into<FieldValue>) -> Result<(), FieldError> {
        let value = value.into();
        let s = &mut self.state;
        match field {
            Field::PolicyTenure => s.policy_tenure = numeric_in_range(field, &value)? as u8,
            Field::AgeOfCar => s.age_of_car = numeric_in_range(field, &value)? as u8,
            Field::AgeOfPolicyholder => {
                s.age_of_policyholder = numeric_in_range(field, &value)? as u8
            }
            Field::PopulationDensity => {
                s.population_density = numeric_in_range(field, &value)? as u32
            }
            Field::NcapRating => s.ncap_rating = numeric_in_range(field, &value)? as u8,
            Field::Airbags => {
                let n = as_number(field, &value)?;
                s.airbags = Airbags::from_count(n).ok_or_else(|| FieldError::NotAllowed {
                    field,
                    value: n.to_string(),
                    domain: field.domain(),
                })?;
            }
            Field::AreaCluster => {
                let text = as_text(&value);
                s.area_cluster = text.parse().map_err(|_| not_allowed(field, &text))?;
            }
            Field::Segment => {
                s.segment = choose(field, Segment::ALL.as_slice(), &as_text(&value), |v| v.as_str())?
            }
            Field::FuelType => {
                s.fuel_type = choose(field, FuelType::ALL.as_slice(), &as_text(&value), |v| v.as_str())?
            }
            Field::TransmissionType => {
                s.transmission_type =
                    choose(field, TransmissionType::ALL.as_slice(), &as_text(&value), |v| v.as_str())?
            }
        }
        tracing::debug!(field = field.name(), ?value, "form field updated");
        Ok(())
    }

    /// Apply a `name=value` assignment.
    pub fn set_field_str(&mut self, assignment: &str) -> Result<Field, FieldError> {
        let (name, raw) = assignment
            .split_once('=')
            .ok_or_else(|| FieldError::MalformedAssignment(assignment.to_string()))?;
        let field: Field = name.parse()?;
        let raw = raw.trim();
        let value = match field.bounds() {
            Some(_) => FieldValue::Number(parse_number(field, raw)?),
            None if field == Field::Airbags => FieldValue::Number(parse_number(field, raw)?),
            None => FieldValue::Text(raw.to_string()),
        };
        self.set_field(field, value)?;
        Ok(field)
    }

    /// Move a field one step through its domain, saturating at either end.
    pub fn step_field(&mut self, field: Field, step: Step) {
        let s = &mut self.state;
        match field {
            Field::PolicyTenure => s.policy_tenure = step_u32(field, s.policy_tenure.into(), step) as u8,
            Field::AgeOfCar => s.age_of_car = step_u32(field, s.age_of_car.into(), step) as u8,
            Field::AgeOfPolicyholder => {
                s.age_of_policyholder = step_u32(field, s.age_of_policyholder.into(), step) as u8
            }
            Field::PopulationDensity => {
                s.population_density = step_u32(field, s.population_density, step)
            }
            Field::NcapRating => s.ncap_rating = step_u32(field, s.ncap_rating.into(), step) as u8,
            Field::Airbags => s.airbags = step_choice(Airbags::ALL.as_slice(), s.airbags, step),
            Field::Segment => s.segment = step_choice(Segment::ALL.as_slice(), s.segment, step),
            Field::FuelType => s.fuel_type = step_choice(FuelType::ALL.as_slice(), s.fuel_type, step),
            Field::TransmissionType => {
                s.transmission_type = step_choice(TransmissionType::ALL.as_slice(), s.transmission_type, step)
            }
            Field::AreaCluster => {
                let all: Vec<AreaCluster> = AreaCluster::all().collect();
                s.area_cluster = step_choice(all.as_slice(), s.area_cluster, step);
            }
        }
    }

    /// Current value of a field rendered for display.
    pub fn display_value(&self, field: Field) -> String {
        let s = &self.state;
        match field {
            Field::PolicyTenure => format!("{} years", s.policy_tenure),
            Field::AreaCluster => s.area_cluster.to_string(),
            Field::Segment => s.segment.display_label().to_string(),
            Field::AgeOfCar => format!("{} years", s.age_of_car),
            Field::FuelType => s.fuel_type.as_str().to_string(),
            Field::TransmissionType => s.transmission_type.as_str().to_string(),
            Field::NcapRating => format!("{} Stars", s.ncap_rating),
            Field::Airbags => match s.airbags.count() {
                1 => "1 Airbag".to_string(),
                n => format!("{n} Airbags"),
            },
            Field::AgeOfPolicyholder => format!("{} years", s.age_of_policyholder),
            Field::PopulationDensity => format!("{} people/km²", s.population_density),
        }
    }

    /// Numeric value of a ranged field, for slider rendering.
    pub fn numeric_value(&self, field: Field) -> Option<u32> {
        let s = &self.state;
        match field {
            Field::PolicyTenure => Some(s.policy_tenure.into()),
            Field::AgeOfCar => Some(s.age_of_car.into()),
            Field::AgeOfPolicyholder => Some(s.age_of_policyholder.into()),
            Field::PopulationDensity => Some(s.population_density),
            Field::NcapRating => Some(s.ncap_rating.into()),
            _ => None,
        }
    }
}

fn as_number(field: Field, value: &FieldValue) -> Result<i64, FieldError> {
    match value {
        FieldValue::Number(n) => Ok(*n),
        FieldValue::Text(t) => parse_number(field, t),
    }
}

fn as_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Text(t) => t.trim().to_string(),
    }
}

fn parse_number(field: Field, raw: &str) -> Result<i64, FieldError> {
    raw.trim().parse::<i64>().map_err(|_| FieldError::NotANumber {
        field,
        value: raw.to_string(),
    })
}

fn numeric_in_range(field: Field, value: &FieldValue) -> Result<u32, FieldError> {
    let n = as_number(field, value)?;
    let Some(bounds) = field.bounds() else {
        return Err(not_allowed(field, &n.to_string()));
    };
    if !bounds.contains(n) {
        return Err(FieldError::OutOfRange {
            field,
            value: n,
            domain: field.domain(),
        });
    }
    Ok(n as u32)
}

fn not_allowed(field: Field, value: &str) -> FieldError {
    FieldError::NotAllowed {
        field,
        value: value.to_string(),
        domain: field.domain(),
    }
}

fn choose<T: Copy>(
    field: Field,
    all: &[T],
    text: &str,
    name: impl Fn(T) -> &'static str,
) -> Result<T, FieldError> {
    all.iter()
        .copied()
        .find(|v| name(*v).eq_ignore_ascii_case(text))
        .ok_or_else(|| not_allowed(field, text))
}

fn step_u32(field: Field, current: u32, step: Step) -> u32 {
    let Some(b) = field.bounds() else {
        return current;
    };
    let next = match step {
        Step::Up => current.saturating_add(b.step),
        Step::Down => current.saturating_sub(b.step),
    };
    next.clamp(b.min, b.max)
}

fn step_choice<T: Copy + PartialEq>(all: &[T], current: T, step: Step) -> T {
    let Some(idx) = all.iter().position(|v| *v == current) else {
        return current;
    };
    let next = match step {
        Step::Up => (idx + 1).min(all.len() - 1),
        Step::Down => idx.saturating_sub(1),
    };
    all[next]
}
