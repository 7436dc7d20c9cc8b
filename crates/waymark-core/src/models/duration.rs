//! Activity duration and its legacy shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unit of a [`Duration`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Minutes,
    /// Unit assumed for legacy bare numbers
    #[default]
    Hours,
    Days,
}

impl DurationUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationUnit::Minutes => "minutes",
            DurationUnit::Hours => "hours",
            DurationUnit::Days => "days",
        }
    }
}

/// How long a plan runs. Always `{value, unit}` once inside a draft.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "DurationShape")]
pub struct Duration {
    pub value: u32,
    pub unit: DurationUnit,
}

/// Shapes accepted on the way in.
#[derive(Deserialize)]
#[serde(untagged)]
enum DurationShape {
    Canonical {
        value: f64,
        #[serde(default)]
        unit: DurationUnit,
    },
    /// Older plans stored the number of hours directly
    Bare(f64),
}

impl TryFrom<DurationShape> for Duration {
    type Error = String;

    fn try_from(shape: DurationShape) -> Result<Self, Self::Error> {
        match shape {
            DurationShape::Canonical { value, unit } => Duration::from_fractional(value, unit),
            DurationShape::Bare(value) => Duration::from_fractional(value, DurationUnit::Hours),
        }
    }
}

/// `value` is within this distance of a whole number.
const WHOLE_EPSILON: f64 = 1e-6;

fn whole(value: f64) -> Option<f64> {
    let rounded = value.round();
    ((value - rounded).abs() < WHOLE_EPSILON).then_some(rounded)
}

impl Duration {
    /// Normalizes a possibly fractional amount.
    ///
    /// Fractional hours become exact minutes (1.5 hours is 90 minutes);
    /// fractional minutes round up. Fractional days round up, since a plan
    /// that runs into another day needs that day's itinerary.
    ///
    /// # Errors
    ///
    /// Negative, non-finite or out-of-range values.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_fractional(value: f64, unit: DurationUnit) -> Result<Self, String> {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("invalid duration: {value}"));
        }
        let (amount, unit) = match (whole(value), unit) {
            (Some(amount), unit) => (amount, unit),
            (None, DurationUnit::Hours) => {
                let minutes = value * 60.0;
                (whole(minutes).unwrap_or_else(|| minutes.ceil()), DurationUnit::Minutes)
            }
            (None, unit) => (value.ceil(), unit),
        };
        if amount > f64::from(u32::MAX) {
            return Err(format!("duration too large: {value} {}", unit.as_str()));
        }
        Ok(Self::new(amount as u32, unit))
    }

    pub fn new(value: u32, unit: DurationUnit) -> Self {
        Self { value, unit }
    }

    pub fn days(value: u32) -> Self {
        Self::new(value, DurationUnit::Days)
    }

    pub fn hours(value: u32) -> Self {
        Self::new(value, DurationUnit::Hours)
    }

    /// Itinerary keys the duration declares: one per day for multi-day plans,
    /// a single `day1` otherwise.
    pub fn day_keys(&self) -> Vec<String> {
        let count = match self.unit {
            DurationUnit::Days => self.value,
            DurationUnit::Hours | DurationUnit::Minutes => 1,
        };
        (1..=count).map(|day| format!("day{day}")).collect()
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.as_str())
    }
}
