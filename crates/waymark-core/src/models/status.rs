//! Status enumerations and identifiers for plans and steps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Server-assigned plan identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub u64);

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlanId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(PlanId)
            .map_err(|_| format!("Invalid plan id: {s}"))
    }
}

/// Type-safe enumeration of plan statuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Being authored, not visible to customers
    #[default]
    Draft,

    /// Live
    Published,

    /// Temporarily off sale until a resume date
    Paused,

    /// Hidden and read-only
    Archived,
}

impl FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(PlanStatus::Draft),
            "published" => Ok(PlanStatus::Published),
            "paused" => Ok(PlanStatus::Paused),
            "archived" => Ok(PlanStatus::Archived),
            _ => Err(format!("Invalid plan status: {s}")),
        }
    }
}

impl PlanStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Draft => "draft",
            PlanStatus::Published => "published",
            PlanStatus::Paused => "paused",
            PlanStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The seven authoring steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepId {
    Basics,
    Itinerary,
    Pricing,
    Schedule,
    Extras,
    Logistics,
    Policies,
}

impl StepId {
    /// All steps in wizard order.
    pub const ALL: [StepId; 7] = [
        StepId::Basics,
        StepId::Itinerary,
        StepId::Pricing,
        StepId::Schedule,
        StepId::Extras,
        StepId::Logistics,
        StepId::Policies,
    ];

    /// The step that creates the plan.
    pub const FIRST: StepId = StepId::Basics;

    /// The step that finishes the wizard.
    pub const LAST: StepId = StepId::Policies;

    /// 1-based position in the wizard.
    pub fn ordinal(self) -> u8 {
        match self {
            StepId::Basics => 1,
            StepId::Itinerary => 2,
            StepId::Pricing => 3,
            StepId::Schedule => 4,
            StepId::Extras => 5,
            StepId::Logistics => 6,
            StepId::Policies => 7,
        }
    }

    /// Looks a step up by its 1-based ordinal.
    pub fn from_ordinal(ordinal: u8) -> Option<StepId> {
        Self::ALL.get(usize::from(ordinal).checked_sub(1)?).copied()
    }

    /// Stable key used in documents and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            StepId::Basics => "basics",
            StepId::Itinerary => "itinerary",
            StepId::Pricing => "pricing",
            StepId::Schedule => "schedule",
            StepId::Extras => "extras",
            StepId::Logistics => "logistics",
            StepId::Policies => "policies",
        }
    }

    pub fn next(self) -> Option<StepId> {
        Self::from_ordinal(self.ordinal() + 1)
    }

    pub fn previous(self) -> Option<StepId> {
        Self::from_ordinal(self.ordinal() - 1)
    }

    /// Comma-separated list for messages.
    pub fn join(steps: &[StepId]) -> String {
        steps
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for StepId {
    type Err = String;

    /// Accepts the step key (`pricing`) or its ordinal (`3`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        if let Ok(ordinal) = key.parse::<u8>() {
            return StepId::from_ordinal(ordinal).ok_or_else(|| format!("Invalid step: {s}"));
        }
        StepId::ALL
            .into_iter()
            .find(|step| step.as_str() == key)
            .ok_or_else(|| format!("Invalid step: {s}"))
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.ordinal(), crate::schema::definition(*self).label)
    }
}
