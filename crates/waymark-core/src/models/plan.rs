//! The whole plan document and the slice each step owns.

use std::collections::BTreeMap;

use jiff::civil::{Date, Time};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Duration, StepId};

/// Step 1: what the plan is and where it happens.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BasicDetails {
    pub title: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
    /// Opaque URL produced by the image store
    pub cover_image_url: Option<String>,
}

/// One stop within an itinerary day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ItineraryStop {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl ItineraryStop {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// A stop counts once it has a non-blank title.
    pub fn is_populated(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// Step 2: duration plus the day-keyed stop lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Itinerary {
    pub duration: Option<Duration>,
    pub days: BTreeMap<String, Vec<ItineraryStop>>,
}

/// Step 3: what it costs and for how many people.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "PricingShape")]
pub struct Pricing {
    pub currency: Option<String>,
    pub base_price: Option<f64>,
    pub min_participants: Option<u32>,
    pub max_participants: Option<u32>,
    pub group_discount_percent: Option<f64>,
}

/// Pricing as it may arrive from storage.
#[derive(Deserialize, Default)]
#[serde(default)]
struct PricingShape {
    currency: Option<String>,
    base_price: Option<f64>,
    min_participants: Option<u32>,
    max_participants: Option<u32>,
    group_discount_percent: Option<f64>,
    /// Older plans nested amount and currency under `price`
    price: Option<LegacyPrice>,
}

#[derive(Deserialize)]
struct LegacyPrice {
    amount: f64,
    #[serde(default)]
    currency: Option<String>,
}

impl From<PricingShape> for Pricing {
    fn from(shape: PricingShape) -> Self {
        let (legacy_amount, legacy_currency) = match shape.price {
            Some(LegacyPrice { amount, currency }) => (Some(amount), currency),
            None => (None, None),
        };
        Pricing {
            currency: shape.currency.or(legacy_currency),
            base_price: shape.base_price.or(legacy_amount),
            min_participants: shape.min_participants,
            max_participants: shape.max_participants,
            group_discount_percent: shape.group_discount_percent,
        }
    }
}

/// Step 4: when it runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Schedule {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub time_slots: Vec<Time>,
}

/// Step 5: optional extras.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Extras {
    pub highlights: Vec<String>,
    pub inclusions: Vec<String>,
    pub exclusions: Vec<String>,
    /// Opaque URLs produced by the image store
    pub gallery_urls: Vec<String>,
}

/// Step 6: meeting point and on-the-day details.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Logistics {
    pub meeting_point: Option<String>,
    pub languages: Vec<String>,
    pub pickup_available: bool,
    pub accessibility_notes: Option<String>,
}

/// Step 7: cancellation and participation rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Policies {
    pub cancellation_policy: Option<String>,
    pub refund_window_hours: Option<u32>,
    pub min_age: Option<u32>,
    pub terms_accepted: bool,
}

/// The whole document under construction, one group per step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanDocument {
    pub basics: BasicDetails,
    pub itinerary: Itinerary,
    pub pricing: Pricing,
    pub schedule: Schedule,
    pub extras: Extras,
    pub logistics: Logistics,
    pub policies: Policies,
}

impl PlanDocument {
    /// Copies out the group owned by `step`.
    pub fn slice(&self, step: StepId) -> StepSlice {
        match step {
            StepId::Basics => StepSlice::Basics(self.basics.clone()),
            StepId::Itinerary => StepSlice::Itinerary(self.itinerary.clone()),
            StepId::Pricing => StepSlice::Pricing(self.pricing.clone()),
            StepId::Schedule => StepSlice::Schedule(self.schedule.clone()),
            StepId::Extras => StepSlice::Extras(self.extras.clone()),
            StepId::Logistics => StepSlice::Logistics(self.logistics.clone()),
            StepId::Policies => StepSlice::Policies(self.policies.clone()),
        }
    }

    /// Replaces exactly one group; the others are untouched.
    pub fn replace(&mut self, slice: StepSlice) {
        match slice {
            StepSlice::Basics(basics) => self.basics = basics,
            StepSlice::Itinerary(itinerary) => self.itinerary = itinerary,
            StepSlice::Pricing(pricing) => self.pricing = pricing,
            StepSlice::Schedule(schedule) => self.schedule = schedule,
            StepSlice::Extras(extras) => self.extras = extras,
            StepSlice::Logistics(logistics) => self.logistics = logistics,
            StepSlice::Policies(policies) => self.policies = policies,
        }
    }
}

/// The fields one step owns, tagged by step.
///
/// Serializes as the bare group object; the tag travels out of band (as the
/// storage key or the gateway call's step).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepSlice {
    Basics(BasicDetails),
    Itinerary(Itinerary),
    Pricing(Pricing),
    Schedule(Schedule),
    Extras(Extras),
    Logistics(Logistics),
    Policies(Policies),
}

impl StepSlice {
    pub fn step(&self) -> StepId {
        match self {
            StepSlice::Basics(_) => StepId::Basics,
            StepSlice::Itinerary(_) => StepId::Itinerary,
            StepSlice::Pricing(_) => StepId::Pricing,
            StepSlice::Schedule(_) => StepId::Schedule,
            StepSlice::Extras(_) => StepId::Extras,
            StepSlice::Logistics(_) => StepId::Logistics,
            StepSlice::Policies(_) => StepId::Policies,
        }
    }

    /// An empty group for `step`.
    pub fn empty(step: StepId) -> StepSlice {
        PlanDocument::default().slice(step)
    }

    /// The group as a flat field map (absent values are `null`).
    pub fn to_fields(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            _ => Err(serde::ser::Error::custom("step slice is not an object")),
        }
    }

    /// Parses a group for `step`, normalizing legacy shapes.
    pub fn from_value(step: StepId, value: Value) -> serde_json::Result<StepSlice> {
        Ok(match step {
            StepId::Basics => StepSlice::Basics(serde_json::from_value(value)?),
            StepId::Itinerary => StepSlice::Itinerary(serde_json::from_value(value)?),
            StepId::Pricing => StepSlice::Pricing(serde_json::from_value(value)?),
            StepId::Schedule => StepSlice::Schedule(serde_json::from_value(value)?),
            StepId::Extras => StepSlice::Extras(serde_json::from_value(value)?),
            StepId::Logistics => StepSlice::Logistics(serde_json::from_value(value)?),
            StepId::Policies => StepSlice::Policies(serde_json::from_value(value)?),
        })
    }
}
