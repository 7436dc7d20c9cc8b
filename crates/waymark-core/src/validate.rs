//! Step validation.
//!
//! Pure and cheap: callers run it on every change to gate navigation. A step
//! is checked in two passes. The first is declarative, driven by the
//! `required` flags in [`crate::schema`]; a value is missing when it is
//! `null`, a blank string, an empty list or an empty map, or `false` for a
//! required flag. The second pass applies the step's shape rules (day-keyed
//! itinerary coverage, numeric bounds, date ordering).

use std::fmt;

use serde_json::Value;

use crate::models::{
    DurationUnit, Itinerary, PlanDocument, Policies, Pricing, Schedule, StepId, StepSlice,
};
use crate::schema;

const MAX_DURATION_DAYS: u32 = 30;
const MAX_DURATION_HOURS: u32 = 24;
const MAX_DURATION_MINUTES: u32 = 24 * 60;
const MAX_TITLE_CHARS: usize = 120;
const MAX_MIN_AGE: u32 = 99;

/// What is wrong with one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Required and not filled in
    Missing,
    /// A declared itinerary day has no populated stop
    EmptyDay { day: String },
    /// Filled in but outside its allowed range or format
    Invalid { reason: String },
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub kind: IssueKind,
}

impl FieldIssue {
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: IssueKind::Missing,
        }
    }

    pub fn empty_day(day: impl Into<String>) -> Self {
        Self {
            field: "days".to_string(),
            kind: IssueKind::EmptyDay { day: day.into() },
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: IssueKind::Invalid {
                reason: reason.into(),
            },
        }
    }

    /// `; `-separated list for messages.
    pub fn join(issues: &[FieldIssue]) -> String {
        issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::Missing => write!(f, "{} is required", self.field),
            IssueKind::EmptyDay { day } => write!(f, "{day} needs at least one stop"),
            IssueKind::Invalid { reason } => write!(f, "{} {reason}", self.field),
        }
    }
}

/// Whether `step`'s group in `document` is complete.
pub fn is_valid(step: StepId, document: &PlanDocument) -> bool {
    issues(step, document).is_empty()
}

/// Every problem with `step`'s group in `document`, in schema order.
pub fn issues(step: StepId, document: &PlanDocument) -> Vec<FieldIssue> {
    slice_issues(&document.slice(step))
}

/// Same checks against a detached slice.
pub fn slice_issues(slice: &StepSlice) -> Vec<FieldIssue> {
    let mut found = required_issues(slice);
    match slice {
        StepSlice::Basics(basics) => {
            if let Some(title) = &basics.title {
                if title.chars().count() > MAX_TITLE_CHARS {
                    found.push(FieldIssue::invalid(
                        "title",
                        format!("must be at most {MAX_TITLE_CHARS} characters"),
                    ));
                }
            }
        }
        StepSlice::Itinerary(itinerary) => itinerary_issues(itinerary, &mut found),
        StepSlice::Pricing(pricing) => pricing_issues(pricing, &mut found),
        StepSlice::Schedule(schedule) => schedule_issues(schedule, &mut found),
        StepSlice::Policies(policies) => policy_issues(policies, &mut found),
        StepSlice::Extras(_) | StepSlice::Logistics(_) => {}
    }
    found
}

fn required_issues(slice: &StepSlice) -> Vec<FieldIssue> {
    let definition = schema::definition(slice.step());
    let Ok(fields) = slice.to_fields() else {
        return definition
            .required_fields()
            .map(|field| FieldIssue::missing(field.name))
            .collect();
    };
    definition
        .required_fields()
        .filter(|field| fields.get(field.name).map_or(true, is_blank))
        .map(|field| FieldIssue::missing(field.name))
        .collect()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
        Value::Number(_) => false,
    }
}

fn itinerary_issues(itinerary: &Itinerary, found: &mut Vec<FieldIssue>) {
    let Some(duration) = itinerary.duration else {
        return;
    };
    let limit = match duration.unit {
        DurationUnit::Days => MAX_DURATION_DAYS,
        DurationUnit::Hours => MAX_DURATION_HOURS,
        DurationUnit::Minutes => MAX_DURATION_MINUTES,
    };
    if duration.value == 0 || duration.value > limit {
        found.push(FieldIssue::invalid(
            "duration",
            format!("must be between 1 and {limit} {}", duration.unit.as_str()),
        ));
        return;
    }
    // An empty map is already reported as missing.
    if itinerary.days.is_empty() {
        return;
    }
    for day in duration.day_keys() {
        let populated = itinerary
            .days
            .get(&day)
            .is_some_and(|stops| stops.iter().any(|stop| stop.is_populated()));
        if !populated {
            found.push(FieldIssue::empty_day(day));
        }
    }
}

fn pricing_issues(pricing: &Pricing, found: &mut Vec<FieldIssue>) {
    if let Some(currency) = &pricing.currency {
        let trimmed = currency.trim();
        if !trimmed.is_empty()
            && !(trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_uppercase()))
        {
            found.push(FieldIssue::invalid(
                "currency",
                "must be a three-letter ISO code",
            ));
        }
    }
    if let Some(price) = pricing.base_price {
        if !price.is_finite() || price < 0.0 {
            found.push(FieldIssue::invalid("base_price", "must not be negative"));
        }
    }
    if pricing.min_participants == Some(0) {
        found.push(FieldIssue::invalid("min_participants", "must be at least 1"));
    }
    if pricing.max_participants == Some(0) {
        found.push(FieldIssue::invalid("max_participants", "must be at least 1"));
    }
    if let (Some(min), Some(max)) = (pricing.min_participants, pricing.max_participants) {
        if max < min {
            found.push(FieldIssue::invalid(
                "max_participants",
                "must not be below the minimum",
            ));
        }
    }
    if let Some(discount) = pricing.group_discount_percent {
        if !(0.0..=100.0).contains(&discount) {
            found.push(FieldIssue::invalid(
                "group_discount_percent",
                "must be between 0 and 100",
            ));
        }
    }
}

fn schedule_issues(schedule: &Schedule, found: &mut Vec<FieldIssue>) {
    if let (Some(start), Some(end)) = (schedule.start_date, schedule.end_date) {
        if end < start {
            found.push(FieldIssue::invalid("end_date", "must not be before the start date"));
        }
    }
}

fn policy_issues(policies: &Policies, found: &mut Vec<FieldIssue>) {
    if let Some(age) = policies.min_age {
        if age > MAX_MIN_AGE {
            found.push(FieldIssue::invalid(
                "min_age",
                format!("must be at most {MAX_MIN_AGE}"),
            ));
        }
    }
}
