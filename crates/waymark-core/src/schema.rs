//! Step schema registry: the ordered steps and the fields each one owns.
//!
//! Ownership partitions [`PlanDocument`]'s fields: every field belongs to
//! exactly one step, and a step only ever reads or writes its own group.

use crate::models::{PlanDocument, StepId, StepSlice};

/// One field of a step group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
}

const fn required(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        required: true,
    }
}

const fn optional(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        required: false,
    }
}

/// Static descriptor of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefinition {
    pub step: StepId,
    pub label: &'static str,
    pub fields: &'static [FieldSpec],
}

impl StepDefinition {
    pub fn ordinal(&self) -> u8 {
        self.step.ordinal()
    }

    /// Whether `name` is one of this step's fields.
    pub fn owns(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|field| field.required)
    }
}

static STEPS: [StepDefinition; 7] = [
    StepDefinition {
        step: StepId::Basics,
        label: "Basic details",
        fields: &[
            required("title", "Title"),
            required("city", "City"),
            required("state", "State"),
            optional("country", "Country"),
            optional("category", "Category"),
            optional("summary", "Summary"),
            optional("cover_image_url", "Cover image"),
        ],
    },
    StepDefinition {
        step: StepId::Itinerary,
        label: "Itinerary",
        fields: &[required("duration", "Duration"), required("days", "Day plan")],
    },
    StepDefinition {
        step: StepId::Pricing,
        label: "Pricing",
        fields: &[
            required("currency", "Currency"),
            required("base_price", "Base price"),
            optional("min_participants", "Minimum participants"),
            optional("max_participants", "Maximum participants"),
            optional("group_discount_percent", "Group discount (%)"),
        ],
    },
    StepDefinition {
        step: StepId::Schedule,
        label: "Schedule",
        fields: &[
            required("start_date", "Start date"),
            optional("end_date", "End date"),
            required("time_slots", "Time slots"),
        ],
    },
    StepDefinition {
        step: StepId::Extras,
        label: "Extras",
        fields: &[
            optional("highlights", "Highlights"),
            optional("inclusions", "Inclusions"),
            optional("exclusions", "Exclusions"),
            optional("gallery_urls", "Gallery"),
        ],
    },
    StepDefinition {
        step: StepId::Logistics,
        label: "Logistics",
        fields: &[
            required("meeting_point", "Meeting point"),
            required("languages", "Languages"),
            optional("pickup_available", "Pickup available"),
            optional("accessibility_notes", "Accessibility notes"),
        ],
    },
    StepDefinition {
        step: StepId::Policies,
        label: "Policies",
        fields: &[
            required("cancellation_policy", "Cancellation policy"),
            optional("refund_window_hours", "Refund window (hours)"),
            optional("min_age", "Minimum age"),
            required("terms_accepted", "Terms accepted"),
        ],
    },
];

/// All step definitions in wizard order.
pub fn steps() -> &'static [StepDefinition] {
    &STEPS
}

/// Definition for `step`.
pub fn definition(step: StepId) -> &'static StepDefinition {
    &STEPS[usize::from(step.ordinal() - 1)]
}

/// Extracts the slice `step` owns from the whole document.
pub fn extract(step: StepId, document: &PlanDocument) -> StepSlice {
    document.slice(step)
}
