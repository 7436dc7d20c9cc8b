//! Field renderers turn a step's slice into something a provider can edit.
//!
//! The session never depends on a concrete renderer. A front end implements
//! [`FieldRenderer`] for its own view type and reports edits back as
//! [`crate::draft::FieldChange`]s.

use serde_json::Value;

use crate::{models::StepSlice, schema::StepDefinition, validate::FieldIssue};

/// Produces a view of one step.
pub trait FieldRenderer {
    type View;

    fn render(
        &self,
        definition: &StepDefinition,
        slice: &StepSlice,
        issues: &[FieldIssue],
    ) -> Self::View;
}

/// Markdown listing of a step's fields, current values and problems.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    fn format_value(value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) => "_empty_".to_string(),
            Some(Value::String(text)) if text.trim().is_empty() => "_empty_".to_string(),
            Some(Value::String(text)) => text.clone(),
            Some(Value::Array(items)) if items.is_empty() => "_empty_".to_string(),
            Some(Value::Array(items)) if items.iter().all(Value::is_string) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            Some(Value::Object(entries)) if entries.is_empty() => "_empty_".to_string(),
            Some(other) => format!("`{other}`"),
        }
    }
}

impl FieldRenderer for MarkdownRenderer {
    type View = String;

    fn render(
        &self,
        definition: &StepDefinition,
        slice: &StepSlice,
        issues: &[FieldIssue],
    ) -> String {
        let fields = slice.to_fields().unwrap_or_default();
        let mut out = format!("## Step {}\n\n", slice.step());

        for field in definition.fields {
            let marker = if field.required { " (required)" } else { "" };
            out.push_str(&format!(
                "- **{}**{marker} `{}`: {}\n",
                field.label,
                field.name,
                Self::format_value(fields.get(field.name))
            ));
        }

        if issues.is_empty() {
            out.push_str("\nThis step is complete.\n");
        } else {
            out.push_str("\n### Issues\n\n");
            for issue in issues {
                out.push_str(&format!("- {issue}\n"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Pricing, StepId},
        schema, validate,
    };

    #[test]
    fn test_renders_values_and_issues() {
        let slice = StepSlice::Pricing(Pricing {
            currency: Some("INR".to_string()),
            ..Default::default()
        });
        let issues = validate::slice_issues(&slice);
        let text = MarkdownRenderer.render(schema::definition(StepId::Pricing), &slice, &issues);

        assert!(text.starts_with("## Step 3 (Pricing)"));
        assert!(text.contains("(required) `currency`: INR"));
        assert!(text.contains("`base_price`: _empty_"));
        assert!(text.contains("### Issues"));
        assert!(text.contains("- base_price is required"));
    }

    #[test]
    fn test_complete_step() {
        let slice = StepSlice::empty(StepId::Extras);
        let text = MarkdownRenderer.render(schema::definition(StepId::Extras), &slice, &[]);
        assert!(text.contains("This step is complete."));
        assert!(text.contains("`highlights`: _empty_"));
    }
}
