//! Server-side rules shared by every gateway implementation.

use jiff::civil::Date;
use serde_json::{Map, Value};

use crate::{
    draft::DraftStore,
    error::{GatewayError, GatewayResult},
    models::{BasicDetails, PlanId, PlanStatus, StepId, StepSlice},
    validate,
};

/// Status-changing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Publish,
    Pause,
    Archive,
    Unarchive,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Publish => "publish",
            Transition::Pause => "pause",
            Transition::Archive => "archive",
            Transition::Unarchive => "unarchive",
        }
    }
}

/// Status after applying `transition` to a plan currently in `from`.
pub fn transition(id: PlanId, from: PlanStatus, transition: Transition) -> GatewayResult<PlanStatus> {
    use PlanStatus::*;

    match (transition, from) {
        (Transition::Publish, Draft | Paused | Published) => Ok(Published),
        (Transition::Publish, Archived) => Err(GatewayError::precondition(format!(
            "plan {id} is archived; unarchive it before publishing"
        ))),
        (Transition::Pause, Published) => Ok(Paused),
        (Transition::Pause, Draft | Paused | Archived) => Err(GatewayError::precondition(format!(
            "plan {id} is {from}; only published plans can be paused"
        ))),
        (Transition::Archive, _) => Ok(Archived),
        (Transition::Unarchive, Archived) => Ok(Draft),
        (Transition::Unarchive, _) => {
            Err(GatewayError::conflict(format!("plan {id} is not archived")))
        }
    }
}

/// Archived plans are read-only.
pub fn check_editable(id: PlanId, status: PlanStatus) -> GatewayResult<()> {
    if status == PlanStatus::Archived {
        return Err(GatewayError::conflict(format!(
            "plan {id} is archived and cannot be edited"
        )));
    }
    Ok(())
}

/// Step 1 must stay complete: it is what a plan is created from.
pub fn check_basics(basics: &BasicDetails) -> GatewayResult<()> {
    match validate::slice_issues(&StepSlice::Basics(basics.clone()))
        .into_iter()
        .next()
    {
        Some(issue) => Err(GatewayError::validation(issue.field.clone()).with_reason(issue.to_string())),
        None => Ok(()),
    }
}

/// Shape checks for an incoming step update. Later steps may be saved as
/// partial drafts.
pub fn check_update(slice: &StepSlice) -> GatewayResult<()> {
    match slice {
        StepSlice::Basics(basics) => check_basics(basics),
        _ => Ok(()),
    }
}

/// Whether two drafts describe the same plan.
pub fn is_duplicate(existing: &BasicDetails, incoming: &BasicDetails) -> bool {
    fn same(a: &Option<String>, b: &Option<String>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
            _ => false,
        }
    }
    same(&existing.title, &incoming.title) && same(&existing.city, &incoming.city)
}

/// The server's own completeness check before publishing.
pub fn check_publishable(document: &Value) -> GatewayResult<()> {
    let draft = DraftStore::from_remote(document)
        .map_err(|e| GatewayError::precondition(format!("stored document is malformed: {e}")))?;
    let incomplete: Vec<StepId> = StepId::ALL
        .into_iter()
        .filter(|step| !validate::is_valid(*step, draft.get()))
        .collect();
    if incomplete.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::precondition(format!(
            "not all steps complete: {}",
            StepId::join(&incomplete)
        )))
    }
}

/// A pause must end in the future.
pub fn check_resume_date(resume_at: Date, today: Date) -> GatewayResult<()> {
    if resume_at <= today {
        return Err(GatewayError::validation("resume_at").with_reason("must be after today"));
    }
    Ok(())
}

/// Assembles stored step groups into one document object.
pub fn document_value<I>(sections: I) -> Value
where
    I: IntoIterator<Item = (StepId, Value)>,
{
    let object: Map<String, Value> = sections
        .into_iter()
        .map(|(step, body)| (step.as_str().to_string(), body))
        .collect();
    Value::Object(object)
}

/// Today's date in the system time zone.
pub fn today() -> Date {
    jiff::Zoned::now().date()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const ID: PlanId = PlanId(9);

    #[test]
    fn test_publish_transitions() {
        assert_eq!(
            transition(ID, PlanStatus::Draft, Transition::Publish).unwrap(),
            PlanStatus::Published
        );
        assert_eq!(
            transition(ID, PlanStatus::Paused, Transition::Publish).unwrap(),
            PlanStatus::Published
        );
        assert!(matches!(
            transition(ID, PlanStatus::Archived, Transition::Publish),
            Err(GatewayError::Precondition { .. })
        ));
    }

    #[test]
    fn test_pause_requires_published() {
        assert!(transition(ID, PlanStatus::Draft, Transition::Pause).is_err());
        assert_eq!(
            transition(ID, PlanStatus::Published, Transition::Pause).unwrap(),
            PlanStatus::Paused
        );
        assert!(matches!(
            transition(ID, PlanStatus::Paused, Transition::Pause),
            Err(GatewayError::Precondition { .. })
        ));
    }

    #[test]
    fn test_archive_round_trip() {
        let archived = transition(ID, PlanStatus::Published, Transition::Archive).unwrap();
        assert_eq!(archived, PlanStatus::Archived);
        assert_eq!(
            transition(ID, archived, Transition::Unarchive).unwrap(),
            PlanStatus::Draft
        );
        assert!(matches!(
            transition(ID, PlanStatus::Draft, Transition::Unarchive),
            Err(GatewayError::Conflict { .. })
        ));
    }

    #[test]
    fn test_check_basics_reports_first_missing_field() {
        let basics = BasicDetails {
            title: Some("Walk".to_string()),
            ..Default::default()
        };
        let err = check_basics(&basics).unwrap_err();
        assert!(matches!(err, GatewayError::Validation { ref field, .. } if field == "city"));
    }

    #[test]
    fn test_duplicate_detection_ignores_case() {
        let a = BasicDetails {
            title: Some("City Walk".to_string()),
            city: Some("Jaipur".to_string()),
            ..Default::default()
        };
        let mut b = a.clone();
        b.title = Some("city walk ".to_string());
        assert!(is_duplicate(&a, &b));
        b.city = Some("Udaipur".to_string());
        assert!(!is_duplicate(&a, &b));
    }

    #[test]
    fn test_check_publishable_lists_incomplete_steps() {
        let err = check_publishable(&json!({
            "basics": {"title": "Walk", "city": "Jaipur", "state": "Rajasthan"}
        }))
        .unwrap_err();
        let GatewayError::Precondition { message } = err else {
            panic!("expected precondition failure");
        };
        assert!(message.contains("2 (Itinerary)"));
        assert!(!message.contains("1 (Basic details)"));
        assert!(!message.contains("5 (Extras)"));
    }

    #[test]
    fn test_resume_date_must_be_future() {
        let today = jiff::civil::date(2025, 1, 10);
        assert!(check_resume_date(jiff::civil::date(2025, 1, 10), today).is_err());
        assert!(check_resume_date(jiff::civil::date(2025, 1, 11), today).is_ok());
    }

    #[test]
    fn test_document_value_keys() {
        let value = document_value([(StepId::Pricing, json!({"currency": "INR"}))]);
        assert_eq!(value, json!({"pricing": {"currency": "INR"}}));
    }
}
