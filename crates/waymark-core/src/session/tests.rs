use std::sync::Arc;

use serde_json::{json, Value};

use super::*;
use crate::{
    display::MarkdownRenderer,
    draft::FieldChange,
    error::GatewayError,
    gateway::{GatewayCall, InMemoryGateway, Operation},
    sync::SyncOutcome,
};

fn session() -> (InMemoryGateway, WizardSession) {
    let gateway = InMemoryGateway::new("alice");
    let session = WizardSessionBuilder::new(Arc::new(gateway.clone())).start();
    (gateway, session)
}

fn edit(session: &WizardSession, step: StepId, value: Value) {
    session.on_change(FieldChange::from_json(step, value)).unwrap();
}

fn fill_basics(session: &WizardSession) {
    edit(
        session,
        StepId::Basics,
        json!({"title": "City Walk", "city": "Jaipur", "state": "Rajasthan"}),
    );
}

#[test]
fn test_foreign_field_is_rejected_synchronously() {
    let (_gateway, session) = session();
    let err = session
        .on_change(FieldChange::from_json(StepId::Basics, json!({"currency": "INR"})))
        .unwrap_err();
    assert!(matches!(err, WizardError::ForeignField { .. }));
    session.flush().unwrap();
    assert_eq!(session.document(), PlanDocument::default());
}

#[test]
fn test_flush_applies_in_order_and_skips_malformed() {
    let (_gateway, session) = session();
    edit(&session, StepId::Basics, json!({"title": "First"}));
    edit(&session, StepId::Pricing, json!({"min_participants": "many"}));
    edit(&session, StepId::Basics, json!({"title": "Second"}));

    assert!(session.document().basics.title.is_none());
    let err = session.flush().unwrap_err();
    assert!(matches!(err, WizardError::MalformedPatch { step: StepId::Pricing, .. }));

    let document = session.document();
    assert_eq!(document.basics.title.as_deref(), Some("Second"));
    assert_eq!(document.pricing, crate::models::Pricing::default());
}

#[test]
fn test_hydration_changes_are_not_dirty() {
    let (_gateway, session) = session();
    let change = FieldChange::hydration(
        StepId::Extras,
        match json!({"highlights": ["Stepwell"]}) {
            Value::Object(fields) => fields,
            _ => unreachable!(),
        },
    );
    session.on_change(change).unwrap();
    session.flush().unwrap();
    assert!(!session.has_changed(StepId::Extras));

    edit(&session, StepId::Extras, json!({"highlights": ["Stepwell", "Fort"]}));
    session.flush().unwrap();
    assert!(session.has_changed(StepId::Extras));
}

#[tokio::test]
async fn test_next_blocked_on_first_step_lists_missing_fields() {
    let (gateway, session) = session();
    edit(&session, StepId::Basics, json!({"title": "City Walk"}));

    let err = session.next().await.unwrap_err();
    let WizardError::StepInvalid { step, issues } = err else {
        panic!("expected StepInvalid");
    };
    assert_eq!(step, StepId::Basics);
    let fields: Vec<&str> = issues.iter().map(|issue| issue.field.as_str()).collect();
    assert_eq!(fields, vec!["city", "state"]);
    assert_eq!(session.cursor(), StepId::Basics);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_failed_create_keeps_cursor_and_edits() {
    let (gateway, session) = session();
    fill_basics(&session);
    gateway.fail_next(Operation::Create, GatewayError::network("503"));

    let err = session.next().await.unwrap_err();
    assert!(matches!(err, WizardError::Remote(GatewayError::Network { .. })));
    assert_eq!(session.cursor(), StepId::Basics);
    assert_eq!(session.identity(), None);
    assert_eq!(session.document().basics.city.as_deref(), Some("Jaipur"));

    // Retrying is an explicit user action.
    let outcome = session.next().await.unwrap();
    assert!(matches!(outcome.sync, SyncOutcome::Created(_)));
}

#[tokio::test]
async fn test_next_and_previous_at_the_ends() {
    let (_gateway, session) = session();
    let err = session.previous().await.unwrap_err();
    assert!(matches!(err, WizardError::NoPreviousStep { step: StepId::Basics }));

    session.go_to(StepId::Policies);
    let err = session.next().await.unwrap_err();
    assert!(matches!(err, WizardError::NoNextStep { step: StepId::Policies }));
}

#[tokio::test]
async fn test_previous_moves_back_even_when_save_fails() {
    let (gateway, session) = session();
    fill_basics(&session);
    session.next().await.unwrap();

    edit(&session, StepId::Itinerary, json!({"duration": {"value": 2, "unit": "hours"}}));
    gateway.fail_next(Operation::UpdateStep, GatewayError::network("timeout"));

    let outcome = session.previous().await.unwrap();
    assert_eq!(outcome.cursor, StepId::Basics);
    assert!(outcome.sync.is_none());
    assert!(matches!(outcome.warning, Some(WizardError::Remote(_))));
    assert!(session.has_changed(StepId::Itinerary));
    assert_eq!(session.cursor(), StepId::Basics);
}

#[tokio::test]
async fn test_save_draft_keeps_partial_step() {
    let (gateway, session) = session();
    fill_basics(&session);
    session.next().await.unwrap();

    edit(&session, StepId::Itinerary, json!({"duration": {"value": 2, "unit": "days"}}));
    let outcome = session.save_draft().await.unwrap();
    assert_eq!(outcome.saved, StepId::Itinerary);
    assert_eq!(outcome.cursor, StepId::Itinerary);
    assert!(outcome.sync.was_sent());
    assert!(!session.is_completed(StepId::Itinerary));
    assert!(!session.has_changed(StepId::Itinerary));

    let id = session.identity().unwrap();
    let stored = gateway.stored_document(id).unwrap();
    assert_eq!(stored["itinerary"]["duration"]["unit"], json!("days"));
}

#[tokio::test]
async fn test_repeated_action_is_rejected_while_in_flight() {
    let (gateway, session) = session();
    fill_basics(&session);
    let release = gateway.hold_next_create();

    let (first, second, ()) = tokio::join!(session.next(), session.next(), async {
        tokio::task::yield_now().await;
        release.notify_one();
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(WizardError::ActionInProgress { ref action }) if action == "next"));
    assert_eq!(gateway.count_calls(|call| *call == GatewayCall::Create), 1);
    assert_eq!(session.cursor(), StepId::Itinerary);
}

#[tokio::test]
async fn test_render_current_step() {
    let (_gateway, session) = session();
    edit(&session, StepId::Basics, json!({"title": "City Walk"}));
    session.flush().unwrap();

    let text = session.render(&MarkdownRenderer, StepId::Basics);
    assert!(text.contains("`title`: City Walk"));
    assert!(text.contains("- city is required"));
}
