#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use waymark_core::{
    FieldChange, InMemoryGateway, SqliteGateway, SqliteGatewayBuilder, StepId, WizardSession,
    WizardSessionBuilder,
};

/// A fresh session over an in-memory gateway owned by "alice".
pub fn memory_session() -> (InMemoryGateway, WizardSession) {
    let gateway = InMemoryGateway::new("alice");
    let session = WizardSessionBuilder::new(Arc::new(gateway.clone())).start();
    (gateway, session)
}

/// Helper function to create a SQLite gateway in a temporary directory
pub async fn create_test_gateway(owner: &str) -> (TempDir, SqliteGateway) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let gateway = SqliteGatewayBuilder::new()
        .with_database_path(Some(&db_path))
        .with_owner(owner)
        .build()
        .await
        .expect("Failed to create gateway");
    (temp_dir, gateway)
}

pub fn basics() -> Value {
    json!({"title": "City Walk", "city": "Jaipur", "state": "Rajasthan"})
}

/// A complete, valid field group for every step.
pub fn complete_patches() -> Vec<(StepId, Value)> {
    vec![
        (StepId::Basics, basics()),
        (
            StepId::Itinerary,
            json!({
                "duration": {"value": 2, "unit": "days"},
                "days": {
                    "day1": [{"title": "Hawa Mahal", "location": "Badi Choupad"}],
                    "day2": [{"title": "Amber Fort"}]
                }
            }),
        ),
        (
            StepId::Pricing,
            json!({"currency": "INR", "base_price": 1500.0, "min_participants": 1, "max_participants": 10}),
        ),
        (
            StepId::Schedule,
            json!({"start_date": "2030-03-01", "end_date": "2030-03-02", "time_slots": ["09:00:00"]}),
        ),
        (StepId::Extras, json!({"highlights": ["Sunset at Nahargarh"]})),
        (
            StepId::Logistics,
            json!({"meeting_point": "Jaipur Junction", "languages": ["English", "Hindi"]}),
        ),
        (
            StepId::Policies,
            json!({"cancellation_policy": "Full refund up to 48 hours before", "terms_accepted": true}),
        ),
    ]
}

pub fn complete_patch(step: StepId) -> Value {
    complete_patches()
        .into_iter()
        .find(|(candidate, _)| *candidate == step)
        .map(|(_, patch)| patch)
        .expect("every step has a patch")
}

pub fn edit(session: &WizardSession, step: StepId, value: Value) {
    session
        .on_change(FieldChange::from_json(step, value))
        .expect("patch fields belong to the step");
}

/// Fills and walks every step with `next`, finishing on the last one.
pub async fn complete_all_steps(session: &WizardSession) {
    for (step, patch) in complete_patches() {
        assert_eq!(session.cursor(), step);
        edit(session, step, patch);
        if step == StepId::LAST {
            session.finish().await.expect("finish should succeed");
        } else {
            session.next().await.expect("next should succeed");
        }
    }
}
