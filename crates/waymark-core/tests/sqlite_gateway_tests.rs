mod common;

use std::{
    sync::{mpsc, Arc},
    thread,
};

use common::{basics, complete_all_steps, create_test_gateway, edit};
use serde_json::json;
use tempfile::NamedTempFile;
use waymark_core::{
    gateway::Database,
    models::{BasicDetails, Duration, StepSlice},
    session::PublishOutcome,
    GatewayError, PlanGateway, PlanId, PlanStatus, SqliteGatewayBuilder, StepId, WizardError,
    WizardSessionBuilder,
};

fn city_walk() -> BasicDetails {
    serde_json::from_value(basics()).unwrap()
}

#[test]
fn test_database_initialization() {
    let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
    let _db = Database::new(temp_file.path()).expect("Failed to create test database");
    assert!(temp_file.path().exists());
}

#[test]
fn test_old_database_gains_resume_column() {
    let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
    {
        let connection = rusqlite::Connection::open(temp_file.path()).unwrap();
        connection
            .execute_batch(
                "CREATE TABLE plans (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'draft',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );",
            )
            .unwrap();
    }

    let db = Database::new(temp_file.path()).expect("migration should succeed");
    assert!(matches!(
        db.set_status(PlanId(1), PlanStatus::Paused, None),
        Err(GatewayError::NotFound { .. })
    ));

    let connection = rusqlite::Connection::open(temp_file.path()).unwrap();
    let columns: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('plans') WHERE name = 'resume_at'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(columns, 1);
}

#[tokio::test]
async fn test_create_and_fetch() {
    let (_temp_dir, gateway) = create_test_gateway("alice").await;

    let created = gateway.create(&city_walk()).await.expect("create should succeed");
    assert_eq!(created.status, PlanStatus::Draft);

    let remote = gateway.fetch(created.id).await.expect("fetch should succeed");
    assert_eq!(remote.id, created.id);
    assert_eq!(remote.owner, "alice");
    assert_eq!(remote.document, json!({"basics": {
        "title": "City Walk",
        "city": "Jaipur",
        "state": "Rajasthan",
        "country": null,
        "category": null,
        "summary": null,
        "cover_image_url": null
    }}));
}

#[tokio::test]
async fn test_update_step_replaces_section() {
    let (_temp_dir, gateway) = create_test_gateway("alice").await;
    let id = gateway.create(&city_walk()).await.unwrap().id;

    let mut slice = StepSlice::empty(StepId::Extras);
    if let StepSlice::Extras(extras) = &mut slice {
        extras.highlights = vec!["Stepwell".to_string()];
    }
    gateway.update_step(id, &slice).await.unwrap();

    if let StepSlice::Extras(extras) = &mut slice {
        extras.highlights = vec!["Fort".to_string()];
    }
    let status = gateway.update_step(id, &slice).await.unwrap();
    assert_eq!(status, PlanStatus::Draft);

    let remote = gateway.fetch(id).await.unwrap();
    assert_eq!(remote.document["extras"]["highlights"], json!(["Fort"]));
    assert!(remote.updated_at >= remote.created_at);
}

#[tokio::test]
async fn test_step_write_waits_for_concurrent_archive() {
    let (temp_dir, gateway) = create_test_gateway("alice").await;
    let id = gateway.create(&city_walk()).await.unwrap().id;
    let db_path = temp_dir.path().join("test.db");

    let (locked_tx, locked_rx) = mpsc::channel();
    let archiver = thread::spawn(move || {
        let mut connection = rusqlite::Connection::open(db_path).unwrap();
        let tx = connection
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
            .unwrap();
        tx.execute(
            "UPDATE plans SET status = 'archived' WHERE id = ?1",
            [id.0 as i64],
        )
        .unwrap();
        locked_tx.send(()).unwrap();
        thread::sleep(std::time::Duration::from_millis(200));
        tx.commit().unwrap();
    });
    locked_rx.recv().unwrap();

    let mut slice = StepSlice::empty(StepId::Extras);
    if let StepSlice::Extras(extras) = &mut slice {
        extras.highlights = vec!["Stepwell".to_string()];
    }
    let err = gateway.update_step(id, &slice).await.unwrap_err();
    archiver.join().unwrap();

    assert!(matches!(err, GatewayError::Conflict { .. }));
    let remote = gateway.fetch(id).await.unwrap();
    assert_eq!(remote.status, PlanStatus::Archived);
    assert!(remote.document.get("extras").is_none());
}

#[tokio::test]
async fn test_duplicate_draft_conflicts() {
    let (_temp_dir, gateway) = create_test_gateway("alice").await;
    gateway.create(&city_walk()).await.unwrap();

    let err = gateway.create(&city_walk()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Conflict { .. }));
}

#[tokio::test]
async fn test_other_owner_is_forbidden() {
    let (temp_dir, alice) = create_test_gateway("alice").await;
    let id = alice.create(&city_walk()).await.unwrap().id;

    let bob = SqliteGatewayBuilder::new()
        .with_database_path(Some(temp_dir.path().join("test.db")))
        .with_owner("bob")
        .build()
        .await
        .unwrap();

    assert!(matches!(bob.fetch(id).await, Err(GatewayError::Forbidden { .. })));
    assert!(matches!(bob.publish(id).await, Err(GatewayError::Forbidden { .. })));
    assert!(matches!(
        alice.fetch(PlanId(999)).await,
        Err(GatewayError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_publish_requires_complete_document() {
    let (_temp_dir, gateway) = create_test_gateway("alice").await;
    let id = gateway.create(&city_walk()).await.unwrap().id;

    let err = gateway.publish(id).await.unwrap_err();
    assert!(matches!(err, GatewayError::Precondition { .. }));
    assert_eq!(gateway.fetch(id).await.unwrap().status, PlanStatus::Draft);
}

#[tokio::test]
async fn test_legacy_section_is_normalized_on_resume() {
    let (temp_dir, gateway) = create_test_gateway("alice").await;
    let id = gateway.create(&city_walk()).await.unwrap().id;

    let mut db = Database::new(temp_dir.path().join("test.db")).unwrap();
    db.write_raw_section(
        id,
        StepId::Itinerary,
        r#"{"duration": 3, "days": {"day1": [{"title": "Old City"}]}}"#,
    )
    .unwrap();

    let session = WizardSessionBuilder::new(Arc::new(gateway))
        .resume(id)
        .await
        .unwrap();
    assert_eq!(session.document().itinerary.duration, Some(Duration::hours(3)));
    assert!(session.is_completed(StepId::Itinerary));
}

#[tokio::test]
async fn test_full_session_publishes_and_persists() {
    let (temp_dir, gateway) = create_test_gateway("alice").await;
    let session = WizardSessionBuilder::new(Arc::new(gateway.clone())).start();

    complete_all_steps(&session).await;
    let outcome = session.publish().await.expect("publish should succeed");
    assert_eq!(outcome, PublishOutcome::Published(PlanStatus::Published));
    let id = session.identity().unwrap();

    // A new gateway over the same file sees the published plan.
    let reopened = SqliteGatewayBuilder::new()
        .with_database_path(Some(temp_dir.path().join("test.db")))
        .with_owner("alice")
        .build()
        .await
        .unwrap();
    let resumed = WizardSessionBuilder::new(Arc::new(reopened))
        .with_owner("alice")
        .resume(id)
        .await
        .unwrap();
    assert_eq!(resumed.status(), Some(PlanStatus::Published));
    assert_eq!(resumed.document(), session.document());
    assert!(StepId::ALL.into_iter().all(|step| resumed.is_completed(step)));
}

#[tokio::test]
async fn test_status_transitions_persist() {
    let (_temp_dir, gateway) = create_test_gateway("alice").await;
    let session = WizardSessionBuilder::new(Arc::new(gateway.clone())).start();
    complete_all_steps(&session).await;
    session.publish().await.unwrap();
    let id = session.identity().unwrap();

    let resume_at = jiff::civil::date(2099, 6, 1);
    assert_eq!(session.pause(resume_at).await.unwrap(), PlanStatus::Paused);
    let remote = gateway.fetch(id).await.unwrap();
    assert_eq!(remote.status, PlanStatus::Paused);
    assert_eq!(remote.resume_at, Some(resume_at));

    assert_eq!(session.archive().await.unwrap(), PlanStatus::Archived);
    edit(&session, StepId::Extras, json!({"inclusions": ["Water"]}));
    let err = session.save_step(StepId::Extras).await.unwrap_err();
    assert!(matches!(err, WizardError::Remote(GatewayError::Conflict { .. })));

    assert_eq!(session.unarchive().await.unwrap(), PlanStatus::Draft);
    assert!(session.save_step(StepId::Extras).await.is_ok());
}

#[tokio::test]
async fn test_pause_date_must_be_in_the_future() {
    let (_temp_dir, gateway) = create_test_gateway("alice").await;
    let id = gateway.create(&city_walk()).await.unwrap().id;
    let err = gateway
        .pause(id, jiff::civil::date(2000, 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Validation { ref field, .. } if field == "resume_at"));
}
