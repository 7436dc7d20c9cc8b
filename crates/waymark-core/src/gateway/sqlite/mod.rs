//! Durable gateway over a single SQLite file.
//!
//! [`Database`] holds the connection and the synchronous queries. Each
//! [`SqliteGateway`] call opens it inside `spawn_blocking`, so no rusqlite
//! work runs on the async runtime's worker threads.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use jiff::civil::Date;
use log::info;
use rusqlite::Connection;
use tokio::task;

use super::{
    rules::{self, Transition},
    PlanGateway,
};
use crate::{
    error::{DatabaseResultExt, GatewayError, GatewayResult},
    models::{BasicDetails, Created, PlanId, PlanStatus, RemotePlan, StepSlice},
};

pub mod builder;
pub mod migrations;
pub mod plan_queries;

pub use builder::SqliteGatewayBuilder;

/// How long a connection waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Creates a new database connection and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .db_context("Failed to set busy timeout")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }
}

/// Gateway backed by the SQLite file at `db_path`, acting for `owner`.
#[derive(Debug, Clone)]
pub struct SqliteGateway {
    db_path: PathBuf,
    owner: String,
}

impl SqliteGateway {
    pub(crate) fn new(db_path: PathBuf, owner: String) -> Self {
        Self { db_path, owner }
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Runs `f` against a fresh connection on the blocking pool.
    async fn with_database<T, F>(&self, f: F) -> GatewayResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database, &str) -> GatewayResult<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        let owner = self.owner.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            f(&mut db, &owner)
        })
        .await
        .map_err(|e| GatewayError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    async fn apply_transition(
        &self,
        id: PlanId,
        transition: Transition,
        resume_at: Option<Date>,
    ) -> GatewayResult<PlanStatus> {
        let status = self
            .with_database(move |db, owner| db.transition_owned(id, owner, transition, resume_at))
            .await?;
        info!("Plan {id}: {} -> {status}", transition.as_str());
        Ok(status)
    }
}

#[async_trait]
impl PlanGateway for SqliteGateway {
    async fn create(&self, basics: &BasicDetails) -> GatewayResult<Created> {
        rules::check_basics(basics)?;
        let basics = basics.clone();
        let created = self
            .with_database(move |db, owner| db.create_plan(owner, &basics))
            .await?;
        info!("Created plan {} for {}", created.id, self.owner);
        Ok(created)
    }

    async fn update_step(&self, id: PlanId, slice: &StepSlice) -> GatewayResult<PlanStatus> {
        rules::check_update(slice)?;
        let slice = slice.clone();
        self.with_database(move |db, owner| db.write_owned_section(id, owner, &slice))
            .await
    }

    async fn publish(&self, id: PlanId) -> GatewayResult<PlanStatus> {
        self.apply_transition(id, Transition::Publish, None).await
    }

    async fn pause(&self, id: PlanId, resume_at: Date) -> GatewayResult<PlanStatus> {
        rules::check_resume_date(resume_at, rules::today())?;
        self.apply_transition(id, Transition::Pause, Some(resume_at))
            .await
    }

    async fn archive(&self, id: PlanId) -> GatewayResult<PlanStatus> {
        self.apply_transition(id, Transition::Archive, None).await
    }

    async fn unarchive(&self, id: PlanId) -> GatewayResult<PlanStatus> {
        self.apply_transition(id, Transition::Unarchive, None).await
    }

    async fn fetch(&self, id: PlanId) -> GatewayResult<RemotePlan> {
        self.with_database(move |db, owner| {
            db.owned_status(id, owner)?;
            db.get_plan(id)?.ok_or(GatewayError::NotFound { id })
        })
        .await
    }
}
