//! Plan and section queries.

use jiff::{civil::Date, Timestamp};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row, TransactionBehavior};
use serde_json::Value;

use crate::{
    error::{DatabaseResultExt, GatewayError, GatewayResult},
    gateway::rules::{self, Transition},
    models::{BasicDetails, Created, PlanId, PlanStatus, RemotePlan, StepId, StepSlice},
};

const INSERT_PLAN_SQL: &str =
    "INSERT INTO plans (owner, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)";
const SELECT_PLAN_SQL: &str =
    "SELECT id, owner, status, resume_at, created_at, updated_at FROM plans WHERE id = ?1";
const SELECT_OWNER_STATUS_SQL: &str = "SELECT owner, status FROM plans WHERE id = ?1";
const UPDATE_STATUS_SQL: &str =
    "UPDATE plans SET status = ?1, resume_at = ?2, updated_at = ?3 WHERE id = ?4";
const TOUCH_PLAN_SQL: &str = "UPDATE plans SET updated_at = ?1 WHERE id = ?2";
const UPSERT_SECTION_SQL: &str = "INSERT INTO plan_sections (plan_id, step, body, updated_at) \
     VALUES (?1, ?2, ?3, ?4) \
     ON CONFLICT(plan_id, step) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at";
const SELECT_SECTIONS_SQL: &str = "SELECT step, body FROM plan_sections WHERE plan_id = ?1";
const SELECT_DRAFT_BASICS_SQL: &str = "SELECT s.body FROM plan_sections s \
     JOIN plans p ON p.id = s.plan_id \
     WHERE p.owner = ?1 AND p.status = 'draft' AND s.step = 'basics'";

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn parse_status(column: usize, raw: &str) -> rusqlite::Result<PlanStatus> {
    raw.parse::<PlanStatus>()
        .map_err(|message| conversion_error(column, message))
}

fn parse_timestamp(row: &Row<'_>, column: usize) -> rusqlite::Result<Timestamp> {
    row.get::<_, String>(column)?
        .parse::<Timestamp>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

impl super::Database {
    /// Inserts a plan with its step-1 section.
    ///
    /// Fails with `Conflict` if `owner` already has a draft with the same
    /// title and city.
    pub fn create_plan(&mut self, owner: &str, basics: &BasicDetails) -> GatewayResult<Created> {
        let body = serde_json::to_string(basics)?;

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        {
            let mut stmt = tx
                .prepare(SELECT_DRAFT_BASICS_SQL)
                .db_context("Failed to prepare query")?;
            let bodies = stmt
                .query_map(params![owner], |row| row.get::<_, String>(0))
                .db_context("Failed to query drafts")?;
            for existing in bodies {
                let existing = existing.db_context("Failed to read draft")?;
                let existing: BasicDetails = serde_json::from_str(&existing)?;
                if rules::is_duplicate(&existing, basics) {
                    return Err(GatewayError::conflict(
                        "a draft with the same title and city already exists",
                    ));
                }
            }
        }

        let now = Timestamp::now().to_string();
        tx.execute(
            INSERT_PLAN_SQL,
            params![owner, PlanStatus::Draft.as_str(), &now, &now],
        )
        .db_context("Failed to insert plan")?;
        let id = PlanId(tx.last_insert_rowid() as u64);

        tx.execute(
            UPSERT_SECTION_SQL,
            params![id.0 as i64, StepId::Basics.as_str(), &body, &now],
        )
        .db_context("Failed to insert basics section")?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Created {
            id,
            status: PlanStatus::Draft,
        })
    }

    /// Status of a plan owned by `owner`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Forbidden` for another owner's plan.
    pub fn owned_status(&self, id: PlanId, owner: &str) -> GatewayResult<PlanStatus> {
        owned_status(&self.connection, id, owner)
    }

    /// Replaces one step's section of an editable plan owned by `owner`.
    ///
    /// The owner and status are read inside the same write transaction as
    /// the section, so an archive committed by another connection is either
    /// seen here or waits for this write.
    pub fn write_owned_section(
        &mut self,
        id: PlanId,
        owner: &str,
        slice: &StepSlice,
    ) -> GatewayResult<PlanStatus> {
        let body = serde_json::to_string(slice)?;

        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let status = owned_status(&tx, id, owner)?;
        rules::check_editable(id, status)?;
        upsert_section(&tx, id, slice.step(), &body)?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(status)
    }

    /// Stores a section body verbatim.
    pub fn write_raw_section(&mut self, id: PlanId, step: StepId, body: &str) -> GatewayResult<()> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;
        upsert_section(&tx, id, step, body)?;
        tx.commit().db_context("Failed to commit transaction")?;
        Ok(())
    }

    /// Applies `transition` to a plan owned by `owner` and returns the new
    /// status. Read, check and write share one write transaction.
    pub fn transition_owned(
        &mut self,
        id: PlanId,
        owner: &str,
        transition: Transition,
        resume_at: Option<Date>,
    ) -> GatewayResult<PlanStatus> {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let current = owned_status(&tx, id, owner)?;
        let next = rules::transition(id, current, transition)?;
        if transition == Transition::Publish && current != PlanStatus::Published {
            rules::check_publishable(&load_document(&tx, id)?)?;
        }
        update_status(&tx, id, next, resume_at)?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(next)
    }

    /// Sets a plan's status and resume date.
    pub fn set_status(
        &self,
        id: PlanId,
        status: PlanStatus,
        resume_at: Option<Date>,
    ) -> GatewayResult<()> {
        update_status(&self.connection, id, status, resume_at)
    }

    /// Stored sections assembled into one document object.
    pub fn load_document(&self, id: PlanId) -> GatewayResult<Value> {
        load_document(&self.connection, id)
    }

    /// Retrieves a plan with its document.
    pub fn get_plan(&self, id: PlanId) -> GatewayResult<Option<RemotePlan>> {
        let plan = self
            .connection
            .query_row(SELECT_PLAN_SQL, params![id.0 as i64], |row| {
                let resume_at = row
                    .get::<_, Option<String>>(3)?
                    .map(|raw| {
                        raw.parse::<Date>().map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
                        })
                    })
                    .transpose()?;
                Ok(RemotePlan {
                    id: PlanId(row.get::<_, i64>(0)? as u64),
                    owner: row.get(1)?,
                    status: parse_status(2, &row.get::<_, String>(2)?)?,
                    resume_at,
                    created_at: parse_timestamp(row, 4)?,
                    updated_at: parse_timestamp(row, 5)?,
                    document: Value::Null,
                })
            })
            .optional()
            .db_context("Failed to query plan")?;

        match plan {
            Some(mut plan) => {
                plan.document = self.load_document(id)?;
                Ok(Some(plan))
            }
            None => Ok(None),
        }
    }
}

fn owned_status(connection: &Connection, id: PlanId, owner: &str) -> GatewayResult<PlanStatus> {
    let row = connection
        .query_row(SELECT_OWNER_STATUS_SQL, params![id.0 as i64], |row| {
            let owner: String = row.get(0)?;
            let status = parse_status(1, &row.get::<_, String>(1)?)?;
            Ok((owner, status))
        })
        .optional()
        .db_context("Failed to query plan")?;

    match row {
        None => Err(GatewayError::NotFound { id }),
        Some((stored_owner, _)) if stored_owner != owner => Err(GatewayError::Forbidden { id }),
        Some((_, status)) => Ok(status),
    }
}

/// Upserts a section and touches the plan's `updated_at`.
fn upsert_section(connection: &Connection, id: PlanId, step: StepId, body: &str) -> GatewayResult<()> {
    let now = Timestamp::now().to_string();
    connection
        .execute(
            UPSERT_SECTION_SQL,
            params![id.0 as i64, step.as_str(), body, &now],
        )
        .db_context("Failed to write section")?;
    connection
        .execute(TOUCH_PLAN_SQL, params![&now, id.0 as i64])
        .db_context("Failed to update plan timestamp")?;
    Ok(())
}

fn update_status(
    connection: &Connection,
    id: PlanId,
    status: PlanStatus,
    resume_at: Option<Date>,
) -> GatewayResult<()> {
    let now = Timestamp::now().to_string();
    let changed = connection
        .execute(
            UPDATE_STATUS_SQL,
            params![
                status.as_str(),
                resume_at.map(|date| date.to_string()),
                &now,
                id.0 as i64
            ],
        )
        .db_context("Failed to update plan status")?;
    if changed == 0 {
        return Err(GatewayError::NotFound { id });
    }
    Ok(())
}

fn load_document(connection: &Connection, id: PlanId) -> GatewayResult<Value> {
    let mut stmt = connection
        .prepare(SELECT_SECTIONS_SQL)
        .db_context("Failed to prepare query")?;
    let rows = stmt
        .query_map(params![id.0 as i64], |row| {
            let step = row
                .get::<_, String>(0)?
                .parse::<StepId>()
                .map_err(|message| conversion_error(0, message))?;
            Ok((step, row.get::<_, String>(1)?))
        })
        .db_context("Failed to query sections")?;

    let mut sections = Vec::new();
    for row in rows {
        let (step, body) = row.db_context("Failed to read section")?;
        sections.push((step, serde_json::from_str::<Value>(&body)?));
    }
    Ok(rules::document_value(sections))
}
