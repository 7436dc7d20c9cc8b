//! Publishing and other status transitions.

use jiff::civil::Date;
use log::info;

use super::WizardSession;
use crate::{
    error::{Result, WizardError},
    models::{PlanStatus, StepId},
};

/// Result of `publish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// One publish call was made and succeeded
    Published(PlanStatus),
    /// The plan was already live; nothing was sent
    AlreadyPublished,
}

impl WizardSession {
    /// Publishes the plan.
    ///
    /// The client gate runs first: the plan must exist and every step must
    /// be valid. Changed steps are then saved, and a single publish call is
    /// made once every step is completed.
    ///
    /// # Errors
    ///
    /// - `PlanNotCreated` before step 1 has been saved
    /// - `IncompleteSteps` when the client gate refuses; nothing is sent
    /// - `PublishRejected` when the server refuses; the status is unchanged
    /// - any save failure while flushing changed steps
    pub async fn publish(&self) -> Result<PublishOutcome> {
        let _guard = self.begin("publish")?;
        self.flush()?;

        let (id, status, invalid) = {
            let state = self.sync.state();
            (state.remote.id(), state.remote.status(), state.invalid_steps())
        };
        let id = id.ok_or(WizardError::PlanNotCreated)?;

        if status == Some(PlanStatus::Published) {
            info!("Plan {id} is already published");
            return Ok(PublishOutcome::AlreadyPublished);
        }
        if !invalid.is_empty() {
            return Err(WizardError::IncompleteSteps { missing: invalid });
        }

        let dirty = self.sync.state().dirty_steps();
        for step in dirty {
            self.sync.save(step).await?;
        }

        let incomplete: Vec<StepId> = self.sync.state().gate.incomplete_steps();
        if !incomplete.is_empty() {
            return Err(WizardError::IncompleteSteps {
                missing: incomplete,
            });
        }

        let status = self.sync.publish(id).await?;
        Ok(PublishOutcome::Published(status))
    }

    /// Takes the published plan off sale until `resume_at`.
    pub async fn pause(&self, resume_at: Date) -> Result<PlanStatus> {
        let _guard = self.begin("pause")?;
        self.sync.pause(resume_at).await
    }

    pub async fn archive(&self) -> Result<PlanStatus> {
        let _guard = self.begin("archive")?;
        self.sync.archive().await
    }

    /// Returns an archived plan to draft.
    pub async fn unarchive(&self) -> Result<PlanStatus> {
        let _guard = self.begin("unarchive")?;
        self.sync.unarchive().await
    }

    /// Re-reads the plan's status from the server.
    pub async fn refresh_status(&self) -> Result<PlanStatus> {
        let _guard = self.begin("refresh")?;
        self.sync.refresh_status().await
    }
}
