//! Step navigation and saving.

use log::{debug, warn};

use super::WizardSession;
use crate::{
    error::{Result, WizardError},
    models::StepId,
    sync::SyncOutcome,
};

/// Result of `next` or a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// The step that was saved
    pub saved: StepId,
    pub sync: SyncOutcome,
    /// Cursor after the action
    pub cursor: StepId,
}

/// Result of `previous`. Moving back always succeeds; a failed save of the
/// step being left is reported as a warning.
#[derive(Debug)]
pub struct PreviousOutcome {
    pub cursor: StepId,
    pub sync: Option<SyncOutcome>,
    pub warning: Option<WizardError>,
}

/// Result of `finish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishOutcome {
    pub sync: SyncOutcome,
    pub ready_to_publish: bool,
    /// Steps still blocking publication, in wizard order
    pub incomplete: Vec<StepId>,
}

impl WizardSession {
    /// Validates the current step, saves it if it changed, and advances.
    ///
    /// # Errors
    ///
    /// - `NoNextStep` on the last step (use `finish`)
    /// - `StepInvalid` listing the missing fields; nothing is sent
    /// - any save failure
    ///
    /// The cursor only moves on success.
    pub async fn next(&self) -> Result<StepOutcome> {
        let _guard = self.begin("next")?;
        self.flush()?;

        let step = self.cursor();
        let target = step.next().ok_or(WizardError::NoNextStep { step })?;
        self.require_valid(step)?;

        let sync = self.sync.save(step).await?;
        self.set_cursor(target);
        debug!("Moved from step {step} to {target}");
        Ok(StepOutcome {
            saved: step,
            sync,
            cursor: target,
        })
    }

    /// Saves the current step on a best-effort basis and moves back.
    ///
    /// # Errors
    ///
    /// `NoPreviousStep` on the first step, or `ActionInProgress`.
    pub async fn previous(&self) -> Result<PreviousOutcome> {
        let _guard = self.begin("previous")?;

        let step = self.cursor();
        let target = step.previous().ok_or(WizardError::NoPreviousStep { step })?;

        let saved = match self.flush() {
            Ok(()) => self.sync.save(step).await,
            Err(e) => Err(e),
        };
        let (sync, warning) = match saved {
            Ok(outcome) => (Some(outcome), None),
            Err(e) => {
                warn!("Leaving step {step} without saving: {e}");
                (None, Some(e))
            }
        };

        self.set_cursor(target);
        Ok(PreviousOutcome {
            cursor: target,
            sync,
            warning,
        })
    }

    /// Saves the current step without moving.
    pub async fn save_draft(&self) -> Result<StepOutcome> {
        self.save_step(self.cursor()).await
    }

    /// Saves `step` if it changed.
    ///
    /// Steps after the first may be saved incomplete; their completion flag
    /// then stays unset. Step 1 must be complete because saving it creates
    /// the plan.
    pub async fn save_step(&self, step: StepId) -> Result<StepOutcome> {
        let _guard = self.begin(format!("save {}", step.as_str()))?;
        self.flush()?;

        let sync = self.sync.save(step).await?;
        Ok(StepOutcome {
            saved: step,
            sync,
            cursor: self.cursor(),
        })
    }

    /// Validates and saves the current step, then reports whether the plan
    /// can be published.
    pub async fn finish(&self) -> Result<FinishOutcome> {
        let _guard = self.begin("finish")?;
        self.flush()?;

        let step = self.cursor();
        self.require_valid(step)?;
        let sync = self.sync.save(step).await?;

        let state = self.sync.state();
        Ok(FinishOutcome {
            sync,
            ready_to_publish: state.can_publish(),
            incomplete: state.incomplete_steps(),
        })
    }

    /// Moves the cursor without saving.
    ///
    /// Used when reopening a plan at a particular step.
    pub fn go_to(&self, step: StepId) {
        self.set_cursor(step);
    }
}
