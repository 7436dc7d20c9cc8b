//! Editing sessions: one provider authoring one plan.
//!
//! A [`WizardSession`] ties the draft, dirty tracker, completion gate and
//! sync coordinator together behind the actions a wizard UI offers. Field
//! edits arrive as [`FieldChange`] events through [`WizardSession::on_change`]
//! and are queued; [`WizardSession::flush`] applies them. Every boundary
//! action flushes first, so no timer decides when an edit lands.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use waymark_core::{
//!     draft::FieldChange, gateway::InMemoryGateway, models::StepId, session::WizardSessionBuilder,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Arc::new(InMemoryGateway::new("alice"));
//! let session = WizardSessionBuilder::new(gateway).start();
//!
//! session.on_change(FieldChange::from_json(
//!     StepId::Basics,
//!     json!({"title": "City Walk", "city": "Jaipur", "state": "Rajasthan"}),
//! ))?;
//! let outcome = session.next().await?;
//! assert_eq!(outcome.cursor, StepId::Itinerary);
//! assert!(session.identity().is_some());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::warn;

use crate::{
    display::{FieldRenderer, Progress},
    draft::{DraftStore, FieldChange, Origin},
    error::{Result, WizardError},
    models::{PlanDocument, PlanId, PlanStatus, StepId, StepSlice},
    schema,
    sync::{SyncCoordinator, SyncState},
    validate::{self, FieldIssue},
};

pub mod builder;
pub mod lifecycle;
pub mod navigation;

#[cfg(test)]
mod tests;

pub use builder::WizardSessionBuilder;
pub use lifecycle::PublishOutcome;
pub use navigation::{FinishOutcome, PreviousOutcome, StepOutcome};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An editing session over one plan.
#[derive(Debug)]
pub struct WizardSession {
    sync: SyncCoordinator,
    cursor: Mutex<StepId>,
    pending: Mutex<Vec<FieldChange>>,
    in_flight: Mutex<BTreeSet<String>>,
}

/// Marks an action as running until dropped.
struct ActionGuard<'a> {
    in_flight: &'a Mutex<BTreeSet<String>>,
    action: String,
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        lock(self.in_flight).remove(&self.action);
    }
}

impl WizardSession {
    pub(crate) fn new(sync: SyncCoordinator) -> Self {
        Self {
            sync,
            cursor: Mutex::new(StepId::FIRST),
            pending: Mutex::new(Vec::new()),
            in_flight: Mutex::new(BTreeSet::new()),
        }
    }

    /// Queues a field change for the next flush.
    ///
    /// # Errors
    ///
    /// `ForeignField` if the patch names a field its step does not own. The
    /// change is not queued.
    pub fn on_change(&self, change: FieldChange) -> Result<()> {
        DraftStore::check_ownership(change.step, &change.patch)?;
        lock(&self.pending).push(change);
        Ok(())
    }

    /// Applies queued changes to the draft in arrival order.
    ///
    /// A change whose values do not fit its step is dropped, leaving that
    /// step untouched; the remaining changes still apply and the first such
    /// failure is returned. Hydration-origin changes also move the step's
    /// sync baseline.
    pub fn flush(&self) -> Result<()> {
        let changes = std::mem::take(&mut *lock(&self.pending));
        if changes.is_empty() {
            return Ok(());
        }

        let mut state = self.sync.state();
        let mut first_error = None;
        for change in changes {
            if let Err(e) = state.draft.merge(change.step, &change.patch) {
                warn!("Dropped change to step {}: {e}", change.step);
                first_error.get_or_insert(e);
                continue;
            }
            if change.origin == Origin::Hydration {
                let slice = state.draft.slice(change.step);
                state.tracker.record_synced(slice);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// The step the wizard is showing.
    pub fn cursor(&self) -> StepId {
        *lock(&self.cursor)
    }

    /// Copy of the whole draft. Queued changes are not included until flushed.
    pub fn document(&self) -> PlanDocument {
        self.sync.state().draft.get().clone()
    }

    pub fn slice(&self, step: StepId) -> StepSlice {
        self.sync.state().draft.slice(step)
    }

    /// Server identity, once step 1 has been saved.
    pub fn identity(&self) -> Option<PlanId> {
        self.sync.state().remote.id()
    }

    /// Last status the server reported.
    pub fn status(&self) -> Option<PlanStatus> {
        self.sync.state().remote.status()
    }

    pub fn is_completed(&self, step: StepId) -> bool {
        self.sync.state().gate.is_completed(step)
    }

    /// Whether `step` differs from what was last saved.
    pub fn has_changed(&self, step: StepId) -> bool {
        let state = self.sync.state();
        state.tracker.has_changed(step, state.draft.get())
    }

    pub fn issues(&self, step: StepId) -> Vec<FieldIssue> {
        validate::issues(step, self.sync.state().draft.get())
    }

    pub fn is_valid(&self, step: StepId) -> bool {
        self.issues(step).is_empty()
    }

    /// True iff the plan exists, is not yet published, and every step is both
    /// completed and valid against the current draft.
    pub fn can_publish(&self) -> bool {
        self.sync.state().can_publish()
    }

    /// Steps blocking publication, in wizard order.
    pub fn incomplete_steps(&self) -> Vec<StepId> {
        self.sync.state().incomplete_steps()
    }

    pub fn progress(&self) -> Progress {
        Progress::from_state(&self.sync.state(), self.cursor())
    }

    /// Renders `step` through `renderer`.
    pub fn render<R: FieldRenderer>(&self, renderer: &R, step: StepId) -> R::View {
        let slice = self.slice(step);
        let issues = validate::slice_issues(&slice);
        renderer.render(schema::definition(step), &slice, &issues)
    }

    /// Local state snapshot.
    pub fn snapshot(&self) -> SyncState {
        self.sync.state().clone()
    }

    pub(crate) fn set_cursor(&self, step: StepId) {
        *lock(&self.cursor) = step;
    }

    /// Fails fast if `action` is already running.
    fn begin(&self, action: impl Into<String>) -> Result<ActionGuard<'_>> {
        let action = action.into();
        if !lock(&self.in_flight).insert(action.clone()) {
            return Err(WizardError::ActionInProgress { action });
        }
        Ok(ActionGuard {
            in_flight: &self.in_flight,
            action,
        })
    }

    /// Blocks the action when `step` is incomplete.
    fn require_valid(&self, step: StepId) -> Result<()> {
        let issues = self.issues(step);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(WizardError::StepInvalid { step, issues })
        }
    }
}
