//! Incremental persistence of step slices through a [`PlanGateway`].
//!
//! Step 1 creates the plan; every other step updates it. Three rules hold:
//!
//! - an unchanged slice is never sent
//! - a later step is never sent before the create response for this session
//!   has arrived
//! - two saves of the same step are never in flight at once
//!
//! The local state lives behind a `std::sync::Mutex` that is never held
//! across an `await`. Ordering is provided by async locks: a creation lock
//! held for the whole `create` call, and one lock per step.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jiff::civil::Date;
use log::{debug, info, warn};
use tokio::sync::Mutex as AsyncMutex;

use crate::{
    draft::DraftStore,
    error::{Result, WizardError},
    gate::CompletionGate,
    gateway::{rules::Transition, PlanGateway},
    models::{PlanId, PlanStatus, StepId, StepSlice},
    tracker::DirtyTracker,
    validate,
};

/// Whether the plan exists on the server yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteState {
    #[default]
    Uncreated,
    Created { id: PlanId, status: PlanStatus },
}

impl RemoteState {
    pub fn id(&self) -> Option<PlanId> {
        match self {
            RemoteState::Uncreated => None,
            RemoteState::Created { id, .. } => Some(*id),
        }
    }

    pub fn status(&self) -> Option<PlanStatus> {
        match self {
            RemoteState::Uncreated => None,
            RemoteState::Created { status, .. } => Some(*status),
        }
    }

    fn set_status(&mut self, new_status: PlanStatus) {
        if let RemoteState::Created { status, .. } = self {
            *status = new_status;
        }
    }
}

/// What a save did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Step 1 created the plan
    Created(PlanId),
    /// The slice was sent; the server reported this status
    Updated(PlanStatus),
    /// The slice matched its last synced value; nothing was sent
    Unchanged,
}

impl SyncOutcome {
    pub fn was_sent(&self) -> bool {
        !matches!(self, SyncOutcome::Unchanged)
    }
}

/// Local authoring state shared between the session and the coordinator.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    pub draft: DraftStore,
    pub tracker: DirtyTracker,
    pub gate: CompletionGate,
    pub remote: RemoteState,
}

impl SyncState {
    /// Whether every step is complete and valid and the plan can go live.
    pub fn can_publish(&self) -> bool {
        let Some(status) = self.remote.status() else {
            return false;
        };
        self.gate.can_publish(status)
            && StepId::ALL
                .into_iter()
                .all(|step| validate::is_valid(step, self.draft.get()))
    }

    /// Steps that are not both completed and valid right now.
    pub fn incomplete_steps(&self) -> Vec<StepId> {
        StepId::ALL
            .into_iter()
            .filter(|step| {
                !self.gate.is_completed(*step) || !validate::is_valid(*step, self.draft.get())
            })
            .collect()
    }

    /// Steps that currently fail validation.
    pub fn invalid_steps(&self) -> Vec<StepId> {
        StepId::ALL
            .into_iter()
            .filter(|step| !validate::is_valid(*step, self.draft.get()))
            .collect()
    }

    /// Steps whose slice differs from the last synced value.
    pub fn dirty_steps(&self) -> Vec<StepId> {
        StepId::ALL
            .into_iter()
            .filter(|step| self.tracker.has_changed(*step, self.draft.get()))
            .collect()
    }

    fn snapshot(&self, step: StepId) -> Snapshot {
        let slice = self.draft.slice(step);
        Snapshot {
            changed: self.tracker.slice_changed(&slice),
            issues: validate::slice_issues(&slice),
            slice,
        }
    }
}

struct Snapshot {
    slice: StepSlice,
    changed: bool,
    issues: Vec<validate::FieldIssue>,
}

/// Sends step slices to the gateway and keeps the local state in step with
/// the results.
pub struct SyncCoordinator {
    gateway: Arc<dyn PlanGateway>,
    state: Mutex<SyncState>,
    creation: AsyncMutex<()>,
    step_locks: BTreeMap<StepId, AsyncMutex<()>>,
}

impl SyncCoordinator {
    pub fn new(gateway: Arc<dyn PlanGateway>, state: SyncState) -> Self {
        Self {
            gateway,
            state: Mutex::new(state),
            creation: AsyncMutex::new(()),
            step_locks: StepId::ALL
                .into_iter()
                .map(|step| (step, AsyncMutex::new(())))
                .collect(),
        }
    }

    /// Locks the local state. Never hold the guard across an `await`.
    pub fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persists `step`'s slice if it changed since its last sync.
    ///
    /// # Errors
    ///
    /// - `StepInvalid` when step 1 is incomplete (nothing is sent)
    /// - `PlanNotCreated` for a later step before step 1 has been saved
    /// - `Remote` when the gateway call fails; the draft is kept and the
    ///   step's completion flag is cleared
    pub async fn save(&self, step: StepId) -> Result<SyncOutcome> {
        let _step_guard = self.step_lock(step).lock().await;

        let id = {
            let _creation = self.creation.lock().await;
            let current = self.state().remote.id();
            match current {
                Some(id) => id,
                None if step == StepId::FIRST => return self.create().await,
                None => return Err(WizardError::PlanNotCreated),
            }
        };
        self.update(id, step).await
    }

    /// Creates the plan from step 1. Callers hold the creation lock.
    async fn create(&self) -> Result<SyncOutcome> {
        let (snapshot, basics) = {
            let state = self.state();
            (state.snapshot(StepId::FIRST), state.draft.get().basics.clone())
        };
        if !snapshot.issues.is_empty() {
            return Err(WizardError::StepInvalid {
                step: StepId::FIRST,
                issues: snapshot.issues,
            });
        }

        let created = match self.gateway.create(&basics).await {
            Ok(created) => created,
            Err(e) => {
                warn!("Creating plan failed: {e}");
                return Err(e.into());
            }
        };

        let mut state = self.state();
        state.remote = RemoteState::Created {
            id: created.id,
            status: created.status,
        };
        state.tracker.record_synced(snapshot.slice);
        state.gate.mark_completed(StepId::FIRST);
        info!("Created plan {}", created.id);
        Ok(SyncOutcome::Created(created.id))
    }

    async fn update(&self, id: PlanId, step: StepId) -> Result<SyncOutcome> {
        let snapshot = self.state().snapshot(step);
        let valid = snapshot.issues.is_empty();

        if step == StepId::FIRST && !valid {
            self.state().gate.mark_incomplete(step);
            return Err(WizardError::StepInvalid {
                step,
                issues: snapshot.issues,
            });
        }

        if !snapshot.changed {
            self.state().gate.set(step, valid);
            debug!("Plan {id}: step {step} unchanged, skipping save");
            return Ok(SyncOutcome::Unchanged);
        }

        match self.gateway.update_step(id, &snapshot.slice).await {
            Ok(status) => {
                let mut state = self.state();
                state.tracker.record_synced(snapshot.slice);
                state.gate.set(step, valid);
                state.remote.set_status(status);
                debug!("Plan {id}: saved step {step} (complete: {valid})");
                Ok(SyncOutcome::Updated(status))
            }
            Err(e) => {
                self.state().gate.mark_incomplete(step);
                warn!("Plan {id}: saving step {step} failed: {e}");
                Err(e.into())
            }
        }
    }

    /// One publish call. A gateway failure is reported as `PublishRejected`
    /// and leaves the local status unchanged.
    pub async fn publish(&self, id: PlanId) -> Result<PlanStatus> {
        match self.gateway.publish(id).await {
            Ok(status) => {
                self.state().remote.set_status(status);
                info!("Published plan {id}");
                Ok(status)
            }
            Err(source) => {
                warn!("Publishing plan {id} failed: {source}");
                Err(WizardError::PublishRejected { source })
            }
        }
    }

    /// Takes the published plan off sale until `resume_at`.
    pub async fn pause(&self, resume_at: Date) -> Result<PlanStatus> {
        let id = self.identity()?;
        let status = self.gateway.pause(id, resume_at).await?;
        Ok(self.adopt(id, Transition::Pause, status))
    }

    pub async fn archive(&self) -> Result<PlanStatus> {
        let id = self.identity()?;
        let status = self.gateway.archive(id).await?;
        Ok(self.adopt(id, Transition::Archive, status))
    }

    pub async fn unarchive(&self) -> Result<PlanStatus> {
        let id = self.identity()?;
        let status = self.gateway.unarchive(id).await?;
        Ok(self.adopt(id, Transition::Unarchive, status))
    }

    fn adopt(&self, id: PlanId, transition: Transition, status: PlanStatus) -> PlanStatus {
        self.state().remote.set_status(status);
        info!("Plan {id}: {} -> {status}", transition.as_str());
        status
    }

    /// Re-reads the server status.
    pub async fn refresh_status(&self) -> Result<PlanStatus> {
        let id = self.identity()?;
        let remote = self.gateway.fetch(id).await?;
        self.state().remote.set_status(remote.status);
        Ok(remote.status)
    }

    pub fn identity(&self) -> Result<PlanId> {
        self.state().remote.id().ok_or(WizardError::PlanNotCreated)
    }

    fn step_lock(&self, step: StepId) -> &AsyncMutex<()> {
        // Every step has an entry, built in `new`.
        &self.step_locks[&step]
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}
