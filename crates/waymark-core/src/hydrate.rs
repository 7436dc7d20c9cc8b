//! Rebuilds local authoring state from a stored plan.

use log::{debug, info};

use crate::{
    draft::DraftStore,
    error::{GatewayError, Result, WizardError},
    gate::CompletionGate,
    gateway::PlanGateway,
    models::{PlanId, RemotePlan, StepId},
    sync::{RemoteState, SyncState},
    tracker::DirtyTracker,
    validate,
};

/// Loads an existing plan for editing.
pub struct HydrationLoader;

impl HydrationLoader {
    /// Fetches plan `id` and seeds draft, baselines and completion flags
    /// from it.
    ///
    /// Stored shapes are normalized on the way in. Every step's baseline is
    /// its hydrated slice, so opening a plan never counts as an edit. Steps
    /// that are valid as loaded are marked completed.
    ///
    /// # Errors
    ///
    /// - `HydrationForbidden` when the plan belongs to someone other than
    ///   `owner` (or the gateway says so)
    /// - `HydrationFailed` for any other fetch failure
    /// - `MalformedDocument` when the stored document cannot be normalized
    ///
    /// All of these are fatal for the session.
    pub async fn load(
        gateway: &dyn PlanGateway,
        id: PlanId,
        owner: Option<&str>,
    ) -> Result<SyncState> {
        let remote = match gateway.fetch(id).await {
            Ok(remote) => remote,
            Err(GatewayError::Forbidden { .. }) => return Err(WizardError::HydrationForbidden { id }),
            Err(source) => return Err(WizardError::HydrationFailed { id, source }),
        };

        if owner.is_some_and(|owner| owner != remote.owner) {
            return Err(WizardError::HydrationForbidden { id });
        }

        let state = Self::seed(&remote)?;
        info!(
            "Loaded plan {id} ({}), {} of {} steps complete",
            remote.status,
            StepId::ALL.len() - state.gate.incomplete_steps().len(),
            StepId::ALL.len()
        );
        Ok(state)
    }

    /// Builds the local state for an already fetched plan.
    pub fn seed(remote: &RemotePlan) -> Result<SyncState> {
        let draft = DraftStore::from_remote(&remote.document)?;
        let mut tracker = DirtyTracker::new();
        let mut gate = CompletionGate::new();

        for step in StepId::ALL {
            tracker.record_synced(draft.slice(step));
            let valid = validate::is_valid(step, draft.get());
            gate.set(step, valid);
            debug!("Plan {}: step {step} hydrated (valid: {valid})", remote.id);
        }

        Ok(SyncState {
            draft,
            tracker,
            gate,
            remote: RemoteState::Created {
                id: remote.id,
                status: remote.status,
            },
        })
    }
}
