//! Builder for starting and resuming editing sessions.

use std::sync::Arc;

use super::WizardSession;
use crate::{
    error::Result,
    gateway::PlanGateway,
    hydrate::HydrationLoader,
    models::PlanId,
    sync::{SyncCoordinator, SyncState},
};

/// Builder for [`WizardSession`] instances.
pub struct WizardSessionBuilder {
    gateway: Arc<dyn PlanGateway>,
    owner: Option<String>,
}

impl WizardSessionBuilder {
    pub fn new(gateway: Arc<dyn PlanGateway>) -> Self {
        Self {
            gateway,
            owner: None,
        }
    }

    /// Owner a resumed plan must belong to.
    ///
    /// Gateways already scope calls to their own owner; this adds a check on
    /// the fetched payload.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// A session for a new plan, starting at step 1.
    pub fn start(self) -> WizardSession {
        WizardSession::new(SyncCoordinator::new(self.gateway, SyncState::default()))
    }

    /// A session for existing plan `id`, starting at step 1.
    ///
    /// # Errors
    ///
    /// Hydration errors (`HydrationFailed`, `HydrationForbidden`,
    /// `MalformedDocument`). These are fatal: no session is returned.
    pub async fn resume(self, id: PlanId) -> Result<WizardSession> {
        let state = HydrationLoader::load(self.gateway.as_ref(), id, self.owner.as_deref()).await?;
        Ok(WizardSession::new(SyncCoordinator::new(self.gateway, state)))
    }
}
