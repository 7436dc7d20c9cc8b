//! Non-durable gateway with call recording and fault injection.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use jiff::{civil::Date, Timestamp};
use serde_json::{Map, Value};
use tokio::sync::Notify;

use super::{
    rules::{self, Transition},
    PlanGateway,
};
use crate::{
    error::{GatewayError, GatewayResult},
    models::{BasicDetails, Created, PlanId, PlanStatus, RemotePlan, StepId, StepSlice},
};

/// Gateway operations, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Create,
    UpdateStep,
    Publish,
    Pause,
    Archive,
    Unarchive,
    Fetch,
}

/// One entry in the call log.
///
/// Calls are logged when they arrive. `CreateResolved` is logged when a
/// create returns successfully, so ordering between a create response and
/// later calls can be asserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Create,
    CreateResolved(PlanId),
    UpdateStep(PlanId, StepId),
    Publish(PlanId),
    Pause(PlanId),
    Archive(PlanId),
    Unarchive(PlanId),
    Fetch(PlanId),
}

#[derive(Debug, Clone)]
struct StoredPlan {
    owner: String,
    status: PlanStatus,
    resume_at: Option<Date>,
    created_at: Timestamp,
    updated_at: Timestamp,
    document: Map<String, Value>,
}

impl StoredPlan {
    fn basics(&self) -> BasicDetails {
        self.document
            .get(StepId::Basics.as_str())
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default()
    }

    fn to_remote(&self, id: PlanId) -> RemotePlan {
        RemotePlan {
            id,
            owner: self.owner.clone(),
            status: self.status,
            resume_at: self.resume_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            document: Value::Object(self.document.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    plans: BTreeMap<PlanId, StoredPlan>,
    next_id: u64,
    calls: Vec<GatewayCall>,
    failures: BTreeMap<Operation, VecDeque<GatewayError>>,
}

type Holds = Arc<Mutex<BTreeMap<Operation, Arc<Notify>>>>;

/// Plans kept in process memory, shared by every handle cloned from the
/// same gateway.
///
/// Handles created with [`InMemoryGateway::as_owner`] see the same plans but
/// act for a different owner, which is how ownership checks are exercised.
#[derive(Debug, Clone)]
pub struct InMemoryGateway {
    owner: String,
    state: Arc<Mutex<MemoryState>>,
    holds: Holds,
}

impl InMemoryGateway {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            state: Arc::new(Mutex::new(MemoryState::default())),
            holds: Arc::default(),
        }
    }

    /// A handle onto the same store acting for `owner`.
    pub fn as_owner(&self, owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            state: Arc::clone(&self.state),
            holds: Arc::clone(&self.holds),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Inserts a stored plan as-is, legacy shapes included.
    ///
    /// Non-object documents are stored as empty.
    pub fn seed(&self, owner: &str, status: PlanStatus, document: Value) -> PlanId {
        let document = match document {
            Value::Object(document) => document,
            _ => Map::new(),
        };
        let now = Timestamp::now();
        let mut state = self.lock();
        let id = state.allocate_id();
        state.plans.insert(
            id,
            StoredPlan {
                owner: owner.to_string(),
                status,
                resume_at: None,
                created_at: now,
                updated_at: now,
                document,
            },
        );
        id
    }

    /// Makes the next call to `operation` fail with `error`. Queued failures
    /// are consumed in order.
    pub fn fail_next(&self, operation: Operation, error: GatewayError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Holds the next `create` until the returned handle is notified.
    pub fn hold_next_create(&self) -> Arc<Notify> {
        self.hold_next(Operation::Create)
    }

    /// Holds the next `update_step` until the returned handle is notified.
    pub fn hold_next_update(&self) -> Arc<Notify> {
        self.hold_next(Operation::UpdateStep)
    }

    /// Holds the next call to `operation` after it is logged and before it
    /// takes effect.
    pub fn hold_next(&self, operation: Operation) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(operation, Arc::clone(&notify));
        notify
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    /// Number of calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&GatewayCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// The stored document for `id`, without recording a call.
    pub fn stored_document(&self, id: PlanId) -> Option<Value> {
        self.lock()
            .plans
            .get(&id)
            .map(|plan| Value::Object(plan.document.clone()))
    }

    /// The stored status for `id`, without recording a call.
    pub fn stored_status(&self, id: PlanId) -> Option<PlanStatus> {
        self.lock().plans.get(&id).map(|plan| plan.status)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Logs the call, waits out a hold, then pops a pending injected
    /// failure, if any.
    async fn begin(&self, call: GatewayCall, operation: Operation) -> GatewayResult<()> {
        self.lock().calls.push(call);

        let hold = self
            .holds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&operation);
        if let Some(notify) = hold {
            notify.notified().await;
        }

        self.lock().take_failure(operation)
    }

    /// Applies `f` to the caller's own plan.
    fn with_owned<T>(
        &self,
        id: PlanId,
        f: impl FnOnce(&mut StoredPlan) -> GatewayResult<T>,
    ) -> GatewayResult<T> {
        let mut state = self.lock();
        let plan = state
            .plans
            .get_mut(&id)
            .ok_or(GatewayError::NotFound { id })?;
        if plan.owner != self.owner {
            return Err(GatewayError::Forbidden { id });
        }
        f(plan)
    }

    fn apply_transition(
        &self,
        id: PlanId,
        transition: Transition,
        resume_at: Option<Date>,
    ) -> GatewayResult<PlanStatus> {
        self.with_owned(id, |plan| {
            let status = rules::transition(id, plan.status, transition)?;
            if transition == Transition::Publish && plan.status != PlanStatus::Published {
                rules::check_publishable(&Value::Object(plan.document.clone()))?;
            }
            plan.status = status;
            plan.resume_at = resume_at;
            plan.updated_at = Timestamp::now();
            Ok(status)
        })
    }
}

impl MemoryState {
    fn allocate_id(&mut self) -> PlanId {
        self.next_id += 1;
        PlanId(self.next_id)
    }

    fn take_failure(&mut self, operation: Operation) -> GatewayResult<()> {
        match self
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlanGateway for InMemoryGateway {
    async fn create(&self, basics: &BasicDetails) -> GatewayResult<Created> {
        self.begin(GatewayCall::Create, Operation::Create).await?;
        rules::check_basics(basics)?;
        let body = serde_json::to_value(basics)?;

        let mut state = self.lock();
        let duplicate = state.plans.values().any(|plan| {
            plan.owner == self.owner
                && plan.status == PlanStatus::Draft
                && rules::is_duplicate(&plan.basics(), basics)
        });
        if duplicate {
            return Err(GatewayError::conflict(
                "a draft with the same title and city already exists",
            ));
        }

        let id = state.allocate_id();
        let now = Timestamp::now();
        let mut document = Map::new();
        document.insert(StepId::Basics.as_str().to_string(), body);
        state.plans.insert(
            id,
            StoredPlan {
                owner: self.owner.clone(),
                status: PlanStatus::Draft,
                resume_at: None,
                created_at: now,
                updated_at: now,
                document,
            },
        );
        state.calls.push(GatewayCall::CreateResolved(id));
        Ok(Created {
            id,
            status: PlanStatus::Draft,
        })
    }

    async fn update_step(&self, id: PlanId, slice: &StepSlice) -> GatewayResult<PlanStatus> {
        let step = slice.step();
        self.begin(GatewayCall::UpdateStep(id, step), Operation::UpdateStep).await?;
        let body = serde_json::to_value(slice)?;

        self.with_owned(id, |plan| {
            rules::check_editable(id, plan.status)?;
            rules::check_update(slice)?;
            plan.document.insert(step.as_str().to_string(), body);
            plan.updated_at = Timestamp::now();
            Ok(plan.status)
        })
    }

    async fn publish(&self, id: PlanId) -> GatewayResult<PlanStatus> {
        self.begin(GatewayCall::Publish(id), Operation::Publish).await?;
        self.apply_transition(id, Transition::Publish, None)
    }

    async fn pause(&self, id: PlanId, resume_at: Date) -> GatewayResult<PlanStatus> {
        self.begin(GatewayCall::Pause(id), Operation::Pause).await?;
        rules::check_resume_date(resume_at, rules::today())?;
        self.apply_transition(id, Transition::Pause, Some(resume_at))
    }

    async fn archive(&self, id: PlanId) -> GatewayResult<PlanStatus> {
        self.begin(GatewayCall::Archive(id), Operation::Archive).await?;
        self.apply_transition(id, Transition::Archive, None)
    }

    async fn unarchive(&self, id: PlanId) -> GatewayResult<PlanStatus> {
        self.begin(GatewayCall::Unarchive(id), Operation::Unarchive).await?;
        self.apply_transition(id, Transition::Unarchive, None)
    }

    async fn fetch(&self, id: PlanId) -> GatewayResult<RemotePlan> {
        self.begin(GatewayCall::Fetch(id), Operation::Fetch).await?;
        self.with_owned(id, |plan| Ok(plan.to_remote(id)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn basics(title: &str) -> BasicDetails {
        BasicDetails {
            title: Some(title.to_string()),
            city: Some("Jaipur".to_string()),
            state: Some("Rajasthan".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let gateway = InMemoryGateway::new("alice");
        let created = gateway.create(&basics("City Walk")).await.unwrap();
        assert_eq!(created.status, PlanStatus::Draft);

        let remote = gateway.fetch(created.id).await.unwrap();
        assert_eq!(remote.owner, "alice");
        assert_eq!(remote.document["basics"]["title"], json!("City Walk"));
        assert_eq!(
            gateway.calls(),
            vec![
                GatewayCall::Create,
                GatewayCall::CreateResolved(created.id),
                GatewayCall::Fetch(created.id)
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_draft_conflicts() {
        let gateway = InMemoryGateway::new("alice");
        gateway.create(&basics("City Walk")).await.unwrap();
        let err = gateway.create(&basics("city walk")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Conflict { .. }));

        // Another owner may use the same title.
        let bob = gateway.as_owner("bob");
        assert!(bob.create(&basics("City Walk")).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_requires_basics() {
        let gateway = InMemoryGateway::new("alice");
        let err = gateway.create(&BasicDetails::default()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_ownership_is_enforced() {
        let gateway = InMemoryGateway::new("alice");
        let id = gateway.create(&basics("City Walk")).await.unwrap().id;
        let bob = gateway.as_owner("bob");

        assert!(matches!(bob.fetch(id).await, Err(GatewayError::Forbidden { .. })));
        let slice = StepSlice::empty(StepId::Extras);
        assert!(matches!(
            bob.update_step(id, &slice).await,
            Err(GatewayError::Forbidden { .. })
        ));
        assert!(matches!(
            gateway.fetch(PlanId(404)).await,
            Err(GatewayError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let gateway = InMemoryGateway::new("alice");
        let id = gateway.create(&basics("City Walk")).await.unwrap().id;
        gateway.fail_next(Operation::UpdateStep, GatewayError::network("timeout"));

        let slice = StepSlice::empty(StepId::Extras);
        assert!(matches!(
            gateway.update_step(id, &slice).await,
            Err(GatewayError::Network { .. })
        ));
        assert!(gateway.update_step(id, &slice).await.is_ok());
    }

    #[tokio::test]
    async fn test_publish_checks_completeness() {
        let gateway = InMemoryGateway::new("alice");
        let id = gateway.create(&basics("City Walk")).await.unwrap().id;
        let err = gateway.publish(id).await.unwrap_err();
        assert!(matches!(err, GatewayError::Precondition { .. }));
        assert_eq!(gateway.stored_status(id), Some(PlanStatus::Draft));
    }

    #[tokio::test]
    async fn test_archived_plans_reject_updates() {
        let gateway = InMemoryGateway::new("alice");
        let id = gateway.create(&basics("City Walk")).await.unwrap().id;
        assert_eq!(gateway.archive(id).await.unwrap(), PlanStatus::Archived);

        let slice = StepSlice::empty(StepId::Extras);
        assert!(matches!(
            gateway.update_step(id, &slice).await,
            Err(GatewayError::Conflict { .. })
        ));
        assert_eq!(gateway.unarchive(id).await.unwrap(), PlanStatus::Draft);
        assert!(gateway.update_step(id, &slice).await.is_ok());
    }

    #[tokio::test]
    async fn test_seed_keeps_raw_document() {
        let gateway = InMemoryGateway::new("alice");
        let id = gateway.seed("alice", PlanStatus::Draft, json!({"itinerary": {"duration": 3}}));
        let remote = gateway.fetch(id).await.unwrap();
        assert_eq!(remote.document["itinerary"]["duration"], json!(3));
    }
}
