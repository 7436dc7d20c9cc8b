//! Persistence gateway: the remote store that owns a plan's durable state.
//!
//! Sessions only talk to a store through [`PlanGateway`]. Two implementations
//! ship with the crate:
//!
//! - [`InMemoryGateway`]: non-durable, with call recording and fault
//!   injection for tests and demos
//! - [`SqliteGateway`]: durable, one SQLite file, blocking work moved off the
//!   async runtime
//!
//! Both enforce the same server-side rules from [`rules`].

use async_trait::async_trait;
use jiff::civil::Date;

use crate::{
    error::GatewayResult,
    models::{BasicDetails, Created, PlanId, PlanStatus, RemotePlan, StepSlice},
};

pub mod memory;
pub mod rules;
pub mod sqlite;

pub use memory::{GatewayCall, InMemoryGateway, Operation};
pub use sqlite::{Database, SqliteGateway, SqliteGatewayBuilder};

/// Operations a plan store offers, keyed by plan id and scoped to the
/// gateway's owner.
///
/// The trait is object-safe so sessions can hold an `Arc<dyn PlanGateway>`.
#[async_trait]
pub trait PlanGateway: Send + Sync {
    /// Creates a plan from its step-1 group and returns the new identity.
    ///
    /// Fails with `Validation` if required step-1 fields are missing and with
    /// `Conflict` if the owner already has a draft for the same title and city.
    async fn create(&self, basics: &BasicDetails) -> GatewayResult<Created>;

    /// Replaces one step's group. The step travels inside the slice.
    ///
    /// Fails with `NotFound`, `Forbidden`, `Validation` or `Conflict` (plan is
    /// archived).
    async fn update_step(&self, id: PlanId, slice: &StepSlice) -> GatewayResult<PlanStatus>;

    /// Makes the plan live. Fails with `Precondition` when the server's own
    /// completeness check disagrees with the client.
    async fn publish(&self, id: PlanId) -> GatewayResult<PlanStatus>;

    /// Takes a published plan off sale until `resume_at`.
    async fn pause(&self, id: PlanId, resume_at: Date) -> GatewayResult<PlanStatus>;

    async fn archive(&self, id: PlanId) -> GatewayResult<PlanStatus>;

    async fn unarchive(&self, id: PlanId) -> GatewayResult<PlanStatus>;

    /// The stored plan, document in its stored shape.
    async fn fetch(&self, id: PlanId) -> GatewayResult<RemotePlan>;
}

// Compile-time assertion: PlanGateway must stay object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn PlanGateway) {}
};
