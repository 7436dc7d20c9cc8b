//! The server's copy of a plan.

use jiff::civil::Date;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{PlanId, PlanStatus};

/// A plan as returned by `fetch`. The document is kept in its stored shape;
/// it is normalized when it enters a draft.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemotePlan {
    /// Unique identifier for the plan
    pub id: PlanId,

    /// Provider that owns the plan
    pub owner: String,

    /// Status of the plan
    #[serde(default)]
    pub status: PlanStatus,

    /// Date a paused plan goes back on sale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_at: Option<Date>,

    /// Timestamp when the plan was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the plan was last modified (UTC)
    pub updated_at: Timestamp,

    /// Step groups keyed by step name
    #[serde(default)]
    pub document: Value,
}

/// Reply to a successful `create`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Created {
    pub id: PlanId,
    pub status: PlanStatus,
}
