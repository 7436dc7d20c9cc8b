//! Data models for plans and their step groups.
//!
//! [`PlanDocument`] is the whole resource under construction. Each
//! [`StepId`] owns exactly one field group of it, carried around as a
//! [`StepSlice`]. Two stored shapes are normalized on the way in:
//!
//! - a bare numeric `duration` becomes `{value, unit: "hours"}`
//! - a nested `pricing.price = {amount, currency}` becomes the flat
//!   `base_price` / `currency` pair
//!
//! ```rust
//! use waymark_core::models::{Duration, PlanDocument, StepId};
//!
//! let doc: PlanDocument = serde_json::from_value(serde_json::json!({
//!     "basics": {"title": "City Walk"},
//!     "itinerary": {"duration": 3},
//! }))
//! .unwrap();
//! assert_eq!(doc.itinerary.duration, Some(Duration::hours(3)));
//! assert_eq!(doc.slice(StepId::Basics).step(), StepId::Basics);
//! ```

pub mod duration;
pub mod plan;
pub mod remote;
pub mod status;


pub use duration::{Duration, DurationUnit};
pub use plan::{
    BasicDetails, Extras, Itinerary, ItineraryStop, Logistics, PlanDocument, Policies, Pricing,
    Schedule, StepSlice,
};
pub use remote::{Created, RemotePlan};
pub use status::{PlanId, PlanStatus, StepId};
