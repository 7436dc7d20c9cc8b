//! Core library for Waymark, a multi-step plan authoring engine.
//!
//! A provider builds a plan (a bookable experience) across seven ordered
//! steps. Each step owns a disjoint group of the plan document. The crate
//! keeps a local draft, validates each step before the wizard moves on,
//! persists only the steps that changed, and refuses to publish until every
//! step has been saved in a valid state.
//!
//! # Layers
//!
//! - [`schema`] and [`validate`]: which fields each step owns and when a
//!   step is complete
//! - [`draft`], [`tracker`] and [`gate`]: local document, last synced slices,
//!   and per-step completion flags
//! - [`sync`] and [`hydrate`]: talking to a [`gateway::PlanGateway`]
//! - [`session`]: the wizard actions (next, previous, save, finish, publish)
//! - [`display`]: markdown output
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use waymark_core::{FieldChange, InMemoryGateway, StepId, WizardSessionBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = WizardSessionBuilder::new(Arc::new(InMemoryGateway::new("alice"))).start();
//!
//! session.on_change(FieldChange::from_json(
//!     StepId::Basics,
//!     json!({"title": "City Walk", "city": "Jaipur", "state": "Rajasthan"}),
//! ))?;
//! session.next().await?;
//! println!("{}", session.progress());
//! # Ok(())
//! # }
//! ```

pub mod display;
pub mod draft;
pub mod error;
pub mod gate;
pub mod gateway;
pub mod hydrate;
pub mod models;
pub mod schema;
pub mod session;
pub mod sync;
pub mod tracker;
pub mod validate;

// Re-export commonly used types
pub use display::{FieldRenderer, MarkdownRenderer, OperationStatus, PlanOverview, Progress};
pub use draft::{DraftStore, FieldChange, FieldPatch, Origin};
pub use error::{GatewayError, GatewayResult, Result, WizardError};
pub use gate::CompletionGate;
pub use gateway::{InMemoryGateway, PlanGateway, SqliteGateway, SqliteGatewayBuilder};
pub use hydrate::HydrationLoader;
pub use models::{PlanDocument, PlanId, PlanStatus, RemotePlan, StepId, StepSlice};
pub use session::{WizardSession, WizardSessionBuilder};
pub use sync::{RemoteState, SyncCoordinator, SyncOutcome, SyncState};
pub use tracker::DirtyTracker;
pub use validate::FieldIssue;
