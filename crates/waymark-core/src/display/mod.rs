//! Markdown formatting for plans, steps and session outcomes.
//!
//! Domain types that have one obvious rendering implement
//! [`std::fmt::Display`] directly; anything contextual goes through a wrapper
//! type or a [`FieldRenderer`]. All output is markdown so the CLI can pass it
//! through its terminal renderer unchanged.
//!
//! - [`render`]: the field renderer seam and its markdown implementation
//! - [`progress`]: per-step completion summary for a session
//! - [`plan`]: stored plan overview
//! - [`status`]: one-line success and failure messages
//! - [`datetime`]: timestamps in the system time zone

pub mod datetime;
pub mod plan;
pub mod progress;
pub mod render;
pub mod status;

pub use datetime::LocalDateTime;
pub use plan::PlanOverview;
pub use progress::{Progress, StepProgress};
pub use render::{FieldRenderer, MarkdownRenderer};
pub use status::OperationStatus;
