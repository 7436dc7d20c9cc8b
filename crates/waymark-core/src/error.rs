//! Error types for plan authoring and the persistence gateways.
//!
//! Two layers are kept apart. [`GatewayError`] is what a persistence backend
//! reports about a remote call; [`WizardError`] is what an editing session
//! reports at an action boundary (next, previous, save, finish, publish).
//! Local validation failures are `WizardError`s and never reach a gateway.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{PlanId, StepId};
use crate::validate::FieldIssue;

/// Failure reported by a [`crate::gateway::PlanGateway`].
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The submitted slice failed the server-side schema
    #[error("Validation failed for field '{field}': {reason}")]
    Validation { field: String, reason: String },
    /// A plan already exists for the caller in a state that forbids the call
    #[error("Conflict: {message}")]
    Conflict { message: String },
    /// Unknown plan id
    #[error("Plan with ID {id} not found")]
    NotFound { id: PlanId },
    /// The caller does not own the plan
    #[error("Plan with ID {id} belongs to another owner")]
    Forbidden { id: PlanId },
    /// The server's own precondition check disagreed with the client
    #[error("Precondition failed: {message}")]
    Precondition { message: String },
    /// Transport-level failure (timeouts, 5xx, dropped connections)
    #[error("Network error: {message}")]
    Network { message: String },
    /// Backing store errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Stored or submitted JSON could not be (de)serialized
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for storage errors with an optional SQLite source.
pub struct StorageErrorBuilder {
    message: String,
}

impl StorageErrorBuilder {
    /// Create a new storage error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> GatewayError {
        GatewayError::Storage {
            message: self.message,
            source: Some(source),
        }
    }

    /// Build the error without an underlying source.
    pub fn build(self) -> GatewayError {
        GatewayError::Storage {
            message: self.message,
            source: None,
        }
    }
}

/// Builder for server-side validation errors.
pub struct ValidationErrorBuilder {
    field: String,
}

impl ValidationErrorBuilder {
    /// Create a new validation error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> GatewayError {
        GatewayError::Validation {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl GatewayError {
    /// Creates a builder for storage errors.
    pub fn storage(message: impl Into<String>) -> StorageErrorBuilder {
        StorageErrorBuilder::new(message)
    }

    /// Creates a builder for validation errors.
    pub fn validation(field: impl Into<String>) -> ValidationErrorBuilder {
        ValidationErrorBuilder::new(field)
    }

    /// Shorthand for a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Shorthand for a precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Shorthand for a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> GatewayResult<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> GatewayResult<T> {
        self.map_err(|e| GatewayError::storage(message).with_source(e))
    }
}

/// Failure reported at an editing-session action boundary.
#[derive(Error, Debug)]
pub enum WizardError {
    /// Local pre-flight validation blocked the action; nothing was sent
    #[error("Step {step} is incomplete: {}", FieldIssue::join(.issues))]
    StepInvalid {
        step: StepId,
        issues: Vec<FieldIssue>,
    },
    /// A change event named a field the step does not own
    #[error("Field '{field}' is not part of step {step}")]
    ForeignField { step: StepId, field: String },
    /// A change event carried a value that does not fit the step's shape
    #[error("Invalid value for step {step}: {source}")]
    MalformedPatch {
        step: StepId,
        #[source]
        source: serde_json::Error,
    },
    /// Steps after the first need a plan identity, which only step 1 creates
    #[error("The plan has not been created yet; save step {} first", StepId::FIRST)]
    PlanNotCreated,
    /// Forward navigation from the last step
    #[error("Step {step} is the last step")]
    NoNextStep { step: StepId },
    /// Backward navigation from the first step
    #[error("Step {step} is the first step")]
    NoPreviousStep { step: StepId },
    /// The same action is already awaiting the gateway
    #[error("'{action}' is already in progress")]
    ActionInProgress { action: String },
    /// Client-side publish gate refused: these steps are not complete
    #[error("Cannot publish: steps not complete: {}", StepId::join(.missing))]
    IncompleteSteps { missing: Vec<StepId> },
    /// Client-side gate passed but the server refused to publish
    #[error("Publish rejected by server: {source}")]
    PublishRejected {
        #[source]
        source: GatewayError,
    },
    /// Edit-mode hydration could not load the plan
    #[error("Cannot open plan {id} for editing: {source}")]
    HydrationFailed {
        id: PlanId,
        #[source]
        source: GatewayError,
    },
    /// Edit-mode hydration found a plan owned by someone else
    #[error("Plan {id} does not belong to the current owner")]
    HydrationForbidden { id: PlanId },
    /// The remote document could not be normalized into a draft
    #[error("Plan document is malformed: {source}")]
    MalformedDocument {
        #[source]
        source: serde_json::Error,
    },
    /// Any other gateway failure; the action can be retried
    #[error(transparent)]
    Remote(#[from] GatewayError),
}

impl WizardError {
    /// Hydration errors end the editing session; everything else is
    /// retryable by repeating the action.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::HydrationFailed { .. }
                | Self::HydrationForbidden { .. }
                | Self::MalformedDocument { .. }
        )
    }

    /// True when the failure happened before any network call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::StepInvalid { .. }
                | Self::ForeignField { .. }
                | Self::MalformedPatch { .. }
                | Self::PlanNotCreated
                | Self::NoNextStep { .. }
                | Self::NoPreviousStep { .. }
                | Self::ActionInProgress { .. }
                | Self::IncompleteSteps { .. }
        )
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, WizardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_invalid_lists_missing_fields() {
        let err = WizardError::StepInvalid {
            step: StepId::Basics,
            issues: vec![FieldIssue::missing("title"), FieldIssue::missing("city")],
        };
        let message = err.to_string();
        assert!(message.contains("Step 1 (Basic details)"));
        assert!(message.contains("title is required"));
        assert!(message.contains("city is required"));
        assert!(err.is_local());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_publish_failures_are_distinguishable() {
        let incomplete = WizardError::IncompleteSteps {
            missing: vec![StepId::Pricing, StepId::Policies],
        };
        assert!(incomplete.to_string().starts_with("Cannot publish"));
        assert!(incomplete.is_local());

        let rejected = WizardError::PublishRejected {
            source: GatewayError::precondition("itinerary incomplete"),
        };
        assert!(rejected.to_string().starts_with("Publish rejected by server"));
        assert!(!rejected.is_local());
    }

    #[test]
    fn test_hydration_errors_are_fatal() {
        let err = WizardError::HydrationForbidden { id: PlanId(4) };
        assert!(err.is_fatal());
        let err = WizardError::HydrationFailed {
            id: PlanId(4),
            source: GatewayError::NotFound { id: PlanId(4) },
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn test_storage_builder() {
        let err = GatewayError::storage("Failed to open").build();
        assert_eq!(err.to_string(), "Storage error: Failed to open");

        let err = GatewayError::validation("title").with_reason("must not be blank");
        assert!(matches!(err, GatewayError::Validation { ref field, .. } if field == "title"));
    }
}
