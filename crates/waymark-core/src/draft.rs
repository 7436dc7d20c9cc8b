//! In-memory draft of the whole plan document.
//!
//! Field renderers report edits as flat [`FieldPatch`] objects. A merge
//! touches only the group of the step the patch targets, and it lands as one
//! replace of that group: either the whole patch applies or nothing changes.

use serde_json::{Map, Value};

use crate::{
    error::{Result, WizardError},
    models::{PlanDocument, StepId, StepSlice},
    schema,
};

/// Flat field-name to value change object.
pub type FieldPatch = Map<String, Value>;

/// Where a change came from. Only user edits are candidates for syncing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Seeded from the remote copy while opening a plan
    Hydration,
    /// Typed by the provider
    UserEdit,
}

/// One change event from the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub step: StepId,
    pub patch: FieldPatch,
    pub origin: Origin,
}

impl FieldChange {
    pub fn user_edit(step: StepId, patch: FieldPatch) -> Self {
        Self {
            step,
            patch,
            origin: Origin::UserEdit,
        }
    }

    pub fn hydration(step: StepId, patch: FieldPatch) -> Self {
        Self {
            step,
            patch,
            origin: Origin::Hydration,
        }
    }

    /// Builds a user edit from a JSON object literal.
    ///
    /// Non-object values produce an empty patch.
    pub fn from_json(step: StepId, value: Value) -> Self {
        let patch = match value {
            Value::Object(fields) => fields,
            _ => FieldPatch::new(),
        };
        Self::user_edit(step, patch)
    }
}

/// The document under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftStore {
    document: PlanDocument,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: PlanDocument) -> Self {
        Self { document }
    }

    /// Seeds a draft from a stored document, normalizing legacy shapes.
    pub fn from_remote(document: &Value) -> Result<Self> {
        if document.is_null() {
            return Ok(Self::new());
        }
        serde_json::from_value(document.clone())
            .map(Self::from_document)
            .map_err(|source| WizardError::MalformedDocument { source })
    }

    /// Current snapshot.
    pub fn get(&self) -> &PlanDocument {
        &self.document
    }

    /// Copy of the group `step` owns.
    pub fn slice(&self, step: StepId) -> StepSlice {
        schema::extract(step, &self.document)
    }

    /// Rejects patches that name fields outside `step`'s group.
    pub fn check_ownership(step: StepId, patch: &FieldPatch) -> Result<()> {
        let definition = schema::definition(step);
        match patch.keys().find(|key| !definition.owns(key)) {
            Some(field) => Err(WizardError::ForeignField {
                step,
                field: field.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Shallow-merges `patch` into `step`'s group.
    ///
    /// # Errors
    ///
    /// `ForeignField` if the patch names a field `step` does not own,
    /// `MalformedPatch` if a value does not fit the field's shape. The draft
    /// is unchanged in both cases.
    pub fn merge(&mut self, step: StepId, patch: &FieldPatch) -> Result<()> {
        Self::check_ownership(step, patch)?;
        let malformed = |source| WizardError::MalformedPatch { step, source };

        let mut fields = self.slice(step).to_fields().map_err(malformed)?;
        for (key, value) in patch {
            fields.insert(key.clone(), value.clone());
        }
        let updated = StepSlice::from_value(step, Value::Object(fields)).map_err(malformed)?;
        self.document.replace(updated);
        Ok(())
    }

    /// Replaces a whole group.
    pub fn replace(&mut self, slice: StepSlice) {
        self.document.replace(slice);
    }
}
