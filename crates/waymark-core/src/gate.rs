//! Per-step completion flags and the publish gate.
//!
//! Completion is a persistence fact: the slice was saved successfully and was
//! valid when it was saved. It is not a live validity guarantee, so callers
//! still re-validate before navigating.

use std::collections::BTreeSet;

use crate::models::{PlanStatus, StepId};

#[derive(Debug, Clone, Default)]
pub struct CompletionGate {
    completed: BTreeSet<StepId>,
}

impl CompletionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_completed(&mut self, step: StepId) {
        self.completed.insert(step);
    }

    pub fn mark_incomplete(&mut self, step: StepId) {
        self.completed.remove(&step);
    }

    /// Records the outcome of a save attempt.
    pub fn set(&mut self, step: StepId, completed: bool) {
        if completed {
            self.mark_completed(step);
        } else {
            self.mark_incomplete(step);
        }
    }

    pub fn is_completed(&self, step: StepId) -> bool {
        self.completed.contains(&step)
    }

    pub fn is_all_complete(&self) -> bool {
        StepId::ALL.iter().all(|step| self.completed.contains(step))
    }

    /// Steps still missing their flag, in wizard order.
    pub fn incomplete_steps(&self) -> Vec<StepId> {
        StepId::ALL
            .into_iter()
            .filter(|step| !self.completed.contains(step))
            .collect()
    }

    pub fn can_publish(&self, remote_status: PlanStatus) -> bool {
        self.is_all_complete() && remote_status != PlanStatus::Published
    }
}
