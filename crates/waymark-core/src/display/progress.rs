//! Per-step completion summary for an editing session.

use std::fmt;

use crate::{
    models::{PlanId, PlanStatus, StepId},
    sync::SyncState,
    validate,
};

/// Where one step stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepProgress {
    pub step: StepId,
    /// Saved successfully while valid
    pub completed: bool,
    /// Valid against the current draft
    pub valid: bool,
    /// Differs from the last saved value
    pub changed: bool,
}

impl StepProgress {
    /// Status marker for lists.
    pub fn with_icon(&self) -> &'static str {
        match (self.completed, self.valid) {
            (true, true) => "✓ Complete",
            (_, true) => "➤ Ready",
            (_, false) => "○ Incomplete",
        }
    }
}

/// Snapshot of a session's progress through the steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub cursor: StepId,
    pub identity: Option<PlanId>,
    pub status: Option<PlanStatus>,
    pub steps: Vec<StepProgress>,
    pub can_publish: bool,
}

impl Progress {
    pub fn from_state(state: &SyncState, cursor: StepId) -> Self {
        let document = state.draft.get();
        let steps = StepId::ALL
            .into_iter()
            .map(|step| StepProgress {
                step,
                completed: state.gate.is_completed(step),
                valid: validate::is_valid(step, document),
                changed: state.tracker.has_changed(step, document),
            })
            .collect();

        Self {
            cursor,
            identity: state.remote.id(),
            status: state.remote.status(),
            steps,
            can_publish: state.can_publish(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.steps.iter().filter(|step| step.completed).count()
    }

    /// Step list followed by the publish readiness line.
    pub(crate) fn fmt_steps(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "- {} {}", step.step, step.with_icon())?;
            if step.changed && self.identity.is_some() {
                write!(f, " (unsaved changes)")?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        if self.status == Some(PlanStatus::Published) {
            writeln!(f, "Published.")
        } else if self.can_publish {
            writeln!(f, "Ready to publish.")
        } else {
            writeln!(f, "Not ready to publish.")
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.identity, self.status) {
            (Some(id), Some(status)) => writeln!(f, "# Plan {id} ({status})")?,
            _ => writeln!(f, "# New plan (not saved)")?,
        }
        writeln!(f)?;
        writeln!(
            f,
            "On step {}, {} of {} steps complete.",
            self.cursor,
            self.completed_count(),
            self.steps.len()
        )?;
        writeln!(f)?;
        self.fmt_steps(f)
    }
}
