//! Stored plan overview.

use std::fmt;

use super::{datetime::LocalDateTime, progress::Progress};
use crate::models::RemotePlan;

/// Metadata of a stored plan followed by its step progress.
pub struct PlanOverview<'a> {
    pub plan: &'a RemotePlan,
    pub progress: &'a Progress,
}

impl<'a> PlanOverview<'a> {
    pub fn new(plan: &'a RemotePlan, progress: &'a Progress) -> Self {
        Self { plan, progress }
    }
}

impl fmt::Display for PlanOverview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.plan;
        let title = plan
            .document
            .pointer("/basics/title")
            .and_then(|title| title.as_str())
            .unwrap_or("Untitled");

        writeln!(f, "# {}. {title}", plan.id)?;
        writeln!(f)?;
        writeln!(f, "- Status: {}", plan.status)?;
        if let Some(resume_at) = plan.resume_at {
            writeln!(f, "- Resumes: {resume_at}")?;
        }
        writeln!(f, "- Owner: {}", plan.owner)?;
        writeln!(f, "- Created: {}", LocalDateTime(&plan.created_at))?;
        writeln!(f, "- Updated: {}", LocalDateTime(&plan.updated_at))?;
        writeln!(f, "\n## Steps")?;
        writeln!(f)?;
        self.progress.fmt_steps(f)
    }
}
