//! Per-resource outcomes of one apply.

use crate::plan::ResourceId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Already in the desired state.
    Unchanged,
    /// Changed to reach the desired state.
    Changed,
    /// Out of date; not touched because the run is a no-op run.
    WouldChange,
    Failed { message: String },
    /// Not attempted because a required resource failed.
    Skipped { failed: ResourceId },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Unchanged => f.write_str("unchanged"),
            Outcome::Changed => f.write_str("changed"),
            Outcome::WouldChange => f.write_str("would change"),
            Outcome::Failed { message } => write!(f, "FAILED: {}", message),
            Outcome::Skipped { failed } => write!(f, "skipped (depends on failed {})", failed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub id: ResourceId,
    pub outcome: Outcome,
    pub elapsed_ms: u64,
}

/// Overall result of a run, as stored in the run history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Nothing needed changing.
    Converged,
    Changed,
    Failed,
    /// No-op run; see the report for pending changes.
    Noop,
}

impl RunOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RunOutcome::Converged => "converged",
            RunOutcome::Changed => "changed",
            RunOutcome::Failed => "failed",
            RunOutcome::Noop => "noop",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "converged" => RunOutcome::Converged,
            "changed" => RunOutcome::Changed,
            "noop" => RunOutcome::Noop,
            _ => RunOutcome::Failed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub noop: bool,
    pub steps: Vec<StepReport>,
}

impl ApplyReport {
    pub fn outcome_of(&self, id: &ResourceId) -> Option<&Outcome> {
        self.steps.iter().find(|s| &s.id == id).map(|s| &s.outcome)
    }

    pub fn changed_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, Outcome::Changed | Outcome::WouldChange))
            .count()
    }

    /// Resources whose own action failed (skipped dependents are not included).
    pub fn failed(&self) -> Vec<&ResourceId> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, Outcome::Failed { .. }))
            .map(|s| &s.id)
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.steps
            .iter()
            .all(|s| !matches!(s.outcome, Outcome::Failed { .. } | Outcome::Skipped { .. }))
    }

    pub fn run_outcome(&self) -> RunOutcome {
        if !self.is_success() {
            RunOutcome::Failed
        } else if self.noop {
            RunOutcome::Noop
        } else if self.changed_count() > 0 {
            RunOutcome::Changed
        } else {
            RunOutcome::Converged
        }
    }
}
