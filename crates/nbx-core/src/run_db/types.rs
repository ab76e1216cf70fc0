//! Types stored in and read back from the run history.

use crate::executor::{ApplyReport, RunOutcome};

/// Run identifier.
pub type RunId = i64;

/// What gets recorded for one finished apply.
#[derive(Debug, Clone)]
pub struct NewRun<'a> {
    pub version: &'a str,
    pub os_label: &'a str,
    /// Unix seconds when the apply started.
    pub started_at: i64,
    pub report: &'a ApplyReport,
}

/// Row view used by `nbx history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub id: RunId,
    pub version: String,
    pub os_label: String,
    pub started_at: i64,
    pub finished_at: i64,
    pub outcome: RunOutcome,
    pub changed: i64,
    /// Resources whose own action failed, rendered as `Kind[title]`.
    pub failed: Vec<String>,
}

/// Full run record including the per-resource report.
#[derive(Debug, Clone)]
pub struct RunDetails {
    pub summary: RunSummary,
    pub report: ApplyReport,
}
