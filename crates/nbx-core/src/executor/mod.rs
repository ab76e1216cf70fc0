//! Executor: applies a compiled plan to the host.
//!
//! Each step is checked first and only applied when out of date, so applying
//! the same plan twice changes nothing the second time. A failed step stops
//! every step that requires it (directly or transitively); independent steps
//! still run.

mod actions;
mod report;

pub use report::{ApplyReport, Outcome, RunOutcome, StepReport};

use crate::config::NbxConfig;
use crate::download::DownloadOptions;
use crate::host::Host;
use crate::plan::{Plan, ResourceId, Step};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Run-wide settings for the executor.
#[derive(Debug, Clone, Default)]
pub struct ExecutorOptions {
    /// Report what would change without touching the host.
    pub noop: bool,
    pub download: DownloadOptions,
    /// Appended to every `pip install`.
    pub pip_extra_args: Vec<String>,
}

impl ExecutorOptions {
    pub fn from_config(cfg: &NbxConfig, noop: bool) -> Self {
        Self {
            noop,
            download: DownloadOptions::from_config(cfg),
            pip_extra_args: cfg.pip_extra_args.clone(),
        }
    }
}

pub struct Executor<'h, H: Host + ?Sized> {
    host: &'h H,
    opts: ExecutorOptions,
}

impl<'h, H: Host + ?Sized> Executor<'h, H> {
    pub fn new(host: &'h H, opts: ExecutorOptions) -> Self {
        Self { host, opts }
    }

    /// Apply every step in plan order and report per-resource outcomes.
    pub fn apply(&self, plan: &Plan) -> ApplyReport {
        let mut report = ApplyReport {
            noop: self.opts.noop,
            steps: Vec::with_capacity(plan.len()),
        };
        // Resource -> the failed resource that blocks it.
        let mut blocked: HashMap<&ResourceId, ResourceId> = HashMap::new();
        let mut pending: HashSet<&ResourceId> = HashSet::new();

        for step in plan.steps() {
            let started = Instant::now();
            let blocker = step.requires.iter().find_map(|r| blocked.get(r).cloned());

            let outcome = if let Some(failed) = blocker {
                Outcome::Skipped { failed }
            } else if self.opts.noop && step.requires.iter().any(|r| pending.contains(r)) {
                // Prerequisites are not in place yet, so the check would be meaningless.
                Outcome::WouldChange
            } else {
                self.converge(step)
            };

            match &outcome {
                Outcome::Failed { message } => {
                    tracing::error!(resource = %step.id, "failed: {}", message);
                    blocked.insert(&step.id, step.id.clone());
                }
                Outcome::Skipped { failed } => {
                    tracing::warn!(resource = %step.id, "skipped because {} failed", failed);
                    blocked.insert(&step.id, failed.clone());
                }
                Outcome::WouldChange => {
                    tracing::info!(resource = %step.id, "would change: {}", step.action);
                    pending.insert(&step.id);
                }
                Outcome::Changed => tracing::info!(resource = %step.id, "changed: {}", step.action),
                Outcome::Unchanged => tracing::debug!(resource = %step.id, "unchanged"),
            }

            report.steps.push(StepReport {
                id: step.id.clone(),
                outcome,
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
        }
        report
    }

    fn converge(&self, step: &Step) -> Outcome {
        let converged = match self.is_converged(&step.action) {
            Ok(c) => c,
            Err(e) => {
                return Outcome::Failed {
                    message: format!("check: {:#}", e),
                }
            }
        };
        if converged {
            return Outcome::Unchanged;
        }
        if self.opts.noop {
            return Outcome::WouldChange;
        }
        match self.enforce(&step.action) {
            Ok(()) => Outcome::Changed,
            Err(e) => Outcome::Failed {
                message: format!("{:#}", e),
            },
        }
    }
}
