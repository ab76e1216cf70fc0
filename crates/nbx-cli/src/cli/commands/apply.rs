//! `nbx apply` – converge this host toward a request and record the run.

use anyhow::Result;
use nbx_core::config::NbxConfig;
use nbx_core::executor::{ApplyReport, Executor, ExecutorOptions};
use nbx_core::host::SystemHost;
use nbx_core::run_db::{unix_timestamp, NewRun, RunDb};
use std::path::Path;

use super::load_and_compile;

fn print_report(report: &ApplyReport) {
    for step in &report.steps {
        println!("{:<60} {} ({} ms)", step.id.to_string(), step.outcome, step.elapsed_ms);
    }
    println!(
        "{}: {} changed, {} failed",
        report.run_outcome().as_str(),
        report.changed_count(),
        report.failed().len()
    );
}

pub async fn run_apply(cfg: &NbxConfig, request_path: &Path, noop: bool) -> Result<()> {
    let (request, facts, plan) = load_and_compile(request_path, None)?;
    let os_label = facts.label();
    let opts = ExecutorOptions::from_config(cfg, noop);
    tracing::info!(
        os = %os_label,
        noop,
        "applying netbox {} ({} steps)",
        request.version,
        plan.len()
    );

    let started_at = unix_timestamp();
    // Executor shells out and blocks on curl; keep it off the async workers.
    let report = tokio::task::spawn_blocking(move || {
        let host = SystemHost::new();
        Executor::new(&host, opts).apply(&plan)
    })
    .await?;

    print_report(&report);

    let db = RunDb::open_default().await?;
    let id = db
        .record_run(&NewRun {
            version: &request.version,
            os_label: &os_label,
            started_at,
            report: &report,
        })
        .await?;
    tracing::info!(run = id, outcome = report.run_outcome().as_str(), "run recorded");

    if !report.is_success() {
        anyhow::bail!(
            "apply failed: {} resource(s) failed (run {})",
            report.failed().len(),
            id
        );
    }
    Ok(())
}
