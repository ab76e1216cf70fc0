//! `nbx history` – list recorded runs, or show one run in detail.

use anyhow::Result;
use nbx_core::run_db::{RunDb, RunId};

pub async fn run_history(db: &RunDb, id: Option<RunId>) -> Result<()> {
    if let Some(id) = id {
        let Some(run) = db.get_run(id).await? else {
            anyhow::bail!("no run with id {}", id);
        };
        let s = &run.summary;
        println!(
            "run {}: netbox {} on {} ({}), started {} finished {}",
            s.id,
            s.version,
            s.os_label,
            s.outcome.as_str(),
            s.started_at,
            s.finished_at
        );
        for step in &run.report.steps {
            println!("  {:<60} {}", step.id.to_string(), step.outcome);
        }
        return Ok(());
    }

    let runs = db.list_runs().await?;
    if runs.is_empty() {
        println!("No runs recorded.");
        return Ok(());
    }
    println!(
        "{:<6} {:<10} {:<22} {:<10} {:<8} {}",
        "ID", "VERSION", "OS", "OUTCOME", "CHANGED", "FAILED"
    );
    for r in runs {
        let failed = if r.failed.is_empty() {
            "-".to_string()
        } else {
            r.failed.join(", ")
        };
        println!(
            "{:<6} {:<10} {:<22} {:<10} {:<8} {}",
            r.id,
            r.version,
            r.os_label,
            r.outcome.as_str(),
            r.changed,
            failed
        );
    }
    Ok(())
}
