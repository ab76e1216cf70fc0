//! Run write and read operations.

use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::db::{unix_timestamp, RunDb};
use super::types::{NewRun, RunDetails, RunId, RunSummary};
use crate::executor::RunOutcome;

fn summary_from_row(row: &SqliteRow) -> Result<RunSummary> {
    let outcome: String = row.get("outcome");
    let failed_json: String = row.get("failed_json");
    Ok(RunSummary {
        id: row.get("id"),
        version: row.get("version"),
        os_label: row.get("os_label"),
        started_at: row.get("started_at"),
        finished_at: row.get("finished_at"),
        outcome: RunOutcome::from_str(&outcome),
        changed: row.get("changed"),
        failed: serde_json::from_str(&failed_json).context("decode failed_json")?,
    })
}

impl RunDb {
    /// Store a finished run; `finished_at` is now.
    pub async fn record_run(&self, run: &NewRun<'_>) -> Result<RunId> {
        let failed: Vec<String> = run.report.failed().iter().map(ToString::to_string).collect();
        let failed_json = serde_json::to_string(&failed)?;
        let report_json = serde_json::to_string(run.report)?;
        let res = sqlx::query(
            r#"
            INSERT INTO runs (version, os_label, started_at, finished_at, outcome, changed, failed_json, report_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(run.version)
        .bind(run.os_label)
        .bind(run.started_at)
        .bind(unix_timestamp())
        .bind(run.report.run_outcome().as_str())
        .bind(run.report.changed_count() as i64)
        .bind(failed_json)
        .bind(report_json)
        .execute(&self.pool)
        .await?;
        let id = res.last_insert_rowid();
        tracing::debug!(run = id, "recorded run");
        Ok(id)
    }

    /// All runs, newest first.
    pub async fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, version, os_label, started_at, finished_at, outcome, changed, failed_json
            FROM runs
            ORDER BY started_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(summary_from_row).collect()
    }

    pub async fn get_run(&self, id: RunId) -> Result<Option<RunDetails>> {
        let row = sqlx::query(
            r#"
            SELECT id, version, os_label, started_at, finished_at, outcome, changed, failed_json, report_json
            FROM runs
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let report_json: String = row.get("report_json");
        Ok(Some(RunDetails {
            summary: summary_from_row(&row)?,
            report: serde_json::from_str(&report_json).context("decode report_json")?,
        }))
    }
}
