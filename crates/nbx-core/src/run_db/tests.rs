//! Tests for run_db (use in-memory DB helper from db).

use crate::executor::{ApplyReport, Outcome, RunOutcome, StepReport};
use crate::plan::{ResourceId, ResourceKind};
use crate::run_db::db::open_memory;
use crate::run_db::{NewRun, RunDb};

fn step(kind: ResourceKind, title: &str, outcome: Outcome) -> StepReport {
    StepReport {
        id: ResourceId::new(kind, title),
        outcome,
        elapsed_ms: 1,
    }
}

fn failed_report() -> ApplyReport {
    let archive = ResourceId::new(ResourceKind::Archive, "/tmp/netbox-1.0.0.tar.gz");
    ApplyReport {
        noop: false,
        steps: vec![
            step(ResourceKind::Directory, "/opt", Outcome::Changed),
            step(
                ResourceKind::Archive,
                "/tmp/netbox-1.0.0.tar.gz",
                Outcome::Failed {
                    message: "checksum mismatch".into(),
                },
            ),
            step(
                ResourceKind::Extract,
                "/opt/netbox-1.0.0",
                Outcome::Skipped { failed: archive },
            ),
        ],
    }
}

async fn record(db: &RunDb, version: &str, started_at: i64, report: &ApplyReport) -> i64 {
    db.record_run(&NewRun {
        version,
        os_label: "debian-11-x86_64",
        started_at,
        report,
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn record_and_get_run() {
    let db = open_memory().await.unwrap();
    let report = failed_report();
    let id = record(&db, "1.0.0", 100, &report).await;

    let run = db.get_run(id).await.unwrap().unwrap();
    assert_eq!(run.summary.version, "1.0.0");
    assert_eq!(run.summary.os_label, "debian-11-x86_64");
    assert_eq!(run.summary.outcome, RunOutcome::Failed);
    assert_eq!(run.summary.changed, 1);
    assert_eq!(
        run.summary.failed,
        vec!["Archive[/tmp/netbox-1.0.0.tar.gz]".to_string()]
    );
    assert!(run.summary.finished_at >= run.summary.started_at);
    assert_eq!(run.report, report);
}

#[tokio::test]
async fn list_runs_newest_first() {
    let db = open_memory().await.unwrap();
    assert!(db.list_runs().await.unwrap().is_empty());

    let converged = ApplyReport {
        noop: false,
        steps: vec![step(ResourceKind::Directory, "/opt", Outcome::Unchanged)],
    };
    let first = record(&db, "1.0.0", 100, &converged).await;
    let second = record(&db, "1.0.1", 200, &converged).await;

    let runs = db.list_runs().await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].id, second);
    assert_eq!(runs[0].version, "1.0.1");
    assert_eq!(runs[1].id, first);
    assert_eq!(runs[1].outcome, RunOutcome::Converged);
    assert!(runs[1].failed.is_empty());
}

#[tokio::test]
async fn get_missing_run_is_none() {
    let db = open_memory().await.unwrap();
    assert!(db.get_run(42).await.unwrap().is_none());
}

#[tokio::test]
async fn open_at_creates_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("state dir/runs.db");
    let db = RunDb::open_at(&path).await.unwrap();
    let report = ApplyReport {
        noop: true,
        steps: vec![step(ResourceKind::Group, "netbox", Outcome::WouldChange)],
    };
    record(&db, "1.0.0", 1, &report).await;
    assert!(path.exists());

    let reopened = RunDb::open_at(&path).await.unwrap();
    let runs = reopened.list_runs().await.unwrap();
    assert_eq!(runs[0].outcome, RunOutcome::Noop);
}
