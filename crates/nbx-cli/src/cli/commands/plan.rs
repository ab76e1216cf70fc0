//! `nbx plan` – compile a request and print the plan without touching the host.

use anyhow::{Context, Result};
use nbx_core::facts::OsFacts;
use nbx_core::plan::{self, Plan};
use nbx_core::request::InstallRequest;
use std::path::Path;

/// Facts for `label`, or gathered from this machine when none is given.
fn facts_for(label: Option<&str>) -> Result<OsFacts> {
    match label {
        Some(label) => OsFacts::from_label(label),
        None => OsFacts::gather(),
    }
}

/// Read `request_path` and compile it for the given or gathered OS.
pub fn load_and_compile(
    request_path: &Path,
    os_label: Option<&str>,
) -> Result<(InstallRequest, OsFacts, Plan)> {
    let request = InstallRequest::load(request_path)?;
    let facts = facts_for(os_label)?;
    let plan = plan::compile(&request, &facts)
        .with_context(|| format!("compile {} for {}", request_path.display(), facts.label()))?;
    Ok((request, facts, plan))
}

pub async fn run_plan(request_path: &Path, os_label: Option<&str>) -> Result<()> {
    let (request, facts, plan) = load_and_compile(request_path, os_label)?;
    println!(
        "netbox {} on {}: {} steps",
        request.version,
        facts.label(),
        plan.len()
    );
    print!("{}", plan);
    Ok(())
}
