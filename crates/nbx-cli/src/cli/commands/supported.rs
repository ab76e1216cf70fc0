//! `nbx supported` – list the fact sets plans can be compiled for.

use anyhow::Result;
use nbx_core::facts::{supported_os, PlatformProfile};

pub async fn run_supported() -> Result<()> {
    println!("{:<22} {:<8} {}", "LABEL", "PACKAGES", "PYTHON");
    for facts in supported_os() {
        let profile = PlatformProfile::for_facts(&facts)?;
        println!(
            "{:<22} {:<8} {}",
            facts.label(),
            format!("{:?}", profile.package_manager).to_lowercase(),
            profile.python.display()
        );
    }
    Ok(())
}
