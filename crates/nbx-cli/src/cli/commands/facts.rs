//! `nbx facts` – show what this host looks like to the planner.

use anyhow::Result;
use nbx_core::facts::{OsFacts, PlatformProfile};

pub async fn run_facts() -> Result<()> {
    let facts = OsFacts::gather()?;
    println!("label:        {}", facts.label());
    println!("family:       {}", facts.family);
    println!("name:         {}", facts.name);
    println!("release:      {}", facts.release_major);
    println!("architecture: {}", facts.architecture);
    match PlatformProfile::for_facts(&facts) {
        Ok(profile) => {
            println!("supported:    yes");
            println!("packages:     {:?}", profile.package_manager);
            println!("python:       {}", profile.python.display());
        }
        Err(e) => println!("supported:    no ({})", e),
    }
    Ok(())
}
