//! CLI for nbx, the NetBox install planner.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use nbx_core::config;
use nbx_core::run_db::RunDb;
use std::path::PathBuf;

use commands::{run_apply, run_checksum, run_facts, run_history, run_plan, run_supported};

/// Top-level CLI for nbx.
#[derive(Debug, Parser)]
#[command(name = "nbx")]
#[command(about = "nbx: compile and converge NetBox installations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Compile an install request and print the plan without changing anything.
    Plan {
        /// Path to the install request (TOML).
        request: PathBuf,
        /// Compile for this fact set (e.g. debian-11-x86_64) instead of this host.
        #[arg(long = "os", value_name = "LABEL")]
        os: Option<String>,
    },

    /// Converge this host toward an install request.
    Apply {
        /// Path to the install request (TOML).
        request: PathBuf,
        /// Report what would change without changing it.
        #[arg(long)]
        noop: bool,
    },

    /// Show the OS facts gathered from this host.
    Facts,

    /// List the supported OS fact sets.
    Supported,

    /// Compute the digest of a file (e.g. a release tarball).
    Checksum {
        /// Path to the file.
        path: PathBuf,
        /// Digest algorithm: sha224, sha256, sha384 or sha512.
        #[arg(long = "type", default_value = "sha256", value_name = "TYPE")]
        kind: String,
    },

    /// List recorded apply runs, or show one run by ID.
    History {
        /// Run identifier.
        id: Option<i64>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Plan { request, os } => run_plan(&request, os.as_deref()).await?,
            CliCommand::Apply { request, noop } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_apply(&cfg, &request, noop).await?;
            }
            CliCommand::Facts => run_facts().await?,
            CliCommand::Supported => run_supported().await?,
            CliCommand::Checksum { path, kind } => run_checksum(&path, &kind).await?,
            CliCommand::History { id } => {
                let db = RunDb::open_default().await?;
                run_history(&db, id).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
