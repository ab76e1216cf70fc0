//! Side-effect seam between the executor and the managed machine.
//!
//! Everything that needs privileges or OS account databases goes through
//! [`Host`]: running package managers and pip, account lookup and creation
//! checks, and ownership changes. Plain file and directory work is done by
//! the executor directly.

#[cfg(unix)]
mod system;

#[cfg(unix)]
pub use system::SystemHost;

use anyhow::Result;
use std::fmt;
use std::path::Path;

/// An external command to run on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Run with this account's uid/gid instead of the caller's.
    pub run_as: Option<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            run_as: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn run_as(mut self, user: impl Into<String>) -> Self {
        self.run_as = Some(user.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for a in &self.args {
            write!(f, " {}", a)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into an error carrying the command and its stderr.
    pub fn check(self, cmd: &CommandSpec) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        let code = self
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        anyhow::bail!("`{}` exited with {}: {}", cmd, code, self.stderr.trim())
    }
}

/// Privileged operations on the managed machine.
pub trait Host {
    /// Run a command to completion, capturing output. A non-zero exit is not an error here.
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput>;

    fn user_exists(&self, name: &str) -> Result<bool>;

    fn group_exists(&self, name: &str) -> Result<bool>;

    /// Resolve an account and group to numeric ids.
    fn resolve_owner(&self, user: &str, group: &str) -> Result<(u32, u32)>;

    /// Current uid/gid of a single entry without following symlinks.
    fn owner_of(&self, path: &Path) -> Result<(u32, u32)>;

    /// Change ownership of a single entry without following symlinks.
    fn chown(&self, path: &Path, uid: u32, gid: u32) -> Result<()>;
}
