//! In-memory [`Host`] for integration tests.
//!
//! Tracks packages, accounts and pip packages in memory. `python -m venv`
//! creates the interpreter and pip files so later steps see a real venv.
//! Ownership changes are kept in an overlay; by default accounts resolve to
//! the test process's own uid/gid.

use anyhow::Result;
use nbx_core::host::{CommandOutput, CommandSpec, Host};
use std::collections::{HashMap, HashSet};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeHost {
    packages: Mutex<HashSet<String>>,
    groups: Mutex<HashSet<String>>,
    users: Mutex<HashSet<String>>,
    pip: Mutex<HashSet<String>>,
    commands: Mutex<Vec<String>>,
    /// Ids every account resolves to; `None` means this process's ids.
    owner: Option<(u32, u32)>,
    chowned: Mutex<HashMap<PathBuf, (u32, u32)>>,
}

fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

fn fail(stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(1),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host whose accounts resolve to `uid:gid` rather than this process.
    pub fn with_owner(uid: u32, gid: u32) -> Self {
        Self {
            owner: Some((uid, gid)),
            ..Self::default()
        }
    }

    fn account_ids(&self) -> (u32, u32) {
        self.owner.unwrap_or_else(current_ids)
    }

    fn set_owner(&self, path: &Path, ids: (u32, u32)) {
        self.chowned.lock().unwrap().insert(overlay_key(path), ids);
    }

    /// Every command run so far, rendered as `program args...`.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn clear_commands(&self) {
        self.commands.lock().unwrap().clear();
    }

    pub fn pip_installed(&self, name: &str) -> bool {
        self.pip.lock().unwrap().contains(name)
    }

    fn last_arg(cmd: &CommandSpec) -> String {
        cmd.args.last().cloned().unwrap_or_default()
    }
}

impl Host for FakeHost {
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        self.commands.lock().unwrap().push(cmd.to_string());
        let program = cmd.program.as_str();
        let out = match program {
            "rpm" | "dpkg-query" => {
                if self.packages.lock().unwrap().contains(&Self::last_arg(cmd)) {
                    ok("install ok installed")
                } else {
                    fail("not installed")
                }
            }
            "yum" | "dnf" | "apt-get" => {
                let mut packages = self.packages.lock().unwrap();
                for arg in cmd.args.iter().skip(1).filter(|a| !a.starts_with('-')) {
                    packages.insert(arg.clone());
                }
                ok("")
            }
            "groupadd" => {
                self.groups.lock().unwrap().insert(Self::last_arg(cmd));
                ok("")
            }
            "useradd" => {
                self.users.lock().unwrap().insert(Self::last_arg(cmd));
                ok("")
            }
            p if p.ends_with("/pip") => match cmd.args.first().map(String::as_str) {
                Some("show") => {
                    if self.pip_installed(&Self::last_arg(cmd)) {
                        ok("")
                    } else {
                        fail("WARNING: Package(s) not found")
                    }
                }
                Some("install") if cmd.args.iter().any(|a| a == "-r") => ok(""),
                Some("install") => {
                    self.pip.lock().unwrap().insert(Self::last_arg(cmd));
                    ok("")
                }
                _ => fail("unsupported pip command"),
            },
            p if p.contains("python") && cmd.args.first().map(String::as_str) == Some("-m") => {
                let venv = Path::new(cmd.args.last().map(String::as_str).unwrap_or(""));
                let bin = venv.join("bin");
                std::fs::create_dir_all(&bin)?;
                std::fs::write(bin.join("python"), b"")?;
                std::fs::write(bin.join("pip"), b"")?;
                // Files made by the run-as account belong to it.
                if cmd.run_as.is_some() {
                    let ids = self.account_ids();
                    for p in [venv.to_path_buf(), bin.clone(), bin.join("python"), bin.join("pip")] {
                        self.set_owner(&p, ids);
                    }
                }
                ok("")
            }
            _ => fail("command not found"),
        };
        Ok(out)
    }

    fn user_exists(&self, name: &str) -> Result<bool> {
        Ok(self.users.lock().unwrap().contains(name))
    }

    fn group_exists(&self, name: &str) -> Result<bool> {
        Ok(self.groups.lock().unwrap().contains(name))
    }

    fn resolve_owner(&self, _user: &str, _group: &str) -> Result<(u32, u32)> {
        Ok(self.account_ids())
    }

    fn owner_of(&self, path: &Path) -> Result<(u32, u32)> {
        if let Some(ids) = self.chowned.lock().unwrap().get(&overlay_key(path)) {
            return Ok(*ids);
        }
        let meta = path.symlink_metadata()?;
        Ok((meta.uid(), meta.gid()))
    }

    fn chown(&self, path: &Path, uid: u32, gid: u32) -> Result<()> {
        self.commands
            .lock()
            .unwrap()
            .push(format!("chown {}", path.display()));
        self.set_owner(path, (uid, gid));
        Ok(())
    }
}

/// uid/gid of a fresh file created by this process.
fn current_ids() -> (u32, u32) {
    let scratch = tempfile::NamedTempFile::new().unwrap();
    let meta = scratch.as_file().metadata().unwrap();
    (meta.uid(), meta.gid())
}

/// Same entry reached through the current symlink or the versioned dir maps
/// to one key. The last component is not resolved.
fn overlay_key(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => std::fs::canonicalize(parent)
            .unwrap_or_else(|_| parent.to_path_buf())
            .join(name),
        _ => path.to_path_buf(),
    }
}
