//! Real host: std::process for commands, libc for the account databases.

use super::{CommandOutput, CommandSpec, Host};
use anyhow::{Context, Result};
use std::ffi::CString;
use std::path::Path;
use std::os::unix::fs::MetadataExt;
use std::os::unix::process::CommandExt;
use std::process::Command;

/// The machine this process runs on.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        SystemHost
    }
}

fn c_name(name: &str) -> Result<CString> {
    CString::new(name).with_context(|| format!("account name {:?} contains NUL", name))
}

/// Look up (uid, primary gid) for a user. `None` if the account does not exist.
fn lookup_user(name: &str) -> Result<Option<(u32, u32)>> {
    let c = c_name(name)?;
    // getpwnam returns a pointer into static storage; copy the ids out immediately.
    let pw = unsafe { libc::getpwnam(c.as_ptr()) };
    if pw.is_null() {
        return Ok(None);
    }
    let (uid, gid) = unsafe { ((*pw).pw_uid, (*pw).pw_gid) };
    Ok(Some((uid, gid)))
}

fn lookup_group(name: &str) -> Result<Option<u32>> {
    let c = c_name(name)?;
    let gr = unsafe { libc::getgrnam(c.as_ptr()) };
    if gr.is_null() {
        return Ok(None);
    }
    Ok(Some(unsafe { (*gr).gr_gid }))
}

impl Host for SystemHost {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(user) = &spec.run_as {
            let (uid, gid) = lookup_user(user)?
                .with_context(|| format!("user {} does not exist", user))?;
            // Only drop privileges when we are not already that user.
            if unsafe { libc::geteuid() } != uid {
                cmd.gid(gid).uid(uid);
            }
        }

        tracing::debug!(command = %spec, "running");
        let out = cmd
            .output()
            .with_context(|| format!("failed to start `{}`", spec))?;
        Ok(CommandOutput {
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }

    fn user_exists(&self, name: &str) -> Result<bool> {
        Ok(lookup_user(name)?.is_some())
    }

    fn group_exists(&self, name: &str) -> Result<bool> {
        Ok(lookup_group(name)?.is_some())
    }

    fn resolve_owner(&self, user: &str, group: &str) -> Result<(u32, u32)> {
        let (uid, _) = lookup_user(user)?.with_context(|| format!("unknown user {}", user))?;
        let gid = lookup_group(group)?.with_context(|| format!("unknown group {}", group))?;
        Ok((uid, gid))
    }

    fn owner_of(&self, path: &Path) -> Result<(u32, u32)> {
        let meta = path
            .symlink_metadata()
            .with_context(|| format!("stat {}", path.display()))?;
        Ok((meta.uid(), meta.gid()))
    }

    fn chown(&self, path: &Path, uid: u32, gid: u32) -> Result<()> {
        std::os::unix::fs::lchown(path, Some(uid), Some(gid))
            .with_context(|| format!("chown {}:{} {}", uid, gid, path.display()))
    }
}
