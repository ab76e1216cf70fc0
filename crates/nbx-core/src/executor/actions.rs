//! Check and enforce logic for each action kind.

use super::Executor;
use crate::checksum::{self, ChecksumType};
use crate::download;
use crate::extract;
use crate::facts::PackageManager;
use crate::host::{CommandSpec, Host};
use crate::plan::{Action, DependencySource};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Stamp written into the venv once requirements are installed.
const REQUIREMENTS_STAMP: &str = ".nbx-requirements";

fn exists_no_follow(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

fn venv_bin(venv: &Path, tool: &str) -> PathBuf {
    venv.join("bin").join(tool)
}

fn requirements_stamp(requirements: &Path, source: &DependencySource) -> Result<String> {
    let digest = checksum::sha256_path(requirements)
        .with_context(|| format!("hash {}", requirements.display()))?;
    Ok(format!("{}  {}\n", digest, source))
}

fn ensure_source_present(source: &DependencySource) -> Result<()> {
    if let DependencySource::Filesystem(path) = source {
        if !path.is_dir() {
            anyhow::bail!("python dependency path {} does not exist", path.display());
        }
    }
    Ok(())
}

/// Visit `root` and everything below it without following symlinks.
fn walk(root: &Path, visit: &mut dyn FnMut(&Path, &std::fs::Metadata) -> Result<()>) -> Result<()> {
    let meta = root
        .symlink_metadata()
        .with_context(|| format!("stat {}", root.display()))?;
    visit(root, &meta)?;
    if meta.is_dir() {
        for entry in std::fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
            walk(&entry?.path(), visit)?;
        }
    }
    Ok(())
}

impl<'h, H: Host + ?Sized> Executor<'h, H> {
    fn missing_packages(&self, manager: PackageManager, packages: &[String]) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        for pkg in packages {
            let out = self.host.run(&manager.query_command(pkg))?;
            if !manager.is_installed(&out) {
                missing.push(pkg.clone());
            }
        }
        Ok(missing)
    }

    fn pip_install(
        &self,
        venv: &Path,
        user: &str,
        source: &DependencySource,
        target: &[String],
    ) -> Result<()> {
        ensure_source_present(source)?;
        let cmd = CommandSpec::new(venv_bin(venv, "pip").display().to_string())
            .arg("install")
            .args(source.pip_args())
            .args(self.opts.pip_extra_args.iter().cloned())
            .args(target.iter().cloned())
            .run_as(user);
        self.host.run(&cmd)?.check(&cmd)?;
        Ok(())
    }

    /// True when the action's desired state already holds.
    pub(super) fn is_converged(&self, action: &Action) -> Result<bool> {
        match action {
            Action::Packages { manager, packages } => {
                Ok(self.missing_packages(*manager, packages)?.is_empty())
            }
            Action::Directory { path } => Ok(path.is_dir()),
            Action::Group { name } => self.host.group_exists(name),
            Action::User { name, .. } => self.host.user_exists(name),
            Action::Download {
                dest,
                checksum_type,
                checksum,
                unless_exists,
                ..
            } => {
                if unless_exists.exists() {
                    return Ok(true);
                }
                if !dest.is_file() {
                    return Ok(false);
                }
                checksum::verify_path(dest, *checksum_type, checksum)
            }
            Action::Extract { creates, .. } => Ok(creates.exists()),
            Action::Owner { path, user, group } => {
                let (uid, gid) = self.host.resolve_owner(user, group)?;
                let mut wrong = 0usize;
                walk(path, &mut |p, _| {
                    if self.host.owner_of(p)? != (uid, gid) {
                        wrong += 1;
                    }
                    Ok(())
                })?;
                Ok(wrong == 0)
            }
            Action::Remove { path } => Ok(!exists_no_follow(path)),
            Action::Symlink { path, target } => match std::fs::read_link(path) {
                Ok(current) => Ok(&current == target),
                Err(_) => Ok(false),
            },
            Action::Venv { path, .. } => Ok(venv_bin(path, "python").exists()),
            Action::Requirements {
                venv,
                requirements,
                source,
                ..
            } => {
                let stamp = venv.join(REQUIREMENTS_STAMP);
                if !stamp.is_file() {
                    return Ok(false);
                }
                let recorded = std::fs::read_to_string(&stamp)
                    .with_context(|| format!("read {}", stamp.display()))?;
                Ok(recorded == requirements_stamp(requirements, source)?)
            }
            Action::PipPackage { venv, name, user, .. } => {
                let cmd = CommandSpec::new(venv_bin(venv, "pip").display().to_string())
                    .args(["show", "--quiet", name.as_str()])
                    .run_as(user.as_str());
                Ok(self.host.run(&cmd)?.success())
            }
        }
    }

    /// Bring the host in line with the action.
    pub(super) fn enforce(&self, action: &Action) -> Result<()> {
        match action {
            Action::Packages { manager, packages } => {
                let missing = self.missing_packages(*manager, packages)?;
                if missing.is_empty() {
                    return Ok(());
                }
                let cmd = manager.install_command(&missing);
                self.host.run(&cmd)?.check(&cmd)?;
                Ok(())
            }
            Action::Directory { path } => {
                if exists_no_follow(path) && !path.is_dir() {
                    anyhow::bail!("{} exists and is not a directory", path.display());
                }
                std::fs::create_dir_all(path)
                    .with_context(|| format!("create {}", path.display()))
            }
            Action::Group { name } => {
                let cmd = CommandSpec::new("groupadd").args(["--system", name.as_str()]);
                self.host.run(&cmd)?.check(&cmd)?;
                Ok(())
            }
            Action::User { name, group, home } => {
                let home = home.display().to_string();
                let cmd = CommandSpec::new("useradd").args([
                    "--system",
                    "--gid",
                    group.as_str(),
                    "--home-dir",
                    home.as_str(),
                    "--no-create-home",
                    "--shell",
                    "/usr/sbin/nologin",
                    name.as_str(),
                ]);
                self.host.run(&cmd)?.check(&cmd)?;
                Ok(())
            }
            Action::Download {
                url,
                dest,
                checksum_type,
                checksum,
                ..
            } => {
                download::download_file(url, dest, &self.opts.download)
                    .with_context(|| format!("download {}", url))?;
                if *checksum_type == ChecksumType::None {
                    return Ok(());
                }
                let actual = checksum::digest_path(dest, *checksum_type)?.unwrap_or_default();
                if !actual.eq_ignore_ascii_case(checksum) {
                    // A tarball that fails verification must never be extracted.
                    std::fs::remove_file(dest)
                        .with_context(|| format!("remove {}", dest.display()))?;
                    anyhow::bail!(
                        "{} checksum mismatch for {}: expected {}, got {}",
                        checksum_type,
                        dest.display(),
                        checksum,
                        actual
                    );
                }
                Ok(())
            }
            Action::Extract {
                archive,
                into,
                creates,
            } => {
                extract::extract_tar_gz(archive, into, Some(creates.as_path()))?;
                Ok(())
            }
            Action::Owner { path, user, group } => {
                let (uid, gid) = self.host.resolve_owner(user, group)?;
                walk(path, &mut |p, _| {
                    if self.host.owner_of(p)? != (uid, gid) {
                        self.host.chown(p, uid, gid)?;
                    }
                    Ok(())
                })
            }
            Action::Remove { path } => std::fs::remove_file(path)
                .with_context(|| format!("remove {}", path.display())),
            Action::Symlink { path, target } => {
                if let Ok(meta) = path.symlink_metadata() {
                    if !meta.file_type().is_symlink() {
                        anyhow::bail!(
                            "{} exists and is not a symlink; refusing to replace it",
                            path.display()
                        );
                    }
                }
                let name = path
                    .file_name()
                    .with_context(|| format!("{} has no file name", path.display()))?;
                let tmp = path.with_file_name(format!(".{}.nbx-tmp", name.to_string_lossy()));
                if exists_no_follow(&tmp) {
                    std::fs::remove_file(&tmp)
                        .with_context(|| format!("remove {}", tmp.display()))?;
                }
                std::os::unix::fs::symlink(target, &tmp)
                    .with_context(|| format!("symlink {}", tmp.display()))?;
                // rename(2) swaps the link in one step.
                std::fs::rename(&tmp, path)
                    .with_context(|| format!("rename {} to {}", tmp.display(), path.display()))
            }
            Action::Venv { path, python, user } => {
                let cmd = CommandSpec::new(python.display().to_string())
                    .args(["-m", "venv"])
                    .arg(path.display().to_string())
                    .run_as(user.as_str());
                self.host.run(&cmd)?.check(&cmd)?;
                Ok(())
            }
            Action::Requirements {
                venv,
                requirements,
                source,
                user,
                group,
            } => {
                let stamp = requirements_stamp(requirements, source)?;
                self.pip_install(
                    venv,
                    user,
                    source,
                    &["-r".to_string(), requirements.display().to_string()],
                )?;
                let mut tmp = tempfile::NamedTempFile::new_in(venv)
                    .with_context(|| format!("create stamp in {}", venv.display()))?;
                tmp.write_all(stamp.as_bytes())?;
                let stamp_path = venv.join(REQUIREMENTS_STAMP);
                tmp.persist(&stamp_path)
                    .map_err(|e| e.error)
                    .context("write requirements stamp")?;
                // The stamp lives inside the owned release tree.
                let (uid, gid) = self.host.resolve_owner(user, group)?;
                self.host.chown(&stamp_path, uid, gid)
                    .with_context(|| format!("chown {}", stamp_path.display()))
            }
            Action::PipPackage {
                venv,
                name,
                source,
                user,
            } => self.pip_install(venv, user, source, &[name.clone()]),
        }
    }
}
