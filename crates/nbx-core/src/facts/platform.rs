//! Per-OS platform profile: package names, package manager, python interpreter.

use super::{OsFacts, OsFamily};
use crate::host::{CommandOutput, CommandSpec};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The host's OS is outside the supported matrix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported operating system {name} {release} ({family})")]
pub struct UnsupportedOs {
    pub family: String,
    pub name: String,
    pub release: String,
}

impl UnsupportedOs {
    fn from_facts(facts: &OsFacts) -> Self {
        Self {
            family: facts.family.to_string(),
            name: facts.name.clone(),
            release: facts.release_major.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Yum,
    Dnf,
    Apt,
}

impl PackageManager {
    /// Command that succeeds when `package` is installed.
    pub fn query_command(self, package: &str) -> CommandSpec {
        match self {
            PackageManager::Yum | PackageManager::Dnf => {
                CommandSpec::new("rpm").args(["-q", package])
            }
            PackageManager::Apt => {
                CommandSpec::new("dpkg-query").args(["-W", "-f=${Status}", package])
            }
        }
    }

    /// Interpret the output of [`PackageManager::query_command`].
    pub fn is_installed(self, out: &CommandOutput) -> bool {
        match self {
            PackageManager::Yum | PackageManager::Dnf => out.success(),
            // dpkg keeps records for removed packages; only "install ok installed" counts.
            PackageManager::Apt => out.success() && out.stdout.contains("install ok installed"),
        }
    }

    /// Non-interactive install of `packages`.
    pub fn install_command(self, packages: &[String]) -> CommandSpec {
        let cmd = match self {
            PackageManager::Yum => CommandSpec::new("yum").args(["install", "-y"]),
            PackageManager::Dnf => CommandSpec::new("dnf").args(["install", "-y"]),
            PackageManager::Apt => CommandSpec::new("apt-get").args(["install", "-y", "-q"]),
        };
        cmd.args(packages.iter().cloned())
    }
}

/// What a supported OS needs to build and run NetBox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
    pub package_manager: PackageManager,
    /// Compilers, headers, and the python runtime.
    pub build_packages: Vec<String>,
    /// Extra headers needed by `django-auth-ldap`.
    pub ldap_packages: Vec<String>,
    /// Interpreter used to create the virtualenv.
    pub python: PathBuf,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl PlatformProfile {
    pub fn for_facts(facts: &OsFacts) -> Result<Self, UnsupportedOs> {
        let release = facts.release_major.as_str();
        match (&facts.family, facts.name.as_str(), release) {
            (OsFamily::RedHat, _, "7") => Ok(Self {
                package_manager: PackageManager::Yum,
                build_packages: strings(&[
                    "gcc",
                    "python36",
                    "python36-devel",
                    "libxml2-devel",
                    "libxslt-devel",
                    "libffi-devel",
                    "openssl-devel",
                    "redhat-rpm-config",
                ]),
                ldap_packages: strings(&["openldap-devel"]),
                python: PathBuf::from("/usr/bin/python3.6"),
            }),
            (OsFamily::RedHat, _, "8") => Ok(Self {
                package_manager: PackageManager::Dnf,
                build_packages: strings(&[
                    "gcc",
                    "python38",
                    "python38-devel",
                    "libxml2-devel",
                    "libxslt-devel",
                    "libffi-devel",
                    "libpq-devel",
                    "openssl-devel",
                    "redhat-rpm-config",
                ]),
                ldap_packages: strings(&["openldap-devel", "cyrus-sasl-devel"]),
                python: PathBuf::from("/usr/bin/python3.8"),
            }),
            (OsFamily::Debian, "Debian", "10" | "11") | (OsFamily::Debian, "Ubuntu", "20.04" | "22.04") => {
                Ok(Self {
                    package_manager: PackageManager::Apt,
                    build_packages: strings(&[
                        "python3",
                        "python3-pip",
                        "python3-venv",
                        "python3-dev",
                        "build-essential",
                        "libxml2-dev",
                        "libxslt1-dev",
                        "libffi-dev",
                        "libpq-dev",
                        "libssl-dev",
                        "zlib1g-dev",
                    ]),
                    ldap_packages: strings(&["libldap2-dev", "libsasl2-dev"]),
                    python: PathBuf::from("/usr/bin/python3"),
                })
            }
            _ => Err(UnsupportedOs::from_facts(facts)),
        }
    }
}
