//! Install request: the declarative parameters describing one desired NetBox installation.
//!
//! Requests are read from a TOML file and validated before any plan is
//! compiled; a request that fails validation never reaches the host.

mod validate;

pub use validate::ValidationError;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Immutable input describing one desired installation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRequest {
    /// Directory the release is unpacked under (`<root>/netbox-<version>`).
    pub install_root: PathBuf,
    /// Release version, e.g. `3.7.1`.
    pub version: String,
    /// Where the release tarball is fetched from.
    pub download_url: String,
    /// Expected hex digest of the tarball.
    #[serde(default)]
    pub download_checksum: String,
    /// Digest algorithm name (`sha256`, `sha512`, `none`, ...).
    pub download_checksum_type: String,
    /// Scratch directory for the downloaded tarball.
    pub download_tmp_dir: PathBuf,
    /// System account that owns the installation.
    pub user: String,
    /// System group that owns the installation.
    pub group: String,
    /// Install python requirements from a local wheelhouse instead of the package index.
    #[serde(default)]
    pub install_dependencies_from_filesystem: bool,
    /// Local wheelhouse; required when `install_dependencies_from_filesystem` is set.
    #[serde(default)]
    pub python_dependency_path: Option<PathBuf>,
    #[serde(default)]
    pub include_ldap: bool,
    #[serde(default)]
    pub include_napalm: bool,
    #[serde(default)]
    pub include_django_storages: bool,
    /// Remove the tarball once it has been unpacked.
    #[serde(default = "default_true")]
    pub cleanup_tarball: bool,
}

fn default_true() -> bool {
    true
}

impl InstallRequest {
    /// Parse a request from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let req: InstallRequest = toml::from_str(s).context("parse install request")?;
        Ok(req)
    }

    /// Read and parse a request file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("read install request {}", path.display()))?;
        Self::from_toml_str(&data).with_context(|| format!("in {}", path.display()))
    }
}
