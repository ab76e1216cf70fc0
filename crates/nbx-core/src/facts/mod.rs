//! OS facts: platform identity used to select per-OS behavior.
//!
//! Facts come from `/etc/os-release` on the managed host, or from a fact-set
//! label (`debian-11-x86_64`) when compiling a plan for another machine.

mod os_release;
mod platform;

pub use os_release::parse_os_release;
pub use platform::{PackageManager, PlatformProfile, UnsupportedOs};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

/// OS family, the coarse switch for package names and tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsFamily {
    RedHat,
    Debian,
    Other(String),
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::RedHat => f.write_str("RedHat"),
            OsFamily::Debian => f.write_str("Debian"),
            OsFamily::Other(s) => f.write_str(s),
        }
    }
}

/// Platform identity of one managed host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsFacts {
    pub family: OsFamily,
    /// Distribution name, e.g. `CentOS`, `Debian`, `Ubuntu`.
    pub name: String,
    /// Major release: `7`, `11`, or `20.04` for Ubuntu.
    pub release_major: String,
    pub architecture: String,
}

impl OsFacts {
    pub fn new(family: OsFamily, name: &str, release_major: &str, architecture: &str) -> Self {
        Self {
            family,
            name: name.to_string(),
            release_major: release_major.to_string(),
            architecture: architecture.to_string(),
        }
    }

    /// Gather facts from the running host.
    pub fn gather() -> Result<Self> {
        let path = OS_RELEASE_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .context("no os-release file found")?;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let mut facts = parse_os_release(&content)?;
        facts.architecture = std::env::consts::ARCH.to_string();
        tracing::debug!(label = %facts.label(), "gathered os facts from {}", path.display());
        Ok(facts)
    }

    /// Fact-set label, e.g. `debian-11-x86_64`.
    pub fn label(&self) -> String {
        format!(
            "{}-{}-{}",
            self.name.to_ascii_lowercase(),
            self.release_major,
            self.architecture
        )
    }

    /// Parse a fact-set label as produced by [`OsFacts::label`].
    pub fn from_label(label: &str) -> Result<Self> {
        let (rest, arch) = label
            .rsplit_once('-')
            .with_context(|| format!("fact-set label {:?} has no architecture", label))?;
        let (id, release) = rest
            .split_once('-')
            .with_context(|| format!("fact-set label {:?} has no release", label))?;
        if id.is_empty() || release.is_empty() || arch.is_empty() {
            anyhow::bail!("malformed fact-set label {:?}", label);
        }
        let (family, name) = os_release::identify(id, "");
        Ok(Self::new(family, &name, release, arch))
    }
}

/// The fact sets this tool supports and is tested against.
pub fn supported_os() -> Vec<OsFacts> {
    const ARCH: &str = "x86_64";
    let redhat = [("CentOS", "7"), ("CentOS", "8"), ("RedHat", "7"), ("RedHat", "8"), ("Rocky", "8")];
    let debian = [("Debian", "10"), ("Debian", "11"), ("Ubuntu", "20.04"), ("Ubuntu", "22.04")];
    redhat
        .iter()
        .map(|(name, rel)| OsFacts::new(OsFamily::RedHat, name, rel, ARCH))
        .chain(
            debian
                .iter()
                .map(|(name, rel)| OsFacts::new(OsFamily::Debian, name, rel, ARCH)),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_roundtrip_for_supported_sets() {
        for facts in supported_os() {
            let parsed = OsFacts::from_label(&facts.label()).unwrap();
            assert_eq!(parsed, facts, "{}", facts.label());
        }
    }

    #[test]
    fn rocky_label_has_a_platform_profile() {
        let facts = OsFacts::from_label("rocky-8-x86_64").unwrap();
        assert_eq!(facts.family, OsFamily::RedHat);
        assert_eq!(facts.name, "Rocky");
        let profile = PlatformProfile::for_facts(&facts).unwrap();
        assert_eq!(profile.package_manager, PackageManager::Dnf);
    }

    #[test]
    fn labels_look_like_fact_set_keys() {
        let labels: Vec<String> = supported_os().iter().map(OsFacts::label).collect();
        assert!(labels.contains(&"centos-7-x86_64".to_string()));
        assert!(labels.contains(&"ubuntu-20.04-x86_64".to_string()));
    }

    #[test]
    fn from_label_rejects_garbage() {
        assert!(OsFacts::from_label("debian").is_err());
        assert!(OsFacts::from_label("debian-11").is_err());
        assert!(OsFacts::from_label("-11-x86_64").is_err());
    }

    #[test]
    fn unknown_distribution_keeps_name() {
        let facts = OsFacts::from_label("gentoo-2-x86_64").unwrap();
        assert_eq!(facts.family, OsFamily::Other("gentoo".to_string()));
        assert_eq!(facts.release_major, "2");
    }
}
