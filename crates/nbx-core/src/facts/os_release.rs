//! `/etc/os-release` parsing.

use super::{OsFacts, OsFamily};
use anyhow::Result;
use std::collections::HashMap;

/// Map an os-release `ID` (plus `ID_LIKE`) to a family and display name.
pub(super) fn identify(id: &str, id_like: &str) -> (OsFamily, String) {
    let id = id.to_ascii_lowercase();
    let name = match id.as_str() {
        "centos" => "CentOS",
        "rhel" | "redhat" => "RedHat",
        "rocky" => "Rocky",
        "almalinux" => "AlmaLinux",
        "fedora" => "Fedora",
        "debian" => "Debian",
        "ubuntu" => "Ubuntu",
        _ => "",
    };
    let name = if name.is_empty() {
        id.clone()
    } else {
        name.to_string()
    };

    let mut lineage = vec![id.as_str()];
    lineage.extend(id_like.split_whitespace());
    let family = if lineage
        .iter()
        .any(|i| matches!(*i, "rhel" | "redhat" | "centos" | "fedora" | "rocky" | "almalinux"))
    {
        OsFamily::RedHat
    } else if lineage.iter().any(|i| matches!(*i, "debian" | "ubuntu")) {
        OsFamily::Debian
    } else {
        OsFamily::Other(id.clone())
    };
    (family, name)
}

fn unquote(value: &str) -> &str {
    let v = value.trim();
    for q in ['"', '\''] {
        if let Some(inner) = v.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
            return inner;
        }
    }
    v
}

/// Parse os-release content into facts. Architecture is left empty; the
/// caller fills it in from the running binary.
pub fn parse_os_release(content: &str) -> Result<OsFacts> {
    let fields: HashMap<&str, &str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.trim(), unquote(v)))
        .collect();

    let id = fields
        .get("ID")
        .copied()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow::anyhow!("os-release has no ID"))?;
    let id_like = fields.get("ID_LIKE").copied().unwrap_or("");
    let version_id = fields.get("VERSION_ID").copied().unwrap_or("");
    if version_id.is_empty() {
        anyhow::bail!("os-release has no VERSION_ID");
    }

    let (family, name) = identify(id, id_like);
    // Ubuntu releases are identified by year.month; others by the leading number.
    let release_major = if name == "Ubuntu" {
        version_id.to_string()
    } else {
        version_id.split('.').next().unwrap_or(version_id).to_string()
    };

    Ok(OsFacts {
        family,
        name,
        release_major,
        architecture: String::new(),
    })
}
