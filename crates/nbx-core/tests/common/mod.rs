//! Shared helpers for nbx-core integration tests.

#![allow(dead_code)]

pub mod fake_host;
pub mod file_server;

use flate2::write::GzEncoder;
use flate2::Compression;
use std::path::Path;

/// Build a gzipped release tarball in memory from `(path, contents)` entries.
pub fn release_tarball(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// The minimal NetBox release layout the plan relies on.
pub fn netbox_release(version: &str) -> Vec<u8> {
    let requirements = format!("netbox-{}/requirements.txt", version);
    let manage = format!("netbox-{}/netbox/manage.py", version);
    release_tarball(&[
        (requirements.as_str(), b"Django>=4.2\n".as_slice()),
        (manage.as_str(), b"#!/usr/bin/env python3\n".as_slice()),
    ])
}

/// Request TOML for `version` rooted in a scratch directory.
pub fn request_toml(root: &Path, version: &str, url: &str, checksum: &str, wheels: &Path) -> String {
    format!(
        r#"
install_root = "{root}/opt"
version = "{version}"
download_url = "{url}"
download_checksum = "{checksum}"
download_checksum_type = "sha256"
download_tmp_dir = "{root}/tmp"
user = "test"
group = "test"
install_dependencies_from_filesystem = true
python_dependency_path = "{wheels}"
include_napalm = true
"#,
        root = root.display(),
        version = version,
        url = url,
        checksum = checksum,
        wheels = wheels.display(),
    )
}
