use crate::request::InstallRequest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Paths derived from a request. The versioned directory holds the release;
/// the unversioned symlink points at whichever release is current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallLayout {
    pub tarball: PathBuf,
    pub versioned_dir: PathBuf,
    pub current_link: PathBuf,
    pub venv: PathBuf,
    pub requirements: PathBuf,
}

impl InstallLayout {
    pub fn new(request: &InstallRequest) -> Self {
        let release = format!("netbox-{}", request.version);
        let current_link = request.install_root.join("netbox");
        Self {
            tarball: request.download_tmp_dir.join(format!("{}.tar.gz", release)),
            versioned_dir: request.install_root.join(&release),
            venv: current_link.join("venv"),
            requirements: current_link.join("requirements.txt"),
            current_link,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::fixtures::netbox_request;
    use std::path::Path;

    #[test]
    fn layout_for_canonical_request() {
        let layout = InstallLayout::new(&netbox_request());
        assert_eq!(layout.tarball, Path::new("/tmp/netbox-1.0.0.tar.gz"));
        assert_eq!(layout.versioned_dir, Path::new("/opt/netbox-1.0.0"));
        assert_eq!(layout.current_link, Path::new("/opt/netbox"));
        assert_eq!(layout.venv, Path::new("/opt/netbox/venv"));
        assert_eq!(
            layout.requirements,
            Path::new("/opt/netbox/requirements.txt")
        );
    }
}
