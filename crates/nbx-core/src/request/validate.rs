//! Parameter validation, run before any plan is compiled.

use super::InstallRequest;
use crate::checksum::ChecksumType;
use std::path::Path;

const MAX_PRINCIPAL_LEN: usize = 32;

/// A request parameter is missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("parameter `{0}` must not be empty")]
    Empty(&'static str),
    #[error("version {0:?} cannot be used as a directory name")]
    InvalidVersion(String),
    #[error("download_url {url:?} is not a valid URL: {reason}")]
    MalformedUrl { url: String, reason: String },
    #[error(transparent)]
    UnsupportedChecksumType(#[from] crate::checksum::UnsupportedChecksumType),
    #[error("download_checksum {0:?} is not a hex digest")]
    InvalidChecksum(String),
    #[error("parameter `{field}` must be an absolute path, got {value:?}")]
    RelativePath { field: &'static str, value: String },
    #[error("{field} {value:?} is not a valid account name")]
    InvalidPrincipal { field: &'static str, value: String },
    #[error("python_dependency_path is required when install_dependencies_from_filesystem is true")]
    MissingDependencyPath,
}

impl InstallRequest {
    /// Checks every parameter and returns the parsed checksum type.
    /// The first problem found is returned.
    pub fn validate(&self) -> Result<ChecksumType, ValidationError> {
        validate_version(&self.version)?;
        validate_url(&self.download_url)?;

        let checksum_type: ChecksumType = self.download_checksum_type.parse()?;
        if checksum_type != ChecksumType::None {
            validate_checksum(&self.download_checksum)?;
        }

        require_absolute("install_root", &self.install_root)?;
        require_absolute("download_tmp_dir", &self.download_tmp_dir)?;
        validate_principal("user", &self.user)?;
        validate_principal("group", &self.group)?;

        match (&self.python_dependency_path, self.install_dependencies_from_filesystem) {
            (Some(path), _) => require_absolute("python_dependency_path", path)?,
            (None, true) => return Err(ValidationError::MissingDependencyPath),
            (None, false) => {}
        }

        Ok(checksum_type)
    }
}

fn validate_version(version: &str) -> Result<(), ValidationError> {
    if version.trim().is_empty() {
        return Err(ValidationError::Empty("version"));
    }
    if version.contains('/')
        || version.contains('\0')
        || version == "."
        || version == ".."
        || version.chars().any(char::is_whitespace)
    {
        return Err(ValidationError::InvalidVersion(version.to_string()));
    }
    Ok(())
}

fn validate_url(raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::Empty("download_url"));
    }
    let malformed = |reason: String| ValidationError::MalformedUrl {
        url: raw.to_string(),
        reason,
    };
    let url = url::Url::parse(raw).map_err(|e| malformed(e.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(()),
        "http" | "https" => Err(malformed("missing host".to_string())),
        "file" => Ok(()),
        other => Err(malformed(format!("unsupported scheme {}", other))),
    }
}

fn validate_checksum(digest: &str) -> Result<(), ValidationError> {
    let digest = digest.trim();
    if digest.is_empty() {
        return Err(ValidationError::Empty("download_checksum"));
    }
    if !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidChecksum(digest.to_string()));
    }
    Ok(())
}

fn require_absolute(field: &'static str, path: &Path) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    if !path.is_absolute() {
        return Err(ValidationError::RelativePath {
            field,
            value: path.display().to_string(),
        });
    }
    Ok(())
}

/// POSIX-portable account name: `[a-z_][a-z0-9_-]*[$]?`, at most 32 bytes.
fn validate_principal(field: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    let invalid = || ValidationError::InvalidPrincipal {
        field,
        value: name.to_string(),
    };
    if name.len() > MAX_PRINCIPAL_LEN {
        return Err(invalid());
    }
    let body = name.strip_suffix('$').unwrap_or(name);
    let mut chars = body.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return Err(invalid()),
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-') {
        return Err(invalid());
    }
    Ok(())
}
