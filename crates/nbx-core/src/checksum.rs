//! Checksum verification for downloaded release tarballs.
//!
//! Digests are computed on demand from disk in fixed-size chunks, so large
//! archives never have to fit in memory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

const BUF_SIZE: usize = 64 * 1024;

/// Hash algorithm used to verify a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumType {
    /// No verification.
    None,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

/// Returned when a checksum type name is not one we can verify.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported checksum type {0:?} (expected none, sha224, sha256, sha384 or sha512)")]
pub struct UnsupportedChecksumType(pub String);

impl FromStr for ChecksumType {
    type Err = UnsupportedChecksumType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(ChecksumType::None),
            "sha224" => Ok(ChecksumType::Sha224),
            // `sha2` is the historical name for SHA-256 in archive tooling.
            "sha256" | "sha2" => Ok(ChecksumType::Sha256),
            "sha384" => Ok(ChecksumType::Sha384),
            "sha512" => Ok(ChecksumType::Sha512),
            _ => Err(UnsupportedChecksumType(s.to_string())),
        }
    }
}

impl fmt::Display for ChecksumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChecksumType::None => "none",
            ChecksumType::Sha224 => "sha224",
            ChecksumType::Sha256 => "sha256",
            ChecksumType::Sha384 => "sha384",
            ChecksumType::Sha512 => "sha512",
        };
        f.write_str(name)
    }
}

fn digest_reader<D: Digest>(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = D::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute the digest of a file as lowercase hex. Returns `None` for `ChecksumType::None`.
pub fn digest_path(path: &Path, kind: ChecksumType) -> Result<Option<String>> {
    let digest = match kind {
        ChecksumType::None => return Ok(None),
        ChecksumType::Sha224 => digest_reader::<Sha224>(path)?,
        ChecksumType::Sha256 => digest_reader::<Sha256>(path)?,
        ChecksumType::Sha384 => digest_reader::<Sha384>(path)?,
        ChecksumType::Sha512 => digest_reader::<Sha512>(path)?,
    };
    Ok(Some(digest))
}

/// Compute SHA-256 of a file and return the digest as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String> {
    digest_reader::<Sha256>(path)
}

/// Check a file against an expected hex digest (case-insensitive).
/// `ChecksumType::None` always verifies.
pub fn verify_path(path: &Path, kind: ChecksumType, expected: &str) -> Result<bool> {
    match digest_path(path, kind)? {
        None => Ok(true),
        Some(actual) => Ok(actual.eq_ignore_ascii_case(expected.trim())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sha256_path_empty_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let digest = sha256_path(f.path()).unwrap();
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_path_known_content() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        let digest = sha256_path(f.path()).unwrap();
        assert_eq!(
            digest,
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
    }

    #[test]
    fn digest_lengths_per_algorithm() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"netbox").unwrap();
        f.flush().unwrap();
        let len = |k| digest_path(f.path(), k).unwrap().unwrap().len();
        assert_eq!(len(ChecksumType::Sha224), 56);
        assert_eq!(len(ChecksumType::Sha256), 64);
        assert_eq!(len(ChecksumType::Sha384), 96);
        assert_eq!(len(ChecksumType::Sha512), 128);
        assert!(digest_path(f.path(), ChecksumType::None).unwrap().is_none());
    }

    #[test]
    fn verify_is_case_insensitive() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        let upper = "5891B5B522D5DF086D0FF0B110FBD9D21BB4FC7163AF34D08286A2E846F6BE03";
        assert!(verify_path(f.path(), ChecksumType::Sha256, upper).unwrap());
        assert!(!verify_path(f.path(), ChecksumType::Sha256, "abcde").unwrap());
        assert!(verify_path(f.path(), ChecksumType::None, "whatever").unwrap());
    }

    #[test]
    fn parse_checksum_type_names() {
        assert_eq!("sha256".parse::<ChecksumType>(), Ok(ChecksumType::Sha256));
        assert_eq!("SHA2".parse::<ChecksumType>(), Ok(ChecksumType::Sha256));
        assert_eq!("sha512".parse::<ChecksumType>(), Ok(ChecksumType::Sha512));
        assert_eq!("none".parse::<ChecksumType>(), Ok(ChecksumType::None));
        assert!("md5".parse::<ChecksumType>().is_err());
        assert!("sha1".parse::<ChecksumType>().is_err());
        assert_eq!(ChecksumType::Sha384.to_string(), "sha384");
    }
}
