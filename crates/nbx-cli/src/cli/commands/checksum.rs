//! `nbx checksum` – digest a file the way downloads are verified.

use anyhow::Result;
use nbx_core::checksum::{self, ChecksumType};
use std::path::Path;

/// Compute and print the digest of the given file.
pub async fn run_checksum(path: &Path, kind: &str) -> Result<()> {
    let kind: ChecksumType = kind.parse()?;
    match checksum::digest_path(path, kind)? {
        Some(digest) => println!("{}  {}", digest, path.display()),
        None => anyhow::bail!("checksum type none has no digest"),
    }
    Ok(())
}
