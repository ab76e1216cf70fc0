//! Release tarball extraction (`.tar.gz`).
//!
//! Entries are unpacked one at a time so that absolute paths and `..`
//! components can be rejected before anything is written.

use flate2::read::GzDecoder;
use std::fs::File;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("archive entry {0} escapes the extraction directory")]
    PathTraversal(String),
    #[error("archive did not produce {0}")]
    MissingOutput(PathBuf),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ExtractError + '_ {
    move |source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Unpack `archive` into `into`. When `creates` is given, it must exist afterwards.
/// Returns the number of entries unpacked.
///
/// Entries land in a staging directory under `into` and are only moved into
/// place once the whole archive unpacked cleanly, so a failure leaves `into`
/// as it was.
pub fn extract_tar_gz(
    archive: &Path,
    into: &Path,
    creates: Option<&Path>,
) -> Result<usize, ExtractError> {
    let file = File::open(archive).map_err(io_err(archive))?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    tar.set_preserve_permissions(true);
    std::fs::create_dir_all(into).map_err(io_err(into))?;
    // Removed on drop, including every early return below.
    let staging = tempfile::Builder::new()
        .prefix(".nbx-extract-")
        .tempdir_in(into)
        .map_err(io_err(into))?;

    let mut count = 0usize;
    for entry in tar.entries().map_err(io_err(archive))? {
        let mut entry = entry.map_err(io_err(archive))?;
        let entry_path = entry.path().map_err(io_err(archive))?.into_owned();

        if entry_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            return Err(ExtractError::PathTraversal(entry_path.display().to_string()));
        }

        // unpack_in re-checks containment and creates parent directories.
        let unpacked = entry
            .unpack_in(staging.path())
            .map_err(io_err(&entry_path))?;
        if !unpacked {
            return Err(ExtractError::PathTraversal(entry_path.display().to_string()));
        }
        count += 1;
    }

    if let Some(rel) = creates.and_then(|c| c.strip_prefix(into).ok()) {
        if !staging.path().join(rel).exists() {
            return Err(ExtractError::MissingOutput(into.join(rel)));
        }
    }

    let mut moves = Vec::new();
    for entry in std::fs::read_dir(staging.path()).map_err(io_err(staging.path()))? {
        let entry = entry.map_err(io_err(staging.path()))?;
        let dest = into.join(entry.file_name());
        if dest.symlink_metadata().is_ok() {
            return Err(ExtractError::Io {
                path: dest,
                source: std::io::Error::new(std::io::ErrorKind::AlreadyExists, "already exists"),
            });
        }
        moves.push((entry.path(), dest));
    }
    for (from, to) in moves {
        std::fs::rename(&from, &to).map_err(io_err(&to))?;
    }

    if let Some(creates) = creates {
        if !creates.exists() {
            return Err(ExtractError::MissingOutput(creates.to_path_buf()));
        }
    }
    tracing::debug!(
        archive = %archive.display(),
        into = %into.display(),
        entries = count,
        "extracted"
    );
    Ok(count)
}

#[cfg(test)]
pub(crate) mod test_archive {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::path::Path;

    /// Write a `.tar.gz` at `dest` holding `files` (relative path, contents).
    pub(crate) fn write_tar_gz(dest: &Path, files: &[(&str, &[u8])]) {
        let file = std::fs::File::create(dest).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (path, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }
}
