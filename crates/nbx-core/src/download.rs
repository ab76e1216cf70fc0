//! Single-stream HTTP/file downloader for the release tarball.
//!
//! Writes the response body into `<dest>.part` and renames it into place once
//! the transfer succeeds. Transient failures are retried per `RetryPolicy`.

use crate::config::NbxConfig;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::storage::{self, StorageWriter};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::time::Duration;

/// Error returned by a single download attempt. Kept typed so the retry
/// policy can classify it before it is reported.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// URL could not be parsed or uses an unsupported scheme.
    #[error("invalid download URL: {0}")]
    InvalidUrl(String),
    /// Curl reported an error (timeout, connection, missing file, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Writing the temp file failed (disk full, permission denied). Not retried.
    #[error("storage: {0}")]
    Storage(String),
}

/// Transfer tuning derived from `NbxConfig`.
#[derive(Debug, Clone, Copy)]
pub struct DownloadOptions {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_recv_speed: Option<u64>,
    pub retry: RetryPolicy,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self::from_config(&NbxConfig::default())
    }
}

impl DownloadOptions {
    pub fn from_config(cfg: &NbxConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.transfer_timeout_secs),
            max_recv_speed: cfg.max_recv_speed,
            retry: cfg
                .retry
                .as_ref()
                .map(RetryPolicy::from)
                .unwrap_or_default(),
        }
    }
}

/// Downloads `url` to `dest` (via `<dest>.part`), retrying transient failures.
/// Returns the number of bytes written.
pub fn download_file(url: &str, dest: &Path, opts: &DownloadOptions) -> Result<u64, DownloadError> {
    let parsed =
        url::Url::parse(url).map_err(|e| DownloadError::InvalidUrl(format!("{}: {}", url, e)))?;
    let local = match parsed.scheme() {
        "http" | "https" => false,
        "file" => true,
        other => {
            return Err(DownloadError::InvalidUrl(format!(
                "{}: unsupported scheme {}",
                url, other
            )))
        }
    };

    let bytes = run_with_retry(&opts.retry, || fetch_once(url, local, dest, opts))?;
    tracing::info!(url, dest = %dest.display(), bytes, "download complete");
    Ok(bytes)
}

fn fetch_once(
    url: &str,
    local: bool,
    dest: &Path,
    opts: &DownloadOptions,
) -> Result<u64, DownloadError> {
    let temp = storage::temp_path(dest);
    let writer =
        StorageWriter::create(&temp).map_err(|e| DownloadError::Storage(format!("{:#}", e)))?;

    let written = match transfer(url, local, &writer, opts) {
        Ok(n) => n,
        Err(e) => {
            writer.discard();
            return Err(e);
        }
    };

    writer
        .sync()
        .and_then(|()| writer.finalize(dest))
        .map_err(|e| DownloadError::Storage(format!("{:#}", e)))?;
    Ok(written)
}

fn transfer(
    url: &str,
    local: bool,
    writer: &StorageWriter,
    opts: &DownloadOptions,
) -> Result<u64, DownloadError> {
    let written = Cell::new(0u64);
    let storage_err: RefCell<Option<String>> = RefCell::new(None);

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;
    easy.timeout(opts.timeout)?;
    if let Some(speed) = opts.max_recv_speed {
        easy.max_recv_speed(speed)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            let off = written.get();
            match writer.write_at(off, data) {
                Ok(()) => {
                    written.set(off + data.len() as u64);
                    Ok(data.len())
                }
                Err(e) => {
                    *storage_err.borrow_mut() = Some(format!("{:#}", e));
                    Ok(0) // abort transfer
                }
            }
        })?;
        let res = transfer.perform();
        if let Some(msg) = storage_err.borrow_mut().take() {
            return Err(DownloadError::Storage(msg));
        }
        res?;
    }

    // file:// transfers carry no status code.
    if !local {
        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(DownloadError::Http(code));
        }
    }

    Ok(written.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_url(path: &Path) -> String {
        url::Url::from_file_path(path).unwrap().to_string()
    }

    #[test]
    fn downloads_file_url_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("netbox-1.0.0.tar.gz");
        std::fs::write(&src, b"release bytes").unwrap();
        let dest = dir.path().join("out").join("netbox.tar.gz");

        let n = download_file(&file_url(&src), &dest, &DownloadOptions::default()).unwrap();
        assert_eq!(n, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"release bytes");
        assert!(!storage::temp_path(&dest).exists());
    }

    #[test]
    fn missing_local_file_leaves_no_partial() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("netbox.tar.gz");
        let mut opts = DownloadOptions::default();
        opts.retry = RetryPolicy::none();

        let err = download_file(
            &file_url(&dir.path().join("absent.tar.gz")),
            &dest,
            &opts,
        )
        .unwrap_err();
        assert!(matches!(err, DownloadError::Curl(_)));
        assert!(!dest.exists());
        assert!(!storage::temp_path(&dest).exists());
    }

    #[test]
    fn rejects_unsupported_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let err = download_file(
            "ftp://example.com/netbox.tar.gz",
            &dir.path().join("x"),
            &DownloadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl(_)));
    }
}
