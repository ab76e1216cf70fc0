//! Temp-file lifecycle for downloads.
//!
//! Bytes land in `<dest>.part` and are atomically renamed into place once the
//! transfer completes, so a half-written tarball never sits at the final path.

mod writer;

pub use writer::StorageWriter;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `netbox.tar.gz` → `netbox.tar.gz.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}
