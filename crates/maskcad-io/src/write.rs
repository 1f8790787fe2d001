//! Atomic output.
//!
//! Bytes go to a temporary file in the target's directory, which is
//! renamed over the target only once everything has been written. A
//! failed write leaves no partial file behind.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::IoError;

/// Write `bytes` to `path` atomically.
///
/// # Errors
///
/// Returns [`IoError::File`] if the temporary file cannot be created,
/// written, synced or renamed.
pub fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), IoError> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|e| IoError::file(dir, e))?;
    file.write_all(bytes)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| IoError::file(file.path(), e))?;
    file.persist(path)
        .map_err(|e| IoError::file(path, e.error))?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "file written");
    Ok(())
}
