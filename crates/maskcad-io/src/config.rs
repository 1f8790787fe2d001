//! Export configuration files.

use std::path::Path;

use maskcad_export::ExportConfig;

use crate::error::IoError;

/// Read an [`ExportConfig`] from a JSON file. Missing fields take their
/// defaults.
///
/// # Errors
///
/// Returns [`IoError::File`] or [`IoError::Json`].
pub fn load_config(path: impl AsRef<Path>) -> Result<ExportConfig, IoError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| IoError::file(path, e))?;
    serde_json::from_str(&text).map_err(|source| IoError::Json {
        path: path.to_path_buf(),
        source,
    })
}
