//! Mask manifests: the image size plus the ordered list of mask files
//! produced by the segmentation model.
//!
//! ```json
//! {
//!   "image": { "width": 640, "height": 480 },
//!   "masks": [
//!     { "path": "masks/0.png", "score": 0.97, "label": "wall" },
//!     { "path": "masks/1.png", "score": 0.81 }
//!   ]
//! }
//! ```
//!
//! Relative mask paths are resolved against the manifest's directory.
//! Masks load independently: one unreadable or invalid file becomes a
//! per-mask failure instead of aborting the batch.

use std::path::{Path, PathBuf};

use maskcad_pipeline::{Dimensions, Mask, MaskError};
use serde::{Deserialize, Serialize};

use crate::error::IoError;
use crate::raster::load_mask_png;

fn default_score() -> f64 {
    1.0
}

/// One mask file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskEntry {
    /// Image file, relative to the manifest or absolute.
    pub path: PathBuf,
    /// Model confidence in `[0, 1]`.
    #[serde(default = "default_score")]
    pub score: f64,
    /// Optional class label.
    #[serde(default)]
    pub label: Option<String>,
}

/// A parsed manifest with mask paths resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Size of the source image every mask must match.
    pub image: Dimensions,
    /// Masks in model output order.
    pub masks: Vec<MaskEntry>,
}

impl Manifest {
    /// Decode every mask, in order. Each slot holds the mask or the
    /// load-stage failure that replaces it.
    #[must_use]
    pub fn load_masks(&self) -> Vec<Result<Mask, MaskError>> {
        self.masks
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                load_mask_png(&entry.path, entry.score, entry.label.clone()).map_err(|e| {
                    tracing::warn!(mask = index, "mask not loaded: {e}");
                    MaskError::from(e)
                })
            })
            .collect()
    }
}

/// Read a manifest and resolve its mask paths.
///
/// # Errors
///
/// Returns [`IoError::File`] or [`IoError::Json`] if the manifest cannot
/// be read or parsed, and [`IoError::Manifest`] if it lists no masks.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Manifest, IoError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| IoError::file(path, e))?;
    let mut manifest: Manifest = serde_json::from_str(&text).map_err(|source| IoError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    if manifest.masks.is_empty() {
        return Err(IoError::Manifest {
            path: path.to_path_buf(),
            reason: "no masks listed".into(),
        });
    }

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for entry in &mut manifest.masks {
        if entry.path.is_relative() {
            entry.path = base.join(&entry.path);
        }
    }

    tracing::debug!(
        path = %path.display(),
        image = %manifest.image,
        masks = manifest.masks.len(),
        "manifest loaded"
    );
    Ok(manifest)
}
