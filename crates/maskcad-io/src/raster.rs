//! Mask image decoding and PNG encoding.
//!
//! Mask files are read as 8-bit grayscale. Each gray level becomes a
//! foreground probability of `level / 255`, so strictly binary masks
//! (0 / 255) and soft probability maps share one path.

use std::path::Path;

use image::ImageEncoder;
use maskcad_pipeline::{GrayImage, Mask};

use crate::error::IoError;

/// Decode an in-memory image into a [`Mask`].
///
/// Any format the `image` crate was built with is accepted; color
/// images are converted to luma first.
///
/// # Errors
///
/// Returns [`IoError::Decode`] if the bytes are not a supported image
/// and [`IoError::Mask`] if the score is out of range. `origin` only
/// labels the error.
pub fn decode_mask(
    bytes: &[u8],
    origin: &Path,
    score: f64,
    label: Option<String>,
) -> Result<Mask, IoError> {
    let gray = image::load_from_memory(bytes)
        .map_err(|source| IoError::Decode {
            path: origin.to_path_buf(),
            source,
        })?
        .to_luma8();
    Mask::from_gray_levels(&gray, score, label).map_err(|source| IoError::Mask {
        path: origin.to_path_buf(),
        source,
    })
}

/// Read and decode a mask image from disk.
///
/// # Errors
///
/// Returns [`IoError::File`] if the file cannot be read, otherwise as
/// [`decode_mask`].
pub fn load_mask_png(
    path: impl AsRef<Path>,
    score: f64,
    label: Option<String>,
) -> Result<Mask, IoError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| IoError::file(path, e))?;
    let mask = decode_mask(&bytes, path, score, label)?;
    tracing::debug!(path = %path.display(), dimensions = %mask.dimensions(), "mask loaded");
    Ok(mask)
}

/// Encode a `GrayImage` as PNG bytes.
///
/// # Errors
///
/// Returns the encoder's error if PNG encoding fails.
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>, image::ImageError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::L8,
    )?;
    Ok(png_bytes)
}
