//! Mask post-processing: binarize, morphology, smoothing, hole filling and
//! removal of components outside the configured size range.

use std::collections::{HashMap, HashSet};

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::region_labelling::{Connectivity, connected_components};
use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::mask::{CleanStats, CleanedMask, Mask, MaskRaster};
use crate::types::Dimensions;

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

/// Level a smoothed raster is re-thresholded at.
const SMOOTHING_THRESHOLD: u8 = 127;

/// Parameters for [`clean`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Probability at or above which a pixel counts as foreground.
    pub binarize_threshold: f64,

    /// Foreground components with fewer pixels than this are dropped.
    pub min_area_px: u64,

    /// Foreground components with more pixels than this are dropped.
    /// `None` keeps components of any size.
    pub max_area_px: Option<u64>,

    /// Side of the square open/close kernel. Sizes below 3 disable the
    /// pass; even sizes act like the next smaller odd size.
    pub morphology_kernel_size: u32,

    /// Turn enclosed background into foreground.
    pub fill_holes: bool,

    /// Gaussian sigma applied before re-thresholding. `0` disables.
    pub smoothing_strength: f64,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            binarize_threshold: 0.5,
            min_area_px: 100,
            max_area_px: None,
            morphology_kernel_size: 3,
            fill_holes: false,
            smoothing_strength: 0.0,
        }
    }
}

impl CleanConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns a description of the first out-of-range parameter.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.binarize_threshold) {
            return Err(format!(
                "binarize_threshold {} is outside [0, 1]",
                self.binarize_threshold
            ));
        }
        if let Some(max) = self.max_area_px
            && max < self.min_area_px
        {
            return Err(format!(
                "max_area_px {max} is below min_area_px {}",
                self.min_area_px
            ));
        }
        if !self.smoothing_strength.is_finite() || self.smoothing_strength < 0.0 {
            return Err(format!(
                "smoothing_strength {} must be finite and non-negative",
                self.smoothing_strength
            ));
        }
        Ok(())
    }

    fn morphology_radius(&self) -> u8 {
        let radius = self.morphology_kernel_size.saturating_sub(1) / 2;
        u8::try_from(radius).unwrap_or(u8::MAX)
    }
}

/// Turn a raw mask into a binary raster ready for contour extraction.
///
/// An empty result is valid and yields zero regions downstream.
///
/// # Errors
///
/// Returns [`InputError::ZeroDimensions`] if either side of the mask is
/// zero, or [`InputError::DimensionMismatch`] if the mask does not match
/// the source image.
pub fn clean(
    mask: &Mask,
    image: Dimensions,
    config: &CleanConfig,
) -> Result<CleanedMask, InputError> {
    let dims = mask.dimensions();
    if dims.is_empty() {
        return Err(InputError::ZeroDimensions {
            width: dims.width,
            height: dims.height,
        });
    }
    if dims != image {
        return Err(InputError::DimensionMismatch {
            expected: image,
            actual: dims,
        });
    }

    let mut binary = binarize(mask.raster(), dims, config.binarize_threshold);
    let foreground_before = count_foreground(&binary);

    let radius = config.morphology_radius();
    if radius > 0 {
        binary = imageproc::morphology::open(&binary, Norm::LInf, radius);
        binary = imageproc::morphology::close(&binary, Norm::LInf, radius);
    }

    if config.smoothing_strength > 0.0 {
        binary = smooth(&binary, config.smoothing_strength);
    }

    let holes_filled = if config.fill_holes {
        fill_holes(&mut binary)
    } else {
        0
    };

    let components_removed =
        remove_components_by_size(&mut binary, config.min_area_px, config.max_area_px);
    let foreground_after = count_foreground(&binary);

    tracing::debug!(
        foreground_before,
        foreground_after,
        holes_filled,
        components_removed,
        "mask cleaned"
    );

    Ok(
        CleanedMask::new(binary, mask.score(), mask.label().map(str::to_owned)).with_stats(
            CleanStats {
                foreground_before,
                foreground_after,
                holes_filled,
                components_removed,
            },
        ),
    )
}

fn binarize(raster: &MaskRaster, dims: Dimensions, threshold: f64) -> GrayImage {
    match raster {
        MaskRaster::Binary(image) => GrayImage::from_fn(dims.width, dims.height, |x, y| {
            Luma([if image.get_pixel(x, y)[0] == 0 {
                BACKGROUND
            } else {
                FOREGROUND
            }])
        }),
        MaskRaster::Probability(data) => {
            let width = dims.width as usize;
            GrayImage::from_fn(dims.width, dims.height, |x, y| {
                let p = data[y as usize * width + x as usize];
                Luma([if f64::from(p) >= threshold {
                    FOREGROUND
                } else {
                    BACKGROUND
                }])
            })
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn smooth(image: &GrayImage, strength: f64) -> GrayImage {
    let mut blurred = imageproc::filter::gaussian_blur_f32(image, strength as f32);
    for Luma([v]) in blurred.pixels_mut() {
        *v = if *v > SMOOTHING_THRESHOLD {
            FOREGROUND
        } else {
            BACKGROUND
        };
    }
    blurred
}

/// Fill background components that do not touch the border. Background
/// connectivity is 4-way so diagonal gaps keep a hole open.
fn fill_holes(image: &mut GrayImage) -> usize {
    let (width, height) = image.dimensions();
    let mut inverted = image.clone();
    for Luma([v]) in inverted.pixels_mut() {
        *v = FOREGROUND - *v;
    }
    let labels = connected_components(&inverted, Connectivity::Four, Luma([BACKGROUND]));

    let mut touches_border = HashSet::new();
    for (x, y, Luma([label])) in labels.enumerate_pixels() {
        if *label != 0 && (x == 0 || y == 0 || x == width - 1 || y == height - 1) {
            touches_border.insert(*label);
        }
    }

    let mut filled = HashSet::new();
    for (x, y, Luma([label])) in labels.enumerate_pixels() {
        if *label != 0 && !touches_border.contains(label) {
            image.put_pixel(x, y, Luma([FOREGROUND]));
            filled.insert(*label);
        }
    }
    filled.len()
}

/// Zero out 8-connected foreground components below `min_area` or above
/// `max_area` pixels.
fn remove_components_by_size(image: &mut GrayImage, min_area: u64, max_area: Option<u64>) -> usize {
    if min_area <= 1 && max_area.is_none() {
        return 0;
    }
    let labels = connected_components(&*image, Connectivity::Eight, Luma([BACKGROUND]));

    let mut sizes: HashMap<u32, u64> = HashMap::new();
    for Luma([label]) in labels.pixels() {
        if *label != 0 {
            *sizes.entry(*label).or_default() += 1;
        }
    }

    let dropped: HashSet<u32> = sizes
        .iter()
        .filter(|&(_, &size)| size < min_area || max_area.is_some_and(|max| size > max))
        .map(|(&label, _)| label)
        .collect();
    if dropped.is_empty() {
        return 0;
    }

    for (x, y, Luma([label])) in labels.enumerate_pixels() {
        if dropped.contains(label) {
            image.put_pixel(x, y, Luma([BACKGROUND]));
        }
    }
    dropped.len()
}

fn count_foreground(image: &GrayImage) -> u64 {
    image.pixels().filter(|Luma([v])| *v != BACKGROUND).count() as u64
}
