//! Segmentation masks as produced by the model, and their cleaned form.

use image::{GrayImage, Luma};

use crate::error::InputError;
use crate::types::Dimensions;

/// Per-pixel mask payload.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskRaster {
    /// Boolean mask; any non-zero byte is foreground.
    Binary(GrayImage),
    /// Per-pixel foreground probability, row-major.
    Probability(Vec<f32>),
}

/// One segmentation mask: a raster plus its confidence and label.
///
/// Validated at construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    dimensions: Dimensions,
    raster: MaskRaster,
    score: f64,
    label: Option<String>,
}

impl Mask {
    /// Boolean mask from a row-major `bool` buffer.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::BufferLength`] if `data.len() != width * height`
    /// or [`InputError::ScoreOutOfRange`] for a score outside `[0, 1]`.
    pub fn from_bools(
        width: u32,
        height: u32,
        data: &[bool],
        score: f64,
        label: Option<String>,
    ) -> Result<Self, InputError> {
        let dimensions = Dimensions::new(width, height);
        check_len(dimensions, data.len())?;
        let bytes = data.iter().map(|&on| if on { 255 } else { 0 }).collect();
        let image = GrayImage::from_raw(width, height, bytes).ok_or(InputError::BufferLength {
            expected: dimensions.pixel_count(),
            actual: data.len() as u64,
        })?;
        Self::from_binary(image, score, label)
    }

    /// Boolean mask from an 8-bit image; non-zero pixels are foreground.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::ScoreOutOfRange`] for a score outside `[0, 1]`.
    pub fn from_binary(
        image: GrayImage,
        score: f64,
        label: Option<String>,
    ) -> Result<Self, InputError> {
        check_score(score)?;
        Ok(Self {
            dimensions: Dimensions::new(image.width(), image.height()),
            raster: MaskRaster::Binary(image),
            score,
            label,
        })
    }

    /// Probability mask from a row-major `f32` buffer.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::BufferLength`] if `data.len() != width * height`
    /// or [`InputError::ScoreOutOfRange`] for a score outside `[0, 1]`.
    pub fn from_probabilities(
        width: u32,
        height: u32,
        data: Vec<f32>,
        score: f64,
        label: Option<String>,
    ) -> Result<Self, InputError> {
        let dimensions = Dimensions::new(width, height);
        check_len(dimensions, data.len())?;
        check_score(score)?;
        Ok(Self {
            dimensions,
            raster: MaskRaster::Probability(data),
            score,
            label,
        })
    }

    /// Probability mask from 8-bit gray levels (`level / 255`).
    ///
    /// # Errors
    ///
    /// Returns [`InputError::ScoreOutOfRange`] for a score outside `[0, 1]`.
    pub fn from_gray_levels(
        image: &GrayImage,
        score: f64,
        label: Option<String>,
    ) -> Result<Self, InputError> {
        let data = image
            .pixels()
            .map(|&Luma([level])| f32::from(level) / 255.0)
            .collect();
        Self::from_probabilities(image.width(), image.height(), data, score, label)
    }

    /// Raster dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Raw pixel payload.
    #[must_use]
    pub const fn raster(&self) -> &MaskRaster {
        &self.raster
    }

    /// Model confidence in `[0, 1]`.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Optional class label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

fn check_len(dimensions: Dimensions, len: usize) -> Result<(), InputError> {
    let expected = dimensions.pixel_count();
    if len as u64 == expected {
        Ok(())
    } else {
        Err(InputError::BufferLength {
            expected,
            actual: len as u64,
        })
    }
}

fn check_score(score: f64) -> Result<(), InputError> {
    if (0.0..=1.0).contains(&score) {
        Ok(())
    } else {
        Err(InputError::ScoreOutOfRange(score))
    }
}

/// Counters gathered while cleaning a mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    /// Foreground pixels right after binarization.
    pub foreground_before: u64,
    /// Foreground pixels in the final cleaned raster.
    pub foreground_after: u64,
    /// Enclosed background components turned into foreground.
    pub holes_filled: usize,
    /// Foreground components dropped for being below the minimum area.
    pub components_removed: usize,
}

/// Binary raster (0 or 255) ready for contour extraction.
///
/// Carries the score and label of the mask it came from so later stages
/// can classify without reaching back to the input.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedMask {
    image: GrayImage,
    score: f64,
    label: Option<String>,
    stats: CleanStats,
}

impl CleanedMask {
    /// Wrap an already-binary raster. Non-zero pixels are normalized to 255.
    #[must_use]
    pub fn new(mut image: GrayImage, score: f64, label: Option<String>) -> Self {
        let mut foreground = 0;
        for Luma([v]) in image.pixels_mut() {
            if *v != 0 {
                *v = 255;
                foreground += 1;
            }
        }
        Self {
            image,
            score,
            label,
            stats: CleanStats {
                foreground_before: foreground,
                foreground_after: foreground,
                ..CleanStats::default()
            },
        }
    }

    pub(crate) const fn with_stats(mut self, stats: CleanStats) -> Self {
        self.stats = stats;
        self
    }

    /// The binary raster.
    #[must_use]
    pub const fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Raster dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }

    /// Confidence of the source mask.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Label of the source mask.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Cleaning counters.
    #[must_use]
    pub const fn stats(&self) -> CleanStats {
        self.stats
    }

    /// Number of foreground pixels.
    #[must_use]
    pub const fn foreground_pixels(&self) -> u64 {
        self.stats.foreground_after
    }

    /// No foreground at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.stats.foreground_after == 0
    }
}
