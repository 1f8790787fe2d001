//! Per-mask pipeline: advance one mask stage by stage, inspecting each
//! intermediate result before continuing.
//!
//! ```rust
//! # use maskcad_pipeline::{ContourExtractorKind, Dimensions, Mask, PipelineConfig, Raw};
//! # fn run(mask: &Mask) -> Result<(), Box<dyn std::error::Error>> {
//! let settings = PipelineConfig::default().validate(Dimensions::new(64, 64))?;
//! let classified = Raw::new(0, mask, &settings)
//!     .clean()?
//!     .extract(&ContourExtractorKind::default())?
//!     .simplify()?
//!     .transform()?
//!     .classify();
//! # let _ = classified;
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next state (or a
//! [`MaskError`] tagged with the failing stage). Every state carries the
//! diagnostics gathered so far.

use crate::classify::{ClassifiedRegion, classify_region};
use crate::config::MaskSettings;
use crate::contour::ContourExtractor;
use crate::diagnostics::{MaskDiagnostics, StageMetrics};
use crate::error::{FailedStage, MaskError};
use crate::mask::{CleanedMask, Mask};
use crate::simplify::simplify_region;
use crate::types::Region;

/// Where a mask came from; carried through every stage.
#[derive(Debug, Clone)]
struct Source {
    index: usize,
    score: f64,
    label: Option<String>,
}

// ───────────────────────── Stage 0: Raw ──────────────────────────

/// A mask that has not been touched yet.
#[must_use = "pipeline stages are consumed by advancing, call .clean() to continue"]
pub struct Raw<'a> {
    index: usize,
    mask: &'a Mask,
    settings: &'a MaskSettings,
}

impl<'a> Raw<'a> {
    /// Start the pipeline for the mask at position `index`.
    pub const fn new(index: usize, mask: &'a Mask, settings: &'a MaskSettings) -> Self {
        Self {
            index,
            mask,
            settings,
        }
    }

    /// Clean the mask and advance to [`Cleaned`].
    ///
    /// # Errors
    ///
    /// Returns a [`MaskError`] if the mask has zero dimensions or does
    /// not match the source image.
    pub fn clean(self) -> Result<Cleaned<'a>, MaskError> {
        let cleaned = crate::clean::clean(self.mask, self.settings.image, &self.settings.clean)
            .map_err(|e| MaskError::new(FailedStage::Clean, e))?;

        let stats = cleaned.stats();
        let mut diagnostics = MaskDiagnostics::new(self.index);
        diagnostics.push(StageMetrics::Clean {
            foreground_before: stats.foreground_before,
            foreground_after: stats.foreground_after,
            holes_filled: stats.holes_filled,
            components_removed: stats.components_removed,
        });

        Ok(Cleaned {
            source: Source {
                index: self.index,
                score: self.mask.score(),
                label: self.mask.label().map(str::to_owned),
            },
            settings: self.settings,
            cleaned,
            diagnostics,
        })
    }
}

// ───────────────────────── Stage 1: Cleaned ──────────────────────────

/// A mask reduced to a clean binary raster.
#[must_use = "pipeline stages are consumed by advancing, call .extract() to continue"]
pub struct Cleaned<'a> {
    source: Source,
    settings: &'a MaskSettings,
    cleaned: CleanedMask,
    diagnostics: MaskDiagnostics,
}

impl<'a> Cleaned<'a> {
    /// The cleaned raster.
    #[must_use]
    pub const fn cleaned(&self) -> &CleanedMask {
        &self.cleaned
    }

    /// Trace regions and advance to [`Extracted`].
    ///
    /// # Errors
    ///
    /// Returns a [`MaskError`] if the extractor cannot produce valid
    /// polygons.
    pub fn extract<E: ContourExtractor + ?Sized>(
        self,
        extractor: &E,
    ) -> Result<Extracted<'a>, MaskError> {
        let extraction = extractor
            .extract(&self.cleaned)
            .map_err(|e| MaskError::new(FailedStage::Extract, e))?;

        let mut diagnostics = self.diagnostics;
        diagnostics.push(StageMetrics::Extract {
            regions: extraction.regions.len(),
            holes: extraction.regions.iter().map(|r| r.holes().len()).sum(),
            degenerate_components: extraction.degenerate_components,
        });

        Ok(Extracted {
            source: self.source,
            settings: self.settings,
            regions: extraction.regions,
            diagnostics,
        })
    }
}

// ───────────────────────── Stage 2: Extracted ──────────────────────────

/// Pixel-space regions straight from the extractor.
#[must_use = "pipeline stages are consumed by advancing, call .simplify() to continue"]
pub struct Extracted<'a> {
    source: Source,
    settings: &'a MaskSettings,
    regions: Vec<Region>,
    diagnostics: MaskDiagnostics,
}

impl<'a> Extracted<'a> {
    /// The traced regions.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Simplify every region and advance to [`Simplified`].
    ///
    /// # Errors
    ///
    /// Returns a [`MaskError`] if a region self-intersects beyond repair.
    pub fn simplify(self) -> Result<Simplified<'a>, MaskError> {
        let vertices_before = self.regions.iter().map(Region::vertex_count).sum();
        let mut fallbacks = 0;
        let mut regions = Vec::with_capacity(self.regions.len());
        for region in &self.regions {
            let outcome = simplify_region(region, self.settings.simplify)
                .map_err(|e| MaskError::new(FailedStage::Simplify, e))?;
            fallbacks += usize::from(outcome.fell_back);
            regions.push(outcome.region);
        }

        let mut diagnostics = self.diagnostics;
        diagnostics.push(StageMetrics::Simplify {
            vertices_before,
            vertices_after: regions.iter().map(Region::vertex_count).sum(),
            fallbacks,
        });

        Ok(Simplified {
            source: self.source,
            settings: self.settings,
            regions,
            diagnostics,
        })
    }
}

// ───────────────────────── Stage 3: Simplified ──────────────────────────

/// Simplified pixel-space regions.
#[must_use = "pipeline stages are consumed by advancing, call .transform() to continue"]
pub struct Simplified<'a> {
    source: Source,
    settings: &'a MaskSettings,
    regions: Vec<Region>,
    diagnostics: MaskDiagnostics,
}

impl<'a> Simplified<'a> {
    /// The simplified regions.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Map every region into CAD space and advance to [`Transformed`].
    ///
    /// # Errors
    ///
    /// Returns a [`MaskError`] if the mapping collapses a region.
    pub fn transform(self) -> Result<Transformed<'a>, MaskError> {
        let height = f64::from(self.settings.image.height);
        let regions = self
            .regions
            .iter()
            .map(|r| self.settings.transform.apply(r, height))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MaskError::new(FailedStage::Transform, e))?;

        let mut diagnostics = self.diagnostics;
        diagnostics.push(StageMetrics::Transform {
            scale: self.settings.transform.scale(),
        });

        Ok(Transformed {
            source: self.source,
            settings: self.settings,
            regions,
            diagnostics,
        })
    }
}

// ───────────────────────── Stage 4: Transformed ──────────────────────────

/// CAD-space regions awaiting layer assignment.
#[must_use = "pipeline stages are consumed by advancing, call .classify() to continue"]
pub struct Transformed<'a> {
    source: Source,
    settings: &'a MaskSettings,
    regions: Vec<Region>,
    diagnostics: MaskDiagnostics,
}

impl Transformed<'_> {
    /// The CAD-space regions.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Assign layers and finish with [`Classified`].
    pub fn classify(self) -> Classified {
        let Source {
            index,
            score,
            label,
        } = self.source;

        let regions: Vec<ClassifiedRegion> = self
            .regions
            .into_iter()
            .map(|r| classify_region(r, score, label.as_deref(), &self.settings.rules))
            .collect();

        let mut layers: Vec<String> = Vec::new();
        for r in &regions {
            if !layers.contains(&r.layer.name) {
                layers.push(r.layer.name.clone());
            }
        }
        let mut diagnostics = self.diagnostics;
        diagnostics.push(StageMetrics::Classify { layers });

        tracing::debug!(mask = index, regions = regions.len(), "mask classified");

        Classified {
            index,
            regions,
            diagnostics,
        }
    }
}

// ───────────────────────── Stage 5: Classified ──────────────────────────

/// Final per-mask result, ready to append to a document.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    index: usize,
    regions: Vec<ClassifiedRegion>,
    diagnostics: MaskDiagnostics,
}

impl Classified {
    /// Position of the mask in the input.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The classified regions in extraction order.
    #[must_use]
    pub fn regions(&self) -> &[ClassifiedRegion] {
        &self.regions
    }

    /// Diagnostics gathered across all stages.
    #[must_use]
    pub const fn diagnostics(&self) -> &MaskDiagnostics {
        &self.diagnostics
    }

    /// Split into regions and diagnostics.
    #[must_use]
    pub fn into_parts(self) -> (Vec<ClassifiedRegion>, MaskDiagnostics) {
        (self.regions, self.diagnostics)
    }
}

/// Run every stage for one mask.
///
/// # Errors
///
/// Returns a [`MaskError`] naming the first stage that failed.
pub fn process_mask<E: ContourExtractor + ?Sized>(
    index: usize,
    mask: &Mask,
    settings: &MaskSettings,
    extractor: &E,
) -> Result<Classified, MaskError> {
    Ok(Raw::new(index, mask, settings)
        .clean()?
        .extract(extractor)?
        .simplify()?
        .transform()?
        .classify())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{GrayImage, Luma};

    use super::*;
    use crate::clean::CleanConfig;
    use crate::config::PipelineConfig;
    use crate::contour::{ContourExtractorKind, Extraction};
    use crate::error::{GeometryError, InputError, MaskErrorKind};
    use crate::transform::TransformConfig;
    use crate::types::{Dimensions, Point};

    fn square_mask(size: u32, lo: u32, hi: u32) -> Mask {
        let image = GrayImage::from_fn(size, size, |x, y| {
            Luma([if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                255
            } else {
                0
            }])
        });
        Mask::from_binary(image, 0.9, Some("wall".into())).unwrap()
    }

    fn settings(size: u32) -> MaskSettings {
        PipelineConfig {
            clean: CleanConfig {
                min_area_px: 1,
                ..CleanConfig::default()
            },
            ..PipelineConfig::default()
        }
        .validate(Dimensions::new(size, size))
        .unwrap()
    }

    struct Failing;

    impl ContourExtractor for Failing {
        fn extract(&self, _mask: &CleanedMask) -> Result<Extraction, GeometryError> {
            Err(GeometryError::AmbiguousBoundary { outer_loops: 2 })
        }
    }

    #[test]
    fn square_runs_end_to_end() {
        let mask = square_mask(100, 10, 50);
        let settings = settings(100);
        let result = process_mask(0, &mask, &settings, &ContourExtractorKind::default()).unwrap();
        assert_eq!(result.regions().len(), 1);
        let region = &result.regions()[0];
        assert_eq!(
            region.region.outer().points(),
            &[
                Point::new(10.0, 90.0),
                Point::new(50.0, 90.0),
                Point::new(50.0, 50.0),
                Point::new(10.0, 50.0),
            ]
        );
        assert_eq!(region.layer.name, "DEFAULT");
        assert_eq!(region.attributes.label.as_deref(), Some("wall"));
        assert_eq!(result.diagnostics().stages.len(), 5);
    }

    #[test]
    fn stages_expose_intermediates() {
        let mask = square_mask(40, 5, 25);
        let settings = settings(40);
        let cleaned = Raw::new(7, &mask, &settings).clean().unwrap();
        assert_eq!(cleaned.cleaned().foreground_pixels(), 400);
        let extracted = cleaned.extract(&ContourExtractorKind::default()).unwrap();
        assert_eq!(extracted.regions().len(), 1);
        let simplified = extracted.simplify().unwrap();
        assert_eq!(simplified.regions()[0].vertex_count(), 4);
        let transformed = simplified.transform().unwrap();
        assert_eq!(
            transformed.regions()[0].space(),
            crate::types::CoordinateSpace::Cad
        );
        let classified = transformed.classify();
        assert_eq!(classified.index(), 7);
    }

    #[test]
    fn dimension_mismatch_fails_in_clean_stage() {
        let mask = square_mask(30, 5, 25);
        let err = process_mask(0, &mask, &settings(40), &ContourExtractorKind::default())
            .unwrap_err();
        assert_eq!(err.stage, FailedStage::Clean);
        assert!(matches!(
            err.kind,
            MaskErrorKind::Input(InputError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn extractor_failure_is_tagged() {
        let mask = square_mask(40, 5, 25);
        let err = process_mask(0, &mask, &settings(40), &Failing).unwrap_err();
        assert_eq!(err.stage, FailedStage::Extract);
    }

    #[test]
    fn empty_mask_yields_no_regions() {
        let mask = square_mask(40, 0, 0);
        let result = process_mask(0, &mask, &settings(40), &ContourExtractorKind::default())
            .unwrap();
        assert!(result.regions().is_empty());
    }

    #[test]
    fn scale_applies_to_attributes() {
        let mask = square_mask(100, 10, 50);
        let settings = PipelineConfig {
            transform: TransformConfig {
                scale: 0.5,
                ..TransformConfig::default()
            },
            ..PipelineConfig::default()
        }
        .validate(Dimensions::new(100, 100))
        .unwrap();
        let result = process_mask(0, &mask, &settings, &ContourExtractorKind::default()).unwrap();
        let attrs = &result.regions()[0].attributes;
        assert!((attrs.area - 400.0).abs() < 1e-9);
        assert!((attrs.bbox_width - 20.0).abs() < 1e-9);
    }
}
