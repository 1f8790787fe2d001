//! Pipeline configuration and its validated, per-run form.

use serde::{Deserialize, Serialize};

use crate::classify::{LayerConfig, RuleSet};
use crate::clean::CleanConfig;
use crate::contour::ContourExtractorKind;
use crate::error::ConfigError;
use crate::simplify::SimplifyTolerance;
use crate::transform::{Transform, TransformConfig};
use crate::types::Dimensions;

/// Every per-mask parameter, as read from configuration.
///
/// Missing fields take their defaults, so `{}` is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Mask cleaning.
    pub clean: CleanConfig,

    /// Which contour extractor to use.
    pub extractor: ContourExtractorKind,

    /// Simplification tolerance.
    pub simplify: SimplifyTolerance,

    /// Pixel-to-CAD mapping.
    pub transform: TransformConfig,

    /// Layer rules.
    pub layers: LayerConfig,
}

impl PipelineConfig {
    /// Validate once per run and produce the settings every mask shares.
    ///
    /// Checks run in a fixed order: transform, layer rules, then the
    /// remaining parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first invalid parameter.
    pub fn validate(&self, image: Dimensions) -> Result<MaskSettings, ConfigError> {
        let transform = Transform::from_config(&self.transform)?;
        let rules = RuleSet::new(&self.layers)?;
        self.clean.validate().map_err(ConfigError::Invalid)?;
        self.simplify.validate().map_err(ConfigError::Invalid)?;

        Ok(MaskSettings {
            image,
            clean: self.clean.clone(),
            simplify: self.simplify,
            transform,
            rules,
        })
    }
}

/// Validated settings shared by every mask in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskSettings {
    /// Source image dimensions every mask must match.
    pub image: Dimensions,
    /// Cleaning parameters.
    pub clean: CleanConfig,
    /// Simplification tolerance.
    pub simplify: SimplifyTolerance,
    /// Pixel-to-CAD mapping.
    pub transform: Transform,
    /// Layer rules.
    pub rules: RuleSet,
}
