//! maskcad-pipeline: Pure mask-to-polygon pipeline (sans-IO).
//!
//! Turns one segmentation mask into classified CAD-space polygons through:
//! clean -> contour extraction -> simplification -> coordinate transform
//! -> layer classification.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! rasters and returns structured data. Filesystem interaction lives in
//! `maskcad-io`; document assembly and DXF output live in
//! `maskcad-export`.

pub mod classify;
pub mod clean;
pub mod config;
pub mod contour;
pub mod diagnostics;
pub mod error;
pub mod mask;
pub mod pipeline;
pub mod simplify;
pub mod transform;
pub mod types;

pub use classify::{
    Attribute, ClassifiedRegion, Comparison, Condition, DEFAULT_COLOR, DEFAULT_LAYER,
    LayerAssignment, LayerConfig, LayerRule, LineType, Operand, RegionAttributes, RuleSet,
    area_bands, classify, classify_region, score_bands,
};
pub use clean::{CleanConfig, clean};
pub use config::{MaskSettings, PipelineConfig};
pub use contour::{ContourExtractor, ContourExtractorKind, Extraction};
pub use diagnostics::{MaskDiagnostics, StageMetrics};
pub use error::{
    ConfigError, FailedStage, GeometryError, InputError, LayerRuleError, MaskError,
    MaskErrorKind, TransformError,
};
pub use mask::{CleanStats, CleanedMask, Mask, MaskRaster};
pub use pipeline::{Classified, Cleaned, Extracted, Raw, Simplified, Transformed, process_mask};
pub use simplify::{SimplifyOutcome, SimplifyTolerance, simplify, simplify_region, simplify_ring};
pub use transform::{Transform, TransformConfig, transform};
pub use types::{Bounds, CoordinateSpace, Dimensions, GrayImage, Point, Region, Ring, Winding};
