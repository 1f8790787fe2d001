//! Error taxonomy for the mask pipeline.
//!
//! Errors are split by blast radius. [`InputError`] and [`GeometryError`]
//! only ever sink a single mask and are wrapped in [`MaskError`] together
//! with the stage that produced them. [`TransformError`] and
//! [`LayerRuleError`] describe a broken configuration and surface through
//! [`ConfigError`] before any mask is touched.

use std::fmt;

use serde::Serialize;

use crate::types::{CoordinateSpace, Dimensions};

/// A mask (or its declared image shape) is malformed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    /// Width or height is zero.
    #[error("mask has zero dimensions ({width}x{height})")]
    ZeroDimensions {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },

    /// Mask dimensions differ from the source image dimensions.
    #[error(
        "mask is {}x{} but the source image is {}x{}",
        actual.width, actual.height, expected.width, expected.height
    )]
    DimensionMismatch {
        /// Source image dimensions.
        expected: Dimensions,
        /// Mask dimensions.
        actual: Dimensions,
    },

    /// The pixel buffer does not hold exactly `width * height` samples.
    #[error("mask buffer holds {actual} samples, expected {expected}")]
    BufferLength {
        /// `width * height`.
        expected: u64,
        /// Samples actually supplied.
        actual: u64,
    },

    /// Confidence score is not a finite value in `[0, 1]`.
    #[error("mask score {0} is outside [0, 1]")]
    ScoreOutOfRange(f64),
}

/// Geometry that cannot be turned into a valid polygon.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// A ring has fewer than three distinct vertices.
    #[error("ring has {distinct} distinct vertices, at least 3 are required")]
    DegenerateRing {
        /// Number of distinct vertices found.
        distinct: usize,
    },

    /// A ring encloses no area (all vertices collinear).
    #[error("ring encloses zero area")]
    ZeroArea,

    /// A vertex coordinate is NaN or infinite.
    #[error("non-finite vertex coordinate ({x}, {y})")]
    NonFiniteCoordinate {
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
    },

    /// Boundary tracing did not close into loops.
    #[error("boundary trace did not close at corner ({x}, {y})")]
    OpenBoundary {
        /// Lattice x of the dangling corner.
        x: u32,
        /// Lattice y of the dangling corner.
        y: u32,
    },

    /// A connected component produced other than exactly one outer loop.
    #[error("component produced {outer_loops} outer boundaries, expected 1")]
    AmbiguousBoundary {
        /// Number of positively-oriented loops found.
        outer_loops: usize,
    },

    /// A hole ring extends beyond the outer ring's bounding box.
    #[error("hole {hole} lies outside its outer ring")]
    HoleOutsideOuter {
        /// Index of the offending hole.
        hole: usize,
    },

    /// Both the simplified and the original rings cross themselves.
    #[error("region self-intersects and cannot be repaired")]
    UnrecoverableSelfIntersection,

    /// A region was handed to a stage expecting another coordinate space.
    #[error("region is in {actual} space, expected {expected}")]
    UnexpectedSpace {
        /// Space the stage operates on.
        expected: CoordinateSpace,
        /// Space the region was in.
        actual: CoordinateSpace,
    },
}

/// Coordinate transform parameters are unusable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    /// Scale is NaN or infinite.
    #[error("scale {0} is not finite")]
    NonFiniteScale(f64),

    /// Scale is zero or negative.
    #[error("scale {0} must be positive")]
    NonPositiveScale(f64),

    /// An offset is NaN or infinite.
    #[error("offset ({x}, {y}) is not finite")]
    NonFiniteOffset {
        /// X offset.
        x: f64,
        /// Y offset.
        y: f64,
    },

    /// Mapping collapsed the region into invalid geometry.
    #[error("transformed geometry is invalid: {0}")]
    Collapsed(#[from] GeometryError),
}

/// A layer rule is malformed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayerRuleError {
    /// Operator or operand does not fit the attribute's type.
    #[error("rule {rule} ({layer}): {attribute} does not support `{op}` with {operand}")]
    TypeMismatch {
        /// Rule position in the list.
        rule: usize,
        /// Target layer of the rule.
        layer: String,
        /// Attribute name.
        attribute: &'static str,
        /// Operator symbol.
        op: &'static str,
        /// Operand kind (`"a number"` / `"text"`).
        operand: &'static str,
    },

    /// Numeric threshold is NaN or infinite.
    #[error("rule {rule} ({layer}): threshold {value} is not finite")]
    NonFiniteThreshold {
        /// Rule position in the list.
        rule: usize,
        /// Target layer of the rule.
        layer: String,
        /// Offending value.
        value: f64,
    },

    /// Layer name is empty, too long, or contains reserved characters.
    #[error("rule {rule}: invalid layer name {name:?}")]
    InvalidLayerName {
        /// Rule position in the list.
        rule: usize,
        /// Offending name.
        name: String,
    },

    /// Color index outside the AutoCAD Color Index range 1..=255.
    #[error("rule {rule} ({layer}): color {color} is outside 1..=255")]
    InvalidColor {
        /// Rule position in the list.
        rule: usize,
        /// Target layer of the rule.
        layer: String,
        /// Offending color index.
        color: u16,
    },

    /// The default rule carries conditions.
    #[error("default layer {layer} must not have conditions")]
    ConditionalDefault {
        /// Default layer name.
        layer: String,
    },

    /// Two layer names differ only in case and would collide in CAD.
    #[error("rule {rule}: layer {layer:?} differs from {existing:?} only in case")]
    CaseConflict {
        /// Rule position in the list; the default rule comes last.
        rule: usize,
        /// Later name.
        layer: String,
        /// Earlier name it collides with.
        existing: String,
    },
}

/// Run-level configuration failure, raised before any mask is processed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Coordinate transform parameters are invalid.
    #[error("invalid transform: {0}")]
    Transform(#[from] TransformError),

    /// A layer rule is malformed.
    #[error("invalid layer rule: {0}")]
    LayerRule(#[from] LayerRuleError),

    /// Any other parameter is out of range.
    #[error("invalid pipeline configuration: {0}")]
    Invalid(String),
}

/// Pipeline stage a mask failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStage {
    /// Reading the mask from its source.
    Load,
    /// Mask cleaning.
    Clean,
    /// Contour extraction.
    Extract,
    /// Simplification.
    Simplify,
    /// Pixel-to-CAD transform.
    Transform,
}

impl FailedStage {
    /// Lower-case stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Clean => "clean",
            Self::Extract => "extract",
            Self::Simplify => "simplify",
            Self::Transform => "transform",
        }
    }
}

impl fmt::Display for FailedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The underlying cause of a per-mask failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MaskErrorKind {
    /// Malformed input.
    #[error(transparent)]
    Input(#[from] InputError),

    /// Invalid geometry.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// The mask could not be read or decoded.
    #[error("{0}")]
    Unreadable(String),
}

/// A single mask failed; the batch carries on without it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{stage} stage failed: {kind}")]
pub struct MaskError {
    /// Stage the failure happened in.
    pub stage: FailedStage,
    /// What went wrong.
    #[source]
    pub kind: MaskErrorKind,
}

impl MaskError {
    /// Tag an error with the stage it came from.
    pub fn new(stage: FailedStage, kind: impl Into<MaskErrorKind>) -> Self {
        Self {
            stage,
            kind: kind.into(),
        }
    }
}
