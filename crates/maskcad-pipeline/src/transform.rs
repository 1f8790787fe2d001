//! Pixel-to-CAD coordinate mapping.
//!
//! `x' = (x - offset_x) * scale`, `y' = (image_height - y - offset_y) * scale`.
//! The Y flip moves the origin to the bottom-left corner; winding is
//! re-normalized for CAD space after mapping.

use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, TransformError};
use crate::types::{CoordinateSpace, Point, Region};

/// Raw transform parameters as they appear in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// CAD units per pixel.
    pub scale: f64,
    /// Pixel x mapped to CAD x = 0.
    pub offset_x: f64,
    /// Pixel distance from the bottom edge mapped to CAD y = 0.
    pub offset_y: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// A validated affine map from pixel to CAD space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Transform {
    /// Scale 1, no offset.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Validate transform parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] if `scale` is not finite and positive or
    /// an offset is not finite.
    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Result<Self, TransformError> {
        if !scale.is_finite() {
            return Err(TransformError::NonFiniteScale(scale));
        }
        if scale <= 0.0 {
            return Err(TransformError::NonPositiveScale(scale));
        }
        if !offset_x.is_finite() || !offset_y.is_finite() {
            return Err(TransformError::NonFiniteOffset {
                x: offset_x,
                y: offset_y,
            });
        }
        Ok(Self {
            scale,
            offset_x,
            offset_y,
        })
    }

    /// Validate a [`TransformConfig`].
    ///
    /// # Errors
    ///
    /// See [`Transform::new`].
    pub fn from_config(config: &TransformConfig) -> Result<Self, TransformError> {
        Self::new(config.scale, config.offset_x, config.offset_y)
    }

    /// CAD units per pixel.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Map one pixel-space point.
    #[must_use]
    pub fn apply_point(&self, p: Point, image_height: f64) -> Point {
        Point::new(
            (p.x - self.offset_x) * self.scale,
            (image_height - p.y - self.offset_y) * self.scale,
        )
    }

    /// Map one CAD-space point back to pixel space.
    #[must_use]
    pub fn invert_point(&self, p: Point, image_height: f64) -> Point {
        Point::new(
            p.x / self.scale + self.offset_x,
            image_height - self.offset_y - p.y / self.scale,
        )
    }

    /// Map a pixel-space region into CAD space.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnexpectedSpace`] for a region already in
    /// CAD space, or another [`GeometryError`] if the mapped rings are no
    /// longer valid polygons.
    pub fn apply(&self, region: &Region, image_height: f64) -> Result<Region, GeometryError> {
        if region.space() != CoordinateSpace::Pixel {
            return Err(GeometryError::UnexpectedSpace {
                expected: CoordinateSpace::Pixel,
                actual: region.space(),
            });
        }
        region.map_points(CoordinateSpace::Cad, |p| self.apply_point(p, image_height))
    }
}

/// Map a pixel-space region into CAD space with ad-hoc parameters.
///
/// # Errors
///
/// Returns [`TransformError`] for invalid parameters or when the mapped
/// geometry collapses.
pub fn transform(
    region: &Region,
    image_height: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
) -> Result<Region, TransformError> {
    let t = Transform::new(scale, offset_x, offset_y)?;
    Ok(t.apply(region, image_height)?)
}
