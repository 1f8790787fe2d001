//! Shared geometric types for the maskcad pipeline.

use std::fmt;

use geo::{Centroid, Contains, InteriorPoint};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Re-export `GrayImage` so downstream crates can build masks without
/// depending on `image` directly.
pub use image::GrayImage;

/// A 2D point. Pixel space until the transform stage, CAD units after.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new set of dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Which way the Y axis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Raster space: origin top-left, Y grows downward.
    Pixel,
    /// Drawing space: origin bottom-left, Y grows upward.
    Cad,
}

impl fmt::Display for CoordinateSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pixel => f.write_str("pixel"),
            Self::Cad => f.write_str("CAD"),
        }
    }
}

/// Visual orientation of a ring, judged in a given [`CoordinateSpace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winding {
    /// Clockwise as seen on screen (pixel) or on paper (CAD).
    Clockwise,
    /// Counter-clockwise.
    CounterClockwise,
}

impl Winding {
    /// The other orientation.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Clockwise => Self::CounterClockwise,
            Self::CounterClockwise => Self::Clockwise,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    /// Smallest x.
    pub min_x: f64,
    /// Smallest y.
    pub min_y: f64,
    /// Largest x.
    pub max_x: f64,
    /// Largest y.
    pub max_y: f64,
}

impl Bounds {
    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// `other` lies entirely within `self` (edges may touch).
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.min_x >= self.min_x
            && other.min_y >= self.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }

    /// Smallest box covering both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// A closed polygon boundary.
///
/// The closing edge from the last vertex back to the first is implicit;
/// the first vertex is never repeated. Construction guarantees at least
/// three distinct finite vertices and a non-zero enclosed area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ring(Vec<Point>);

impl Ring {
    /// Fewest vertices a ring may have.
    pub const MIN_VERTICES: usize = 3;

    /// Validate and wrap a vertex list.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonFiniteCoordinate`] for NaN or infinite
    /// coordinates, [`GeometryError::DegenerateRing`] when fewer than three
    /// distinct vertices remain, and [`GeometryError::ZeroArea`] when all
    /// vertices are collinear.
    pub fn new(points: Vec<Point>) -> Result<Self, GeometryError> {
        if let Some(p) = points.iter().find(|p| !p.is_finite()) {
            return Err(GeometryError::NonFiniteCoordinate { x: p.x, y: p.y });
        }

        let distinct = distinct_count(&points);
        if distinct < Self::MIN_VERTICES {
            return Err(GeometryError::DegenerateRing { distinct });
        }

        let ring = Self(points);
        if ring.signed_area() == 0.0 {
            return Err(GeometryError::ZeroArea);
        }
        Ok(ring)
    }

    /// Number of vertices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The vertices in order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consume the ring and return its vertices.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Edges as `(start, end)` pairs, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.0.len();
        (0..n).map(move |i| (self.0[i], self.0[(i + 1) % n]))
    }

    /// Shoelace area. Positive when the vertices turn from +x toward +y.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        let twice: f64 = self
            .edges()
            .map(|(a, b)| a.x.mul_add(b.y, -(b.x * a.y)))
            .sum();
        twice / 2.0
    }

    /// Unsigned enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Closed perimeter length.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        self.edges().map(|(a, b)| a.distance(b)).sum()
    }

    /// Visual orientation in `space`.
    ///
    /// With Y down a positive shoelace area is clockwise on screen; with
    /// Y up the same sign is counter-clockwise.
    #[must_use]
    pub fn winding(&self, space: CoordinateSpace) -> Winding {
        let positive = self.signed_area() > 0.0;
        match (space, positive) {
            (CoordinateSpace::Pixel, true) | (CoordinateSpace::Cad, false) => Winding::Clockwise,
            (CoordinateSpace::Pixel, false) | (CoordinateSpace::Cad, true) => {
                Winding::CounterClockwise
            }
        }
    }

    /// The same ring traversed the other way, keeping the first vertex.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut points = self.0.clone();
        points[1..].reverse();
        Self(points)
    }

    /// Reverse if needed so the ring has `winding` in `space`.
    #[must_use]
    pub fn with_winding(self, winding: Winding, space: CoordinateSpace) -> Self {
        if self.winding(space) == winding {
            self
        } else {
            self.reversed()
        }
    }

    /// Axis-aligned bounding box.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let first = self.0[0];
        self.0.iter().fold(
            Bounds {
                min_x: first.x,
                min_y: first.y,
                max_x: first.x,
                max_y: first.y,
            },
            |b, p| Bounds {
                min_x: b.min_x.min(p.x),
                min_y: b.min_y.min(p.y),
                max_x: b.max_x.max(p.x),
                max_y: b.max_y.max(p.y),
            },
        )
    }

    /// The ring as a `geo` polygon without holes.
    #[must_use]
    pub fn to_polygon(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(self.line_string(), Vec::new())
    }

    fn line_string(&self) -> geo::LineString<f64> {
        self.0.iter().map(|p| geo::Coord { x: p.x, y: p.y }).collect()
    }
}

fn distinct_count(points: &[Point]) -> usize {
    let mut sorted: Vec<Point> = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    sorted.len()
}

/// Whether a point strictly inside `hole` lies inside `shell`.
fn encloses(shell: &geo::Polygon<f64>, hole: &Ring) -> bool {
    hole.to_polygon()
        .interior_point()
        .is_some_and(|p| shell.contains(&p))
}

/// One outer boundary plus its holes.
///
/// Construction normalizes orientation for the region's space: the outer
/// ring runs clockwise and every hole counter-clockwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    outer: Ring,
    holes: Vec<Ring>,
    space: CoordinateSpace,
}

impl Region {
    /// Build a region, normalizing winding.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::HoleOutsideOuter`] if a hole does not lie
    /// inside the outer ring. Holes are assumed not to cross the outer
    /// ring, so one interior point of the hole decides.
    pub fn new(
        outer: Ring,
        holes: Vec<Ring>,
        space: CoordinateSpace,
    ) -> Result<Self, GeometryError> {
        let outer = outer.with_winding(Winding::Clockwise, space);
        let outer_bounds = outer.bounds();
        let shell = outer.to_polygon();
        let holes = holes
            .into_iter()
            .enumerate()
            .map(|(hole, ring)| {
                if outer_bounds.contains(&ring.bounds()) && encloses(&shell, &ring) {
                    Ok(ring.with_winding(Winding::CounterClockwise, space))
                } else {
                    Err(GeometryError::HoleOutsideOuter { hole })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            outer,
            holes,
            space,
        })
    }

    /// The outer boundary.
    #[must_use]
    pub const fn outer(&self) -> &Ring {
        &self.outer
    }

    /// Hole boundaries.
    #[must_use]
    pub fn holes(&self) -> &[Ring] {
        &self.holes
    }

    /// Coordinate space the vertices are expressed in.
    #[must_use]
    pub const fn space(&self) -> CoordinateSpace {
        self.space
    }

    /// Outer ring followed by every hole.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }

    /// Total vertices over all rings.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.rings().map(Ring::len).sum()
    }

    /// Outer area minus hole areas.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.holes
            .iter()
            .fold(self.outer.area(), |area, hole| area - hole.area())
    }

    /// Bounding box of the outer ring.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.outer.bounds()
    }

    /// A point inside the region for placing a label: the area centroid
    /// when it falls inside, otherwise an interior point.
    #[must_use]
    pub fn label_point(&self) -> Point {
        let polygon = geo::Polygon::new(
            self.outer.line_string(),
            self.holes.iter().map(Ring::line_string).collect(),
        );
        polygon
            .centroid()
            .filter(|c| polygon.contains(c))
            .or_else(|| polygon.interior_point())
            .map_or_else(
                || {
                    let b = self.bounds();
                    Point::new((b.min_x + b.max_x) / 2.0, (b.min_y + b.max_y) / 2.0)
                },
                |p| Point::new(p.x(), p.y()),
            )
    }

    /// Rebuild the region with every vertex mapped through `f`, landing in
    /// `space`. Winding is re-normalized for the new space.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] if the mapped rings are no longer valid.
    pub fn map_points(
        &self,
        space: CoordinateSpace,
        f: impl Fn(Point) -> Point,
    ) -> Result<Self, GeometryError> {
        let map_ring = |ring: &Ring| Ring::new(ring.points().iter().map(|&p| f(p)).collect());
        let outer = map_ring(&self.outer)?;
        let holes = self
            .holes
            .iter()
            .map(map_ring)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(outer, holes, space)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        Ring::new(vec![
            Point::new(x0, y0),
            Point::new(x0 + size, y0),
            Point::new(x0 + size, y0 + size),
            Point::new(x0, y0 + size),
        ])
        .unwrap()
    }

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ring_rejects_two_distinct_points() {
        let err = Ring::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 0.0),
        ])
        .unwrap_err();
        assert_eq!(err, GeometryError::DegenerateRing { distinct: 2 });
    }

    #[test]
    fn ring_rejects_nan() {
        let err = Ring::new(vec![
            Point::new(0.0, 0.0),
            Point::new(f64::NAN, 0.0),
            Point::new(1.0, 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, GeometryError::NonFiniteCoordinate { .. }));
    }

    #[test]
    fn ring_rejects_collinear() {
        let err = Ring::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
        ])
        .unwrap_err();
        assert_eq!(err, GeometryError::ZeroArea);
    }

    #[test]
    fn signed_area_of_y_down_clockwise_square_is_positive() {
        let ring = square(0.0, 0.0, 2.0);
        assert!((ring.signed_area() - 4.0).abs() < f64::EPSILON);
        assert_eq!(ring.winding(CoordinateSpace::Pixel), Winding::Clockwise);
        assert_eq!(ring.winding(CoordinateSpace::Cad), Winding::CounterClockwise);
    }

    #[test]
    fn reversed_keeps_first_vertex() {
        let ring = square(0.0, 0.0, 1.0);
        let rev = ring.reversed();
        assert_eq!(rev.points()[0], ring.points()[0]);
        assert_eq!(rev.points()[1], ring.points()[3]);
        assert!((rev.signed_area() + ring.signed_area()).abs() < f64::EPSILON);
    }

    #[test]
    fn perimeter_of_unit_square() {
        assert!((square(5.0, 5.0, 1.0).perimeter() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn region_normalizes_winding_per_space() {
        let outer = square(0.0, 0.0, 10.0).reversed();
        let hole = square(2.0, 2.0, 2.0);
        for space in [CoordinateSpace::Pixel, CoordinateSpace::Cad] {
            let region = Region::new(outer.clone(), vec![hole.clone()], space).unwrap();
            assert_eq!(region.outer().winding(space), Winding::Clockwise);
            assert_eq!(region.holes()[0].winding(space), Winding::CounterClockwise);
        }
    }

    #[test]
    fn region_area_subtracts_holes() {
        let region = Region::new(
            square(0.0, 0.0, 10.0),
            vec![square(2.0, 2.0, 2.0), square(6.0, 6.0, 1.0)],
            CoordinateSpace::Pixel,
        )
        .unwrap();
        assert!((region.area() - 95.0).abs() < f64::EPSILON);
        assert_eq!(region.vertex_count(), 12);
    }

    #[test]
    fn region_rejects_hole_outside_outer() {
        let err = Region::new(
            square(0.0, 0.0, 10.0),
            vec![square(8.0, 8.0, 4.0)],
            CoordinateSpace::Pixel,
        )
        .unwrap_err();
        assert_eq!(err, GeometryError::HoleOutsideOuter { hole: 0 });
    }

    fn l_shape() -> Ring {
        Ring::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 20.0),
            Point::new(30.0, 20.0),
            Point::new(30.0, 30.0),
            Point::new(0.0, 30.0),
        ])
        .unwrap()
    }

    #[test]
    fn region_rejects_hole_in_notch_of_outer() {
        // Inside the outer bounding box, outside the outer ring.
        let err = Region::new(l_shape(), vec![square(19.0, 18.0, 1.0)], CoordinateSpace::Pixel)
            .unwrap_err();
        assert_eq!(err, GeometryError::HoleOutsideOuter { hole: 0 });
        assert!(
            Region::new(l_shape(), vec![square(19.0, 24.0, 1.0)], CoordinateSpace::Pixel).is_ok()
        );
    }

    #[test]
    fn label_point_lies_inside_region() {
        let region = Region::new(l_shape(), Vec::new(), CoordinateSpace::Pixel).unwrap();
        let p = region.label_point();
        let inside = (p.x > 0.0 && p.x < 10.0 && p.y > 0.0 && p.y < 30.0)
            || (p.x > 0.0 && p.x < 30.0 && p.y > 20.0 && p.y < 30.0);
        assert!(inside, "{p:?}");

        let square_region =
            Region::new(square(0.0, 0.0, 10.0), Vec::new(), CoordinateSpace::Cad).unwrap();
        let c = square_region.label_point();
        assert!((c.x - 5.0).abs() < 1e-9 && (c.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn bounds_contains_and_union() {
        let a = square(0.0, 0.0, 4.0).bounds();
        let b = square(1.0, 1.0, 1.0).bounds();
        assert!(a.contains(&b));
        assert!(!b.contains(&a));
        let u = b.union(&square(5.0, 5.0, 1.0).bounds());
        assert!((u.width() - 5.0).abs() < f64::EPSILON);
        assert!((u.height() - 5.0).abs() < f64::EPSILON);
    }
}
