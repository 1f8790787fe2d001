//! Region simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Each ring is treated as a closed path: the first vertex and the vertex
//! farthest from it split the ring into two open chains, and each chain is
//! reduced independently. Simplifying rings one at a time can make them
//! cross each other or leave a hole outside the outer ring, so the
//! simplified region is checked for crossings with an R*-tree over its
//! edges and rebuilt through [`Region::new`], which rejects holes outside
//! the outer ring. A region that fails either check falls back to its
//! original rings.

use geo::Line;
use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use rstar::primitives::GeomWithData;
use rstar::{RTree, RTreeObject};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::types::{Point, Region, Ring};

/// How far a vertex may stray from the simplified outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimplifyTolerance {
    /// Absolute distance in pixels.
    Pixels(f64),
    /// Fraction of each ring's own perimeter.
    PerimeterFraction(f64),
}

impl Default for SimplifyTolerance {
    fn default() -> Self {
        Self::Pixels(1.0)
    }
}

impl SimplifyTolerance {
    /// Check the value is usable.
    ///
    /// # Errors
    ///
    /// Returns a description if the value is NaN or infinite.
    pub fn validate(self) -> Result<(), String> {
        let value = self.value();
        if value.is_finite() {
            Ok(())
        } else {
            Err(format!("simplify tolerance {value} is not finite"))
        }
    }

    const fn value(self) -> f64 {
        match self {
            Self::Pixels(v) | Self::PerimeterFraction(v) => v,
        }
    }

    /// A non-positive tolerance leaves every ring untouched.
    #[must_use]
    pub fn is_noop(self) -> bool {
        self.value() <= 0.0
    }

    /// Pixel tolerance to use for `ring`.
    #[must_use]
    pub fn for_ring(self, ring: &Ring) -> f64 {
        match self {
            Self::Pixels(v) => v,
            Self::PerimeterFraction(f) => f * ring.perimeter(),
        }
    }
}

/// Result of [`simplify_region`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimplifyOutcome {
    /// The simplified region, or the original one after a fallback.
    pub region: Region,
    /// The simplified rings crossed and were discarded.
    pub fell_back: bool,
}

/// Simplify a region with an absolute pixel tolerance.
///
/// `epsilon_px <= 0` returns the region unchanged.
///
/// # Errors
///
/// Returns [`GeometryError::UnrecoverableSelfIntersection`] if the
/// simplified rings cross and the original rings cross as well.
pub fn simplify(region: &Region, epsilon_px: f64) -> Result<Region, GeometryError> {
    simplify_region(region, SimplifyTolerance::Pixels(epsilon_px)).map(|outcome| outcome.region)
}

/// Simplify every ring of a region, falling back to the original rings if
/// the result crosses itself or a hole ends up outside the outer ring.
///
/// # Errors
///
/// Returns [`GeometryError::UnrecoverableSelfIntersection`] if both the
/// simplified and the original rings cross.
pub fn simplify_region(
    region: &Region,
    tolerance: SimplifyTolerance,
) -> Result<SimplifyOutcome, GeometryError> {
    if tolerance.is_noop() {
        return Ok(SimplifyOutcome {
            region: region.clone(),
            fell_back: false,
        });
    }

    let outer = simplify_ring(region.outer(), tolerance.for_ring(region.outer()));
    let holes = region
        .holes()
        .iter()
        .map(|hole| simplify_ring(hole, tolerance.for_ring(hole)))
        .collect();

    if let Ok(simplified) = Region::new(outer, holes, region.space())
        && !has_crossings(&simplified)
    {
        return Ok(SimplifyOutcome {
            region: simplified,
            fell_back: false,
        });
    }

    if has_crossings(region) {
        return Err(GeometryError::UnrecoverableSelfIntersection);
    }
    tracing::warn!(
        vertices = region.vertex_count(),
        "simplified region is invalid, keeping original rings"
    );
    Ok(SimplifyOutcome {
        region: region.clone(),
        fell_back: true,
    })
}

/// Simplify a single closed ring.
///
/// Vertices within `tolerance` of the simplified outline are removed. A
/// ring that would drop below three vertices, collapse to zero area or
/// flip its orientation is returned unchanged.
#[must_use = "returns the simplified ring"]
pub fn simplify_ring(ring: &Ring, tolerance: f64) -> Ring {
    let points = ring.points();
    if tolerance.is_nan() || tolerance <= 0.0 || points.len() <= Ring::MIN_VERTICES {
        return ring.clone();
    }

    let anchor = points[0];
    let far = (1..points.len())
        .max_by(|&i, &j| {
            anchor
                .distance_squared(points[i])
                .total_cmp(&anchor.distance_squared(points[j]))
        })
        .unwrap_or(1);

    // Close the ring so the second chain ends back at the anchor.
    let mut chain = points.to_vec();
    chain.push(anchor);
    let last = chain.len() - 1;

    let mut kept = vec![false; chain.len()];
    kept[0] = true;
    kept[far] = true;
    kept[last] = true;
    rdp(&chain, &mut kept, &[(0, far), (far, last)], tolerance);

    let simplified: Vec<Point> = chain[..last]
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();
    if simplified.len() < Ring::MIN_VERTICES {
        return ring.clone();
    }

    match Ring::new(simplified) {
        Ok(r) if r.signed_area().signum() == ring.signed_area().signum() => r,
        _ => ring.clone(),
    }
}

/// Iterative Ramer-Douglas-Peucker over the given index spans.
fn rdp(points: &[Point], kept: &mut [bool], spans: &[(usize, usize)], tolerance: f64) {
    let mut stack = spans.to_vec();
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_idx = start;
        for i in (start + 1)..end {
            let d = perpendicular_distance(points[i], points[start], points[end]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }

        if max_dist > tolerance {
            kept[max_idx] = true;
            stack.push((start, max_idx));
            stack.push((max_idx, end));
        }
    }
}

/// Perpendicular distance from `p` to the line through `a` and `b`, or the
/// distance to `a` when the two coincide.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}

/// Identifies an edge within a region: ring 0 is the outer boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EdgeId {
    ring: usize,
    edge: usize,
}

type IndexedEdge = GeomWithData<Line<f64>, EdgeId>;

const fn point_to_coord(p: Point) -> geo::Coord<f64> {
    geo::Coord { x: p.x, y: p.y }
}

/// Whether any two edges of the region cross properly or overlap along a
/// stretch of positive length. Shared vertices and touching endpoints do
/// not count.
#[must_use]
pub fn has_crossings(region: &Region) -> bool {
    let ring_lens: Vec<usize> = region.rings().map(Ring::len).collect();
    let edges: Vec<IndexedEdge> = region
        .rings()
        .enumerate()
        .flat_map(|(ring, r)| {
            r.edges().enumerate().map(move |(edge, (a, b))| {
                GeomWithData::new(
                    Line::new(point_to_coord(a), point_to_coord(b)),
                    EdgeId { ring, edge },
                )
            })
        })
        .collect();
    let tree = RTree::bulk_load(edges.clone());

    edges.iter().any(|e| {
        tree.locate_in_envelope_intersecting(&e.envelope())
            .any(|other| {
                let (a, b) = (e.data, other.data);
                if b <= a {
                    return false;
                }
                let n = ring_lens[a.ring];
                let adjacent =
                    a.ring == b.ring && ((a.edge + 1) % n == b.edge || (b.edge + 1) % n == a.edge);
                crosses(*e.geom(), *other.geom(), adjacent)
            })
    })
}

fn crosses(p: Line<f64>, q: Line<f64>, adjacent: bool) -> bool {
    match line_intersection(p, q) {
        Some(LineIntersection::SinglePoint { is_proper, .. }) => is_proper && !adjacent,
        Some(LineIntersection::Collinear { intersection }) => intersection.start != intersection.end,
        None => false,
    }
}
