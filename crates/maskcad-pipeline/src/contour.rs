//! Contour extraction: turn a cleaned binary mask into polygon regions.
//!
//! This module defines the [`ContourExtractor`] trait for pluggable
//! extraction algorithms and the [`ContourExtractorKind`] enum for
//! selecting one at runtime.
//!
//! # Crack following
//!
//! The default algorithm walks the cracks between foreground and
//! background pixels rather than the pixel centres. Every boundary edge of
//! a foreground pixel becomes a directed edge on the pixel-corner lattice,
//! oriented so the foreground lies on its right (Y down). Linking those
//! edges head-to-tail yields closed loops:
//!
//! - the outer boundary of a component has positive shoelace area,
//! - every hole boundary has negative shoelace area.
//!
//! Where two foreground pixels touch only at a corner, the corner has two
//! incoming and two outgoing edges. Taking the left-most exit keeps the
//! 8-connected foreground on one loop and separates the 4-connected
//! background, matching the connectivity used for labelling.

use std::collections::HashMap;

use image::Luma;
use imageproc::region_labelling::{Connectivity, connected_components};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::mask::CleanedMask;
use crate::types::{CoordinateSpace, Point, Region, Ring};

/// Components with fewer pixels than this cannot form a useful polygon.
pub const MIN_COMPONENT_PIXELS: usize = 3;

/// Output of a [`ContourExtractor`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    /// Regions in raster order of each component's first pixel.
    pub regions: Vec<Region>,
    /// Components dropped for having fewer than [`MIN_COMPONENT_PIXELS`].
    pub degenerate_components: usize,
}

/// Trait for contour extraction strategies.
///
/// Input: a cleaned binary mask. Output: one pixel-space [`Region`] per
/// 8-connected foreground component, outer ring clockwise and holes
/// counter-clockwise.
pub trait ContourExtractor: Send + Sync {
    /// Extract regions from the given mask.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] if the traced boundaries do not form
    /// valid polygons.
    fn extract(&self, mask: &CleanedMask) -> Result<Extraction, GeometryError>;
}

/// Selects which extraction algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourExtractorKind {
    /// Crack following on the pixel-corner lattice.
    #[default]
    CrackFollowing,
}

impl ContourExtractor for ContourExtractorKind {
    fn extract(&self, mask: &CleanedMask) -> Result<Extraction, GeometryError> {
        match *self {
            Self::CrackFollowing => extract_crack_following(mask),
        }
    }
}

/// Lattice corner `(x, y)`; pixel `(x, y)` spans corners `(x, y)..(x+1, y+1)`.
type Corner = (u32, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    East,
    South,
    West,
    North,
}

impl Direction {
    const fn index(self) -> usize {
        match self {
            Self::East => 0,
            Self::South => 1,
            Self::West => 2,
            Self::North => 3,
        }
    }

    /// Left turn with Y down.
    const fn left(self) -> Self {
        match self {
            Self::East => Self::North,
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
        }
    }

    const fn right(self) -> Self {
        match self {
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
            Self::North => Self::East,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Crack {
    from: Corner,
    dir: Direction,
}

impl Crack {
    const fn to(self) -> Corner {
        let (x, y) = self.from;
        match self.dir {
            Direction::East => (x + 1, y),
            Direction::South => (x, y + 1),
            Direction::West => (x - 1, y),
            Direction::North => (x, y - 1),
        }
    }
}

fn extract_crack_following(mask: &CleanedMask) -> Result<Extraction, GeometryError> {
    let labels = connected_components(mask.image(), Connectivity::Eight, Luma([0u8]));
    let (width, height) = labels.dimensions();

    // Group pixels by component, ordered by each component's first pixel.
    let mut slots: HashMap<u32, usize> = HashMap::new();
    let mut components: Vec<(u32, Vec<Corner>)> = Vec::new();
    for (x, y, Luma([label])) in labels.enumerate_pixels() {
        if *label == 0 {
            continue;
        }
        let slot = *slots.entry(*label).or_insert_with(|| {
            components.push((*label, Vec::new()));
            components.len() - 1
        });
        components[slot].1.push((x, y));
    }

    let mut extraction = Extraction::default();
    for (label, pixels) in &components {
        if pixels.len() < MIN_COMPONENT_PIXELS {
            extraction.degenerate_components += 1;
            continue;
        }

        let member = |x: u32, y: u32| x < width && y < height && labels.get_pixel(x, y)[0] == *label;

        let mut cracks = Vec::with_capacity(pixels.len() * 2);
        for &(x, y) in pixels {
            if y == 0 || !member(x, y - 1) {
                cracks.push(Crack {
                    from: (x, y),
                    dir: Direction::East,
                });
            }
            if !member(x + 1, y) {
                cracks.push(Crack {
                    from: (x + 1, y),
                    dir: Direction::South,
                });
            }
            if !member(x, y + 1) {
                cracks.push(Crack {
                    from: (x + 1, y + 1),
                    dir: Direction::West,
                });
            }
            if x == 0 || !member(x - 1, y) {
                cracks.push(Crack {
                    from: (x, y + 1),
                    dir: Direction::North,
                });
            }
        }

        extraction.regions.push(assemble_region(link_loops(&cracks)?)?);
    }

    tracing::debug!(
        regions = extraction.regions.len(),
        degenerate = extraction.degenerate_components,
        "contours extracted"
    );
    Ok(extraction)
}

/// Link directed cracks into closed loops, dropping collinear corners.
fn link_loops(cracks: &[Crack]) -> Result<Vec<Vec<Point>>, GeometryError> {
    let mut exits: HashMap<Corner, [Option<usize>; 4]> = HashMap::with_capacity(cracks.len());
    for (i, crack) in cracks.iter().enumerate() {
        exits.entry(crack.from).or_default()[crack.dir.index()] = Some(i);
    }

    let mut used = vec![false; cracks.len()];
    let mut loops = Vec::new();
    for start in 0..cracks.len() {
        if used[start] {
            continue;
        }
        let mut walk = Vec::new();
        let mut current = start;
        loop {
            used[current] = true;
            let crack = cracks[current];
            walk.push(crack);

            let at = crack.to();
            let next = exits
                .get(&at)
                .and_then(|out| {
                    [crack.dir.left(), crack.dir, crack.dir.right()]
                        .into_iter()
                        .find_map(|d| out[d.index()])
                })
                .ok_or(GeometryError::OpenBoundary { x: at.0, y: at.1 })?;
            if next == start {
                break;
            }
            if used[next] {
                return Err(GeometryError::OpenBoundary { x: at.0, y: at.1 });
            }
            current = next;
        }
        loops.push(corners(&walk));
    }
    Ok(loops)
}

/// Keep only the corners where the walk changes direction.
fn corners(walk: &[Crack]) -> Vec<Point> {
    let n = walk.len();
    (0..n)
        .filter(|&i| walk[i].dir != walk[(i + n - 1) % n].dir)
        .map(|i| {
            let (x, y) = walk[i].from;
            Point::new(f64::from(x), f64::from(y))
        })
        .collect()
}

/// Pair one outer loop with the component's hole loops.
fn assemble_region(loops: Vec<Vec<Point>>) -> Result<Region, GeometryError> {
    let mut outers = Vec::new();
    let mut holes = Vec::new();
    for points in loops {
        let ring = Ring::new(points)?;
        if ring.signed_area() > 0.0 {
            outers.push(ring);
        } else {
            holes.push(ring);
        }
    }
    if outers.len() != 1 {
        return Err(GeometryError::AmbiguousBoundary {
            outer_loops: outers.len(),
        });
    }
    let outer = outers.swap_remove(0);
    Region::new(outer, holes, CoordinateSpace::Pixel)
}
