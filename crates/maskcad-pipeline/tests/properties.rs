//! Property tests for the geometric stages.

#![allow(clippy::unwrap_used)]

use std::f64::consts::TAU;

use image::{GrayImage, Luma};
use maskcad_pipeline::{
    CleanedMask, ContourExtractor, ContourExtractorKind, CoordinateSpace, Point, Region, Ring,
    Transform, Winding, simplify_ring,
};
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    }
}

/// Star-shaped polygon: strictly increasing angles around a centre, so
/// the ring is simple and has non-zero area.
fn arb_star() -> impl Strategy<Value = Vec<Point>> {
    (4usize..40).prop_flat_map(|n| {
        (
            proptest::collection::vec(5.0f64..50.0, n),
            proptest::collection::vec(0.0f64..0.8, n),
        )
            .prop_map(move |(radii, jitter)| {
                let step = TAU / n as f64;
                radii
                    .iter()
                    .zip(&jitter)
                    .enumerate()
                    .map(|(i, (r, j))| {
                        let angle = (i as f64 + j) * step;
                        Point::new(100.0 + r * angle.cos(), 100.0 + r * angle.sin())
                    })
                    .collect()
            })
    })
}

fn rect(x0: f64, y0: f64, w: f64, h: f64, reverse: bool) -> Ring {
    let mut points = vec![
        Point::new(x0, y0),
        Point::new(x0 + w, y0),
        Point::new(x0 + w, y0 + h),
        Point::new(x0, y0 + h),
    ];
    if reverse {
        points.reverse();
    }
    Ring::new(points).unwrap()
}

fn cleaned(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> CleanedMask {
    let image = GrayImage::from_fn(width, height, |x, y| Luma([if f(x, y) { 255 } else { 0 }]));
    CleanedMask::new(image, 1.0, None)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn inverse_transform_recovers_pixel(
        scale in 1e-3f64..1e3,
        offset_x in -1e3f64..1e3,
        offset_y in -1e3f64..1e3,
        x in 0.0f64..1e4,
        y in 0.0f64..1e4,
        height in 1.0f64..1e4,
    ) {
        let transform = Transform::new(scale, offset_x, offset_y).unwrap();
        let p = Point::new(x, y);
        let back = transform.invert_point(transform.apply_point(p, height), height);
        prop_assert!(close(back.x, p.x), "{back:?} != {p:?}");
        prop_assert!(close(back.y, p.y), "{back:?} != {p:?}");
    }

    #[test]
    fn cad_windings_are_normalized(
        x0 in 0.0f64..100.0,
        y0 in 0.0f64..100.0,
        w in 10.0f64..100.0,
        h in 10.0f64..100.0,
        reverse_outer in any::<bool>(),
        reverse_hole in any::<bool>(),
        scale in 0.01f64..10.0,
    ) {
        let outer = rect(x0, y0, w, h, reverse_outer);
        let hole = rect(x0 + 2.0, y0 + 2.0, w - 4.0, h - 4.0, reverse_hole);
        let region = Region::new(outer, vec![hole], CoordinateSpace::Pixel).unwrap();

        let cad = Transform::new(scale, 0.0, 0.0).unwrap().apply(&region, 250.0).unwrap();
        prop_assert_eq!(cad.space(), CoordinateSpace::Cad);
        prop_assert_eq!(cad.outer().winding(CoordinateSpace::Cad), Winding::Clockwise);
        prop_assert_eq!(cad.holes()[0].winding(CoordinateSpace::Cad), Winding::CounterClockwise);
        // Y up: clockwise is a negative shoelace sum.
        prop_assert!(cad.outer().signed_area() < 0.0);
        prop_assert!(cad.holes()[0].signed_area() > 0.0);
    }

    #[test]
    fn zero_epsilon_keeps_every_vertex(points in arb_star()) {
        let ring = Ring::new(points).unwrap();
        prop_assert_eq!(simplify_ring(&ring, 0.0), ring);
    }

    #[test]
    fn simplify_only_removes_vertices(points in arb_star(), epsilon in 0.0f64..60.0) {
        let ring = Ring::new(points).unwrap();
        let simplified = simplify_ring(&ring, epsilon);
        prop_assert!(simplified.len() <= ring.len());
        prop_assert!(simplified.len() >= Ring::MIN_VERTICES);
        prop_assert!(simplified.area() > 0.0);
        prop_assert!(simplified.points().iter().all(|p| ring.points().contains(p)));
    }

    #[test]
    fn traced_rectangle_area_matches_pixels(
        x0 in 0u32..20,
        y0 in 0u32..20,
        w in 2u32..20,
        h in 2u32..20,
    ) {
        let mask = cleaned(48, 48, |x, y| (x0..x0 + w).contains(&x) && (y0..y0 + h).contains(&y));
        let extraction = ContourExtractorKind::default().extract(&mask).unwrap();
        prop_assert_eq!(extraction.regions.len(), 1);
        let region = &extraction.regions[0];
        prop_assert!(region.holes().is_empty());
        prop_assert_eq!(region.area(), f64::from(w * h));
        prop_assert_eq!(region.outer().winding(CoordinateSpace::Pixel), Winding::Clockwise);
    }

    #[test]
    fn traced_frame_has_one_hole(
        x0 in 0u32..10,
        y0 in 0u32..10,
        w in 5u32..30,
        h in 5u32..30,
        border in 1u32..3,
    ) {
        prop_assume!(w > 2 * border && h > 2 * border);
        let inside = |x: u32, y: u32| (x0..x0 + w).contains(&x) && (y0..y0 + h).contains(&y);
        let in_hole = |x: u32, y: u32| {
            (x0 + border..x0 + w - border).contains(&x) && (y0 + border..y0 + h - border).contains(&y)
        };
        let mask = cleaned(48, 48, |x, y| inside(x, y) && !in_hole(x, y));

        let extraction = ContourExtractorKind::default().extract(&mask).unwrap();
        prop_assert_eq!(extraction.regions.len(), 1);
        let region = &extraction.regions[0];
        prop_assert_eq!(region.holes().len(), 1);
        let hole_area = (w - 2 * border) * (h - 2 * border);
        prop_assert_eq!(region.area(), f64::from(w * h - hole_area));
        prop_assert_eq!(
            region.holes()[0].winding(CoordinateSpace::Pixel),
            Winding::CounterClockwise
        );
    }
}
