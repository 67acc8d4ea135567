//! Property-based tests for cropping and dumping.
//!
//! Run with: cargo test -p scan-pipeline -- proptest

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use proptest::prelude::*;
use scan_engine::NullEngine;
use scan_io::{pack, unpack, RECORD_SIZE};
use scan_pipeline::{Axis, Cut, Direction, PipelineConfig, ScanPipeline};
use scan_types::{PairedCloud, Point, ScanColor};

// =============================================================================
// Strategies
// =============================================================================

fn arb_point() -> impl Strategy<Value = Point> {
    (
        prop::array::uniform3(-100.0..100.0f32),
        prop::array::uniform3(any::<u8>()),
    )
        .prop_map(|([x, y, z], [r, g, b])| Point::new(x, y, z, ScanColor::new(r, g, b)))
}

fn arb_side(max: usize) -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec(arb_point(), 0..=max)
}

fn arb_axis() -> impl Strategy<Value = Axis> {
    prop_oneof![
        Just(Axis::X),
        Just(Axis::Y),
        Just(Axis::Z),
        Just(Axis::Radial),
    ]
}

fn coord(point: &Point, axis: Axis) -> f64 {
    match axis {
        Axis::X => f64::from(point.x()),
        Axis::Y => f64::from(point.y()),
        Axis::Z => f64::from(point.z()),
        Axis::Radial => {
            let (x, y) = (f64::from(point.x()), f64::from(point.y()));
            x * x + y * y
        }
    }
}

fn pipeline_with(left: &[Point], right: &[Point]) -> ScanPipeline {
    let mut pipeline = ScanPipeline::new(Box::new(NullEngine), PipelineConfig::default());
    pipeline.upload("c", &pack(left), &pack(right)).unwrap();
    pipeline
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_cut_results_satisfy_predicate(
        points in arb_side(40),
        axis in arb_axis(),
        threshold in -50.0..50.0f64,
        greater in any::<bool>(),
    ) {
        let direction = Direction::from(greater);
        let kept = Cut::new(axis, direction, threshold).apply(&points);
        let bound = if axis == Axis::Radial { threshold * threshold } else { threshold };

        for p in &kept {
            let value = coord(p, axis);
            match direction {
                Direction::GreaterOrEqual => prop_assert!(value >= bound),
                Direction::LessOrEqual => prop_assert!(value <= bound),
            }
        }
    }

    #[test]
    fn proptest_cut_is_ordered_subset(
        points in arb_side(40),
        axis in arb_axis(),
        threshold in -50.0..50.0f64,
    ) {
        let kept = Cut::new(axis, Direction::GreaterOrEqual, threshold).apply(&points);

        // Kept points appear in the input in the same order
        let mut rest = points.iter();
        for p in &kept {
            prop_assert!(rest.any(|q| q == p));
        }
    }

    #[test]
    fn proptest_ge_and_le_cover_input(
        points in arb_side(40),
        axis in arb_axis(),
        threshold in -50.0..50.0f64,
    ) {
        let ge = Cut::new(axis, Direction::GreaterOrEqual, threshold).apply(&points);
        let le = Cut::new(axis, Direction::LessOrEqual, threshold).apply(&points);
        let bound = if axis == Axis::Radial { threshold * threshold } else { threshold };
        let on_boundary = points.iter().filter(|p| coord(p, axis) == bound).count();

        prop_assert_eq!(ge.len() + le.len(), points.len() + on_boundary);
    }

    #[test]
    fn proptest_boundary_points_appear_in_both(
        points in arb_side(20),
        axis in prop_oneof![Just(Axis::X), Just(Axis::Y), Just(Axis::Z)],
        pick in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!points.is_empty());
        let chosen = points[pick.index(points.len())];
        let threshold = coord(&chosen, axis);

        let ge = Cut::new(axis, Direction::GreaterOrEqual, threshold).apply(&points);
        let le = Cut::new(axis, Direction::LessOrEqual, threshold).apply(&points);
        prop_assert!(ge.contains(&chosen));
        prop_assert!(le.contains(&chosen));
    }

    #[test]
    fn proptest_pipeline_cut_keeps_sides(
        left in arb_side(20),
        right in arb_side(20),
        axis in arb_axis(),
        threshold in -50.0..50.0f64,
    ) {
        let mut pipeline = pipeline_with(&left, &right);
        pipeline.cut("c", "out", axis, Direction::LessOrEqual, threshold).unwrap();

        let cut = Cut::new(axis, Direction::LessOrEqual, threshold);
        let expected = cut.apply_paired(&PairedCloud::from_sides(left, right));
        let dump = pipeline.dump("out").unwrap();

        prop_assert_eq!((dump.left_count, dump.right_count), expected.counts());
        prop_assert_eq!(unpack(&dump.bytes).unwrap(), expected.merged());
    }

    #[test]
    fn proptest_dump_size_matches_counts(
        left in arb_side(30),
        right in arb_side(30),
    ) {
        let pipeline = pipeline_with(&left, &right);
        let dump = pipeline.dump("c").unwrap();

        prop_assert_eq!(dump.left_count, left.len());
        prop_assert_eq!(dump.right_count, right.len());
        prop_assert_eq!(dump.bytes.len(), (left.len() + right.len()) * RECORD_SIZE);
    }

    #[test]
    fn proptest_stub_denoise_swaps_counts(
        left in arb_side(30),
        right in arb_side(30),
    ) {
        let mut pipeline = pipeline_with(&left, &right);
        pipeline.delete_noise("c", "d", 1.0).unwrap();

        let dump = pipeline.dump("d").unwrap();
        prop_assert_eq!((dump.left_count, dump.right_count), (right.len(), left.len()));
    }
}
