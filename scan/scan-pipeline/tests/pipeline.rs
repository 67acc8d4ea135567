//! End-to-end tests for the scan pipeline.

#![allow(clippy::unwrap_used, clippy::cast_precision_loss, clippy::float_cmp)]

use scan_engine::{GeometryEngine, KdTreeEngine, NullEngine};
use scan_io::{pack, unpack, StlFormat};
use scan_pipeline::{
    Axis, CloudEntry, DenoiseStrategy, Direction, PipelineConfig, PipelineError, ScanPipeline,
};
use scan_types::{Point, ScanColor};

// =============================================================================
// Helpers
// =============================================================================

/// A square grid in the z = 0 plane.
fn grid(n: usize, spacing: f32, color: ScanColor) -> Vec<Point> {
    (0..n * n)
        .map(|i| {
            let (row, col) = ((i / n) as f32, (i % n) as f32);
            Point::new(col * spacing, row * spacing, 0.0, color)
        })
        .collect()
}

fn line(n: usize, y: f32) -> Vec<Point> {
    (0..n)
        .map(|i| Point::new(i as f32 - 5.0, y, 0.0, ScanColor::WHITE))
        .collect()
}

fn pipeline_with(engine: Box<dyn GeometryEngine>, config: PipelineConfig) -> ScanPipeline {
    ScanPipeline::new(engine, config)
}

fn null_pipeline() -> ScanPipeline {
    pipeline_with(Box::new(NullEngine), PipelineConfig::default())
}

fn decode(pipeline: &ScanPipeline, name: &str) -> Vec<Point> {
    unpack(&pipeline.dump(name).unwrap().bytes).unwrap()
}

// =============================================================================
// Upload and dump
// =============================================================================

#[test]
fn dump_paired_ten_and_fifteen() {
    let mut pipeline = null_pipeline();
    pipeline
        .upload("a", &pack(&line(10, 0.0)), &pack(&line(15, 1.0)))
        .unwrap();

    let (left, right, bytes) = pipeline.dump("a").unwrap().into_parts();
    assert_eq!((left, right), (10, 15));
    assert_eq!(bytes.len(), 600);
}

#[test]
fn upload_roundtrips_through_dump() {
    let mut pipeline = null_pipeline();
    let left = vec![Point::new(1.0, 2.0, 3.0, ScanColor::new(12, 34, 56))];
    let right = vec![Point::new(-1.0, -2.0, -3.0, ScanColor::new(200, 100, 0))];
    pipeline.upload("a", &pack(&left), &pack(&right)).unwrap();

    assert_eq!(decode(&pipeline, "a"), [left, right].concat());
}

#[test]
fn upload_overwrites() {
    let mut pipeline = null_pipeline();
    pipeline.upload("a", &pack(&line(4, 0.0)), &[]).unwrap();
    pipeline.upload("a", &[], &pack(&line(2, 0.0))).unwrap();

    let dump = pipeline.dump("a").unwrap();
    assert_eq!((dump.left_count, dump.right_count), (0, 2));
    assert_eq!(pipeline.store().len(), 1);
}

// =============================================================================
// Cut
// =============================================================================

#[test]
fn cut_in_place_discards_original() {
    let mut pipeline = null_pipeline();
    pipeline
        .upload("a", &pack(&line(11, 0.0)), &pack(&line(11, 1.0)))
        .unwrap();

    pipeline
        .cut("a", "a", Axis::X, Direction::GreaterOrEqual, 0.0)
        .unwrap();

    let dump = pipeline.dump("a").unwrap();
    assert_eq!((dump.left_count, dump.right_count), (6, 6));
    assert!(decode(&pipeline, "a").iter().all(|p| p.x() >= 0.0));
}

#[test]
fn unknown_mode_leaves_output_untouched() {
    let mut pipeline = null_pipeline();
    pipeline
        .upload("a", &pack(&line(11, 0.0)), &pack(&line(3, 1.0)))
        .unwrap();
    pipeline.cut_mode("a", "b", "x", false, 0.0).unwrap();
    let before = pipeline.dump("b").unwrap();

    let err = pipeline.cut_mode("a", "b", "q", true, 0.0).unwrap_err();

    assert!(matches!(err, PipelineError::InvalidFilterMode { ref mode } if mode == "q"));
    assert_eq!(pipeline.dump("b").unwrap(), before);
}

#[test]
fn unknown_mode_does_not_create_output() {
    let mut pipeline = null_pipeline();
    pipeline.upload("a", &pack(&line(3, 0.0)), &[]).unwrap();
    assert!(pipeline.cut_mode("a", "b", "q", true, 0.0).is_err());
    assert!(!pipeline.store().contains("b"));
}

#[test]
fn radial_cut_uses_squared_threshold() {
    let mut pipeline = null_pipeline();
    let points = vec![
        Point::from_coords(0.5, 0.5, 0.0),
        Point::from_coords(1.0, 1.0, 9.0),
        Point::from_coords(3.0, 0.0, -9.0),
    ];
    pipeline.upload("a", &pack(&points), &[]).unwrap();

    // A negative threshold: sqrt(x²+y²) >= -1 holds everywhere,
    // x²+y² >= 1 does not
    pipeline.cut_mode("a", "outer", "r", true, -1.0).unwrap();
    let kept = decode(&pipeline, "outer");
    assert_eq!(kept, points[1..].to_vec());

    pipeline.cut_mode("a", "inner", "r", false, 1.5).unwrap();
    let kept = decode(&pipeline, "inner");
    assert_eq!(kept, points[..2].to_vec());
}

// =============================================================================
// Denoise
// =============================================================================

#[test]
fn stub_denoise_swaps_five_and_seven() {
    let mut pipeline = null_pipeline();
    assert_eq!(pipeline.denoise_strategy(), DenoiseStrategy::SideRecolor);
    pipeline
        .upload("a", &pack(&line(5, 0.0)), &pack(&line(7, 1.0)))
        .unwrap();

    pipeline.delete_noise("a", "b", 1.0).unwrap();

    let dump = pipeline.dump("b").unwrap();
    assert_eq!((dump.left_count, dump.right_count), (7, 5));

    let points = decode(&pipeline, "b");
    assert!(points[..7]
        .iter()
        .all(|p| p.y() == 1.0 && p.color == ScanColor::BLACK));
    assert!(points[7..]
        .iter()
        .all(|p| p.y() == 0.0 && p.color == ScanColor::RED));

    // Source untouched
    assert_eq!(pipeline.dump("a").unwrap().left_count, 5);
}

#[test]
fn engine_denoise_merges_and_drops_outliers() {
    let mut pipeline = pipeline_with(Box::new(KdTreeEngine::default()), PipelineConfig::new());
    let mut left = grid(8, 0.5, ScanColor::WHITE);
    left.push(Point::new(50.0, 50.0, 50.0, ScanColor::RED));
    let right = grid(6, 0.5, ScanColor::WHITE);
    let total = left.len() + right.len();
    pipeline.upload("a", &pack(&left), &pack(&right)).unwrap();

    pipeline.delete_noise("a", "clean", 1.0).unwrap();

    let entry = pipeline.store().get("clean").unwrap();
    assert!(matches!(entry, CloudEntry::Dense(_)));

    let dump = pipeline.dump("clean").unwrap();
    assert_eq!(dump.right_count, 0);
    assert!(dump.left_count < total);
    assert!(decode(&pipeline, "clean")
        .iter()
        .all(|p| p.color == ScanColor::WHITE));
}

#[test]
fn dense_cut_stays_dense() {
    let mut pipeline = pipeline_with(Box::new(KdTreeEngine::default()), PipelineConfig::new());
    pipeline
        .upload("a", &pack(&grid(8, 1.0, ScanColor::WHITE)), &[])
        .unwrap();
    pipeline.delete_noise("a", "clean", 3.0).unwrap();

    pipeline
        .cut("clean", "half", Axis::X, Direction::LessOrEqual, 3.5)
        .unwrap();

    let dump = pipeline.dump("half").unwrap();
    assert_eq!(dump.right_count, 0);
    assert!(dump.left_count > 0);
    assert!(pipeline.store().get("half").unwrap().as_dense().is_some());
    assert!(decode(&pipeline, "half").iter().all(|p| p.x() <= 3.5));
}

// =============================================================================
// Mesh
// =============================================================================

#[test]
fn build_and_export_mesh() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline_with(Box::new(KdTreeEngine::default()), PipelineConfig::new());
    pipeline
        .upload("a", &pack(&grid(8, 1.0, ScanColor::WHITE)), &[])
        .unwrap();
    pipeline.delete_noise("a", "clean", 3.0).unwrap();

    let faces = pipeline.build_mesh("clean").unwrap();
    assert!(faces > 0);

    let mesh = pipeline.store().mesh("clean").unwrap();
    assert_eq!(mesh.cloud_name(), "clean");
    assert!(pipeline.store().contains("normals"));

    let path = dir.path().join("clean.stl");
    pipeline
        .export_mesh("clean", &path, StlFormat::Ascii)
        .unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("solid clean"));
    assert_eq!(text.matches("facet normal").count(), faces);
    assert_eq!(text.matches("vertex").count(), faces * 3);
}

#[test]
fn chained_denoise_writes_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.stl");
    let config = PipelineConfig::new().with_mesh_output(&path, StlFormat::Binary);
    let mut pipeline = pipeline_with(Box::new(KdTreeEngine::default()), config);
    pipeline
        .upload(
            "a",
            &pack(&grid(8, 1.0, ScanColor::WHITE)),
            &pack(&grid(3, 1.0, ScanColor::RED)),
        )
        .unwrap();

    pipeline.delete_noise_and_mesh("a", "clean", 3.0).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let faces = pipeline.store().mesh("clean").unwrap().face_count();
    assert_eq!(bytes.len(), 84 + faces * 50);
}

#[test]
fn stale_mesh_export_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline_with(Box::new(KdTreeEngine::default()), PipelineConfig::new());
    pipeline
        .upload("a", &pack(&grid(8, 1.0, ScanColor::WHITE)), &[])
        .unwrap();
    pipeline.delete_noise("a", "clean", 3.0).unwrap();
    pipeline.build_mesh("clean").unwrap();

    // Replace the meshed cloud with an empty one
    pipeline
        .cut("clean", "clean", Axis::Z, Direction::LessOrEqual, -1000.0)
        .unwrap();

    let path = dir.path().join("stale.stl");
    let err = pipeline
        .export_mesh("clean", &path, StlFormat::Ascii)
        .unwrap_err();
    assert!(matches!(err, PipelineError::MeshIndexOutOfRange { len: 0, .. }));
    assert!(!path.exists());
}

#[test]
fn meshing_without_engine() {
    let mut pipeline = null_pipeline();
    pipeline
        .store_mut()
        .insert("d", scan_pipeline::DenseCloud::Points(grid(4, 1.0, ScanColor::WHITE)));

    let err = pipeline.build_mesh("d").unwrap_err();
    assert!(matches!(err, PipelineError::EngineUnavailable { .. }));
    assert!(pipeline.store().mesh("d").is_none());
    assert!(!pipeline.store().contains("normals"));
}

// =============================================================================
// Flat and repeated scans
// =============================================================================

#[test]
fn flat_scan_denoises_with_default_config() {
    let mut pipeline = pipeline_with(Box::new(KdTreeEngine::default()), PipelineConfig::default());
    pipeline
        .upload("a", &pack(&grid(10, 1.0, ScanColor::WHITE)), &[])
        .unwrap();

    pipeline.delete_noise("a", "b", 1.0).unwrap();

    let kept = decode(&pipeline, "b");
    assert!(!kept.is_empty() && kept.len() <= 100);
    assert!(kept.iter().all(|p| p.z() == 0.0));
}

#[test]
fn repeated_samples_denoise_with_default_config() {
    let mut pipeline = pipeline_with(Box::new(KdTreeEngine::default()), PipelineConfig::default());
    let same = vec![Point::new(0.5, 0.5, 0.5, ScanColor::WHITE); 80];
    pipeline.upload("a", &pack(&same), &[]).unwrap();

    pipeline.delete_noise("a", "b", 1.0).unwrap();

    let dump = pipeline.dump("b").unwrap();
    assert_eq!((dump.left_count, dump.right_count), (80, 0));
}

#[test]
fn repeated_samples_mesh_to_nothing() {
    let mut pipeline = pipeline_with(Box::new(KdTreeEngine::default()), PipelineConfig::default());
    let same = vec![Point::new(0.5, 0.5, 0.5, ScanColor::WHITE); 80];
    pipeline.upload("a", &pack(&same), &pack(&same)).unwrap();
    pipeline.delete_noise("a", "clean", 1.0).unwrap();

    assert_eq!(pipeline.build_mesh("clean").unwrap(), 0);
    assert!(pipeline.store().mesh("clean").unwrap().is_empty());
}

#[test]
fn overlapping_sides_mesh_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flat.stl");
    let config = PipelineConfig::default().with_mesh_output(&path, StlFormat::Ascii);
    let mut pipeline = pipeline_with(Box::new(KdTreeEngine::default()), config);

    // Both sides scanned the same plane
    let side = pack(&grid(10, 0.5, ScanColor::WHITE));
    pipeline.upload("a", &side, &side).unwrap();

    pipeline.delete_noise_and_mesh("a", "clean", 2.0).unwrap();

    let mesh = pipeline.store().mesh("clean").unwrap();
    assert!(mesh.face_count() > 0);
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("facet normal").count(), mesh.face_count());
}

