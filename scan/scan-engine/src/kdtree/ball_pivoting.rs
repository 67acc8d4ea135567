//! Ball Pivoting surface reconstruction.
//!
//! A ball of fixed radius rolls over a cloud with oriented normals. Each
//! time it rests on three points a triangle is emitted.
//!
//! 1. Find a seed triangle whose circumscribed ball contains no other point
//! 2. Pivot the ball around each front edge, looking for the next point
//! 3. Stop when the front is empty
//!
//! The front is kept in ordered collections so the same cloud always yields
//! the same faces.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::{Point3, Vector3};
use scan_types::Face;

use super::SpatialIndex;
use crate::cloud::{EngineCloud, EnginePoint};

/// An undirected edge with its endpoints in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Edge {
    v0: u32,
    v1: u32,
}

impl Edge {
    const fn new(a: u32, b: u32) -> Self {
        if a < b {
            Self { v0: a, v1: b }
        } else {
            Self { v0: b, v1: a }
        }
    }
}

/// Estimates a ball radius from the average k-nearest-neighbor spacing.
///
/// Returns 1.0 for empty clouds or `k == 0`.
pub(super) fn estimate_radius(cloud: &EngineCloud, k: usize) -> f64 {
    if cloud.is_empty() || k == 0 {
        return 1.0;
    }

    let tree = SpatialIndex::new(&cloud.points);
    let k_query = k.min(cloud.len().saturating_sub(1)).max(1);
    let mut total = 0.0;
    let mut count = 0u32;

    for point in &cloud.points {
        let neighbors = tree.nearest_n(&point.coords(), k_query + 1);
        for neighbor in neighbors.iter().skip(1) {
            total += neighbor.distance.sqrt();
            count += 1;
        }
    }

    if count == 0 {
        return 1.0;
    }

    // Slightly larger than the average spacing
    total / f64::from(count) * 1.5
}

/// Runs ball pivoting over a cloud that carries normals.
///
/// Face indices refer to `cloud` directly.
pub(super) fn ball_pivoting(cloud: &EngineCloud, radius: f64, max_pivot_angle: f64) -> Vec<Face> {
    let points = &cloud.points;
    let tree = SpatialIndex::new(points);

    let mut faces = Vec::new();
    let mut emitted: BTreeSet<[u32; 3]> = BTreeSet::new();
    let mut used: BTreeSet<u32> = BTreeSet::new();
    let mut front: BTreeMap<Edge, Point3<f64>> = BTreeMap::new();
    let mut completed: BTreeSet<Edge> = BTreeSet::new();

    let Some((seed, seed_center)) = find_seed_triangle(points, &tree, radius) else {
        return faces;
    };
    faces.push(seed);
    emitted.insert(sorted(seed));
    used.extend(seed);
    for edge in [
        Edge::new(seed[0], seed[1]),
        Edge::new(seed[1], seed[2]),
        Edge::new(seed[2], seed[0]),
    ] {
        front.insert(edge, seed_center);
    }

    let max_iterations = points.len() * 10;
    let mut iterations = 0;

    while iterations < max_iterations {
        let Some((edge, center)) = front.pop_first() else {
            break;
        };
        iterations += 1;

        if completed.contains(&edge) {
            continue;
        }
        completed.insert(edge);

        let Some((v2, new_center)) = pivot_ball(
            points,
            &tree,
            edge,
            &center,
            radius,
            max_pivot_angle,
            &used,
        ) else {
            // Boundary edge
            continue;
        };

        let face = [edge.v0, v2, edge.v1];
        if !emitted.insert(sorted(face)) {
            continue;
        }
        faces.push(face);
        used.insert(v2);

        for new_edge in [Edge::new(edge.v0, v2), Edge::new(v2, edge.v1)] {
            if completed.contains(&new_edge) {
                continue;
            }
            if front.remove(&new_edge).is_some() {
                // Reached from both sides
                completed.insert(new_edge);
            } else {
                front.insert(new_edge, new_center);
            }
        }
    }

    faces
}

fn sorted(mut face: Face) -> Face {
    face.sort_unstable();
    face
}

#[allow(clippy::cast_possible_truncation)]
fn find_seed_triangle(
    points: &[EnginePoint],
    tree: &SpatialIndex,
    radius: f64,
) -> Option<(Face, Point3<f64>)> {
    let search_radius = radius * 2.0;

    for (i, point) in points.iter().enumerate() {
        let Some(normal) = point.normal else {
            continue;
        };
        let neighbors = tree.within(&point.coords(), search_radius * search_radius);

        for (a, na) in neighbors.iter().enumerate() {
            let j = na.index;
            if j == i {
                continue;
            }
            for nb in &neighbors[a + 1..] {
                let k = nb.index;
                if k == i {
                    continue;
                }

                let Some(center) = compute_ball_center(
                    &point.position,
                    &points[j].position,
                    &points[k].position,
                    &normal,
                    radius,
                ) else {
                    continue;
                };
                if is_empty_ball(points, tree, &center, radius, &[i, j, k]) {
                    return Some(([i as u32, j as u32, k as u32], center));
                }
            }
        }
    }

    None
}

/// Center of the ball of `radius` touching three points, on the side the
/// normal points to.
#[allow(clippy::many_single_char_names)]
fn compute_ball_center(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    normal: &Vector3<f64>,
    radius: f64,
) -> Option<Point3<f64>> {
    let e1 = p1 - p0;
    let e2 = p2 - p0;
    let tri_normal = e1.cross(&e2).try_normalize(1e-10)?;

    let a = (p1 - p2).norm();
    let b = (p0 - p2).norm();
    let c = (p0 - p1).norm();
    let s = (a + b + c) / 2.0;
    let area = (s * (s - a) * (s - b) * (s - c)).sqrt();
    if area.is_nan() || area < 1e-10 {
        return None;
    }

    let circumradius = (a * b * c) / (4.0 * area);
    if circumradius > radius {
        return None;
    }
    let h = radius.mul_add(radius, -(circumradius * circumradius)).sqrt();

    // Barycentric circumcenter
    let alpha = (p1 - p2).norm_squared() * (p0 - p1).dot(&(p0 - p2));
    let beta = (p0 - p2).norm_squared() * (p1 - p0).dot(&(p1 - p2));
    let gamma = (p0 - p1).norm_squared() * (p2 - p0).dot(&(p2 - p1));
    let denom = alpha + beta + gamma;
    if denom.abs() < 1e-10 {
        return None;
    }
    let circumcenter = (alpha * p0.coords + beta * p1.coords + gamma * p2.coords) / denom;

    let direction = if tri_normal.dot(normal) > 0.0 {
        tri_normal
    } else {
        -tri_normal
    };

    Some(Point3::from(circumcenter + direction * h))
}

fn is_empty_ball(
    points: &[EnginePoint],
    tree: &SpatialIndex,
    center: &Point3<f64>,
    radius: f64,
    exclude: &[usize],
) -> bool {
    let radius_sq = radius * radius;
    let tolerance = 1e-6;
    let query = [center.x, center.y, center.z];

    tree.within(&query, radius_sq * 1.01)
        .iter()
        .all(|neighbor| {
            let idx = neighbor.index;
            exclude.contains(&idx)
                || (points[idx].position - center).norm_squared() >= radius_sq - tolerance
        })
}

/// Finds the point the ball reaches when pivoting around `edge`.
fn pivot_ball(
    points: &[EnginePoint],
    tree: &SpatialIndex,
    edge: Edge,
    ball_center: &Point3<f64>,
    radius: f64,
    max_pivot_angle: f64,
    used: &BTreeSet<u32>,
) -> Option<(u32, Point3<f64>)> {
    let p0 = points[edge.v0 as usize].position;
    let p1 = points[edge.v1 as usize].position;
    if (p1 - p0).norm() < 1e-10 {
        return None;
    }

    let mid = Point3::from((p0.coords + p1.coords) / 2.0);
    let search_radius = radius * 2.5;
    let candidates = tree.within(&[mid.x, mid.y, mid.z], search_radius * search_radius);

    let mut best: Option<(u32, Point3<f64>, f64)> = None;

    for candidate in candidates {
        #[allow(clippy::cast_possible_truncation)]
        let idx = candidate.index as u32;
        if idx == edge.v0 || idx == edge.v1 {
            continue;
        }

        let p2 = points[idx as usize].position;
        let normal = points[idx as usize].normal.unwrap_or_else(Vector3::z);
        let Some(new_center) = compute_ball_center(&p0, &p1, &p2, &normal, radius) else {
            continue;
        };

        // The ball has to roll over the edge, not back
        let old_dir = ball_center - mid;
        let new_dir = new_center - mid;
        if old_dir.dot(&new_dir) > 0.0 {
            continue;
        }

        let pivot_angle = old_dir.angle(&(-new_dir));
        if pivot_angle > max_pivot_angle {
            continue;
        }

        if !is_empty_ball(
            points,
            tree,
            &new_center,
            radius,
            &[edge.v0 as usize, edge.v1 as usize, idx as usize],
        ) {
            continue;
        }

        // Prefer fresh vertices, then the smallest pivot
        let penalty = if used.contains(&idx) { 1.0 } else { 0.0 };
        let score = penalty + pivot_angle / std::f64::consts::PI;
        if best.as_ref().map_or(true, |b| score < b.2) {
            best = Some((idx, new_center, score));
        }
    }

    best.map(|(idx, center, _)| (idx, center))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_grid(n: usize, spacing: f32) -> EngineCloud {
        let mut cloud = EngineCloud::new();
        for i in 0..n {
            for j in 0..n {
                cloud.push_point(i as f32 * spacing, j as f32 * spacing, 0.0, 0);
            }
        }
        for point in &mut cloud.points {
            point.normal = Some(Vector3::z());
        }
        cloud
    }

    #[test]
    fn radius_tracks_spacing() {
        let coarse = estimate_radius(&flat_grid(5, 2.0), 4);
        let fine = estimate_radius(&flat_grid(5, 1.0), 4);
        assert!((coarse / fine - 2.0).abs() < 0.01);
        assert!((estimate_radius(&EngineCloud::new(), 4) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn grid_is_triangulated() {
        let cloud = flat_grid(4, 1.0);
        let radius = estimate_radius(&cloud, 6);
        let faces = ball_pivoting(&cloud, radius, std::f64::consts::FRAC_PI_2);

        assert!(faces.len() > 1);
        let n = cloud.len() as u32;
        for face in &faces {
            assert!(face.iter().all(|&i| i < n));
            assert!(face[0] != face[1] && face[1] != face[2] && face[0] != face[2]);
        }
    }

    #[test]
    fn reconstruction_is_deterministic() {
        let cloud = flat_grid(5, 0.5);
        let radius = estimate_radius(&cloud, 6);
        let first = ball_pivoting(&cloud, radius, std::f64::consts::FRAC_PI_2);
        let second = ball_pivoting(&cloud, radius, std::f64::consts::FRAC_PI_2);
        assert_eq!(first, second);
    }

    #[test]
    fn no_duplicate_faces() {
        let cloud = flat_grid(5, 1.0);
        let faces = ball_pivoting(&cloud, estimate_radius(&cloud, 6), 2.0);
        let unique: BTreeSet<Face> = faces.iter().copied().map(sorted).collect();
        assert_eq!(unique.len(), faces.len());
    }

    #[test]
    fn tiny_radius_finds_nothing() {
        let cloud = flat_grid(3, 1.0);
        assert!(ball_pivoting(&cloud, 0.1, std::f64::consts::FRAC_PI_2).is_empty());
    }

    #[test]
    fn ball_center_sits_above_triangle() {
        let center = compute_ball_center(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
            &Vector3::z(),
            1.0,
        )
        .unwrap();
        assert_relative_eq!(center.x, 0.5, epsilon = 1e-9);
        assert_relative_eq!(center.y, 0.5, epsilon = 1e-9);
        assert_relative_eq!(center.z, 0.5f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn doubled_grid_is_triangulated() {
        let mut cloud = flat_grid(6, 1.0);
        let copy = cloud.points.clone();
        cloud.points.extend(copy);

        let radius = estimate_radius(&cloud, 10);
        assert!(radius > 0.0);
        let faces = ball_pivoting(&cloud, radius, std::f64::consts::FRAC_PI_2);

        assert!(!faces.is_empty());
        let n = cloud.len() as u32;
        for face in &faces {
            assert!(face.iter().all(|&i| i < n));
            let [a, b, c] = face.map(|i| cloud.points[i as usize].position);
            assert!((b - a).cross(&(c - a)).norm() > 1e-9);
        }
    }

    #[test]
    fn coincident_points_yield_no_faces() {
        let mut cloud = EngineCloud::new();
        for _ in 0..50 {
            cloud.push_point(1.0, 1.0, 0.0, 0);
        }
        for point in &mut cloud.points {
            point.normal = Some(Vector3::z());
        }
        let radius = estimate_radius(&cloud, 10);
        assert!(ball_pivoting(&cloud, radius, std::f64::consts::FRAC_PI_2).is_empty());
    }
}
