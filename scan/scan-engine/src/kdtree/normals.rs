//! PCA normal estimation.
//!
//! The normal at a point is the eigenvector with the smallest eigenvalue of
//! the covariance matrix of its k nearest neighbors.

use nalgebra::{Matrix3, Point3, Vector3};

use super::SpatialIndex;
use crate::cloud::{EngineCloud, EnginePoint};
use crate::error::{EngineError, EngineResult};

/// Assigns a unit normal to every point of `cloud`.
pub(super) fn estimate_normals(cloud: &mut EngineCloud, k: usize) -> EngineResult<()> {
    if cloud.len() < 3 {
        return Err(EngineError::InsufficientPoints {
            required: 3,
            actual: cloud.len(),
        });
    }
    if k == 0 {
        return Err(EngineError::InvalidParameter {
            reason: "k must be greater than 0".to_string(),
        });
    }

    let index = SpatialIndex::new(&cloud.points);
    let normals: Vec<Vector3<f64>> = cloud
        .points
        .iter()
        .map(|point| estimate_point_normal(&point.position, &index, &cloud.points, k))
        .collect();

    for (point, normal) in cloud.points.iter_mut().zip(normals) {
        point.normal = Some(normal);
    }
    Ok(())
}

/// Flips normals that point toward the centroid.
///
/// Works well for convex or mostly convex clouds. Points without a normal
/// are left alone.
pub(super) fn orient_normals_outward(cloud: &mut EngineCloud) {
    let Some(centroid) = cloud.centroid() else {
        return;
    };

    for point in &mut cloud.points {
        if let Some(normal) = &mut point.normal {
            let outward = point.position - centroid;
            if normal.dot(&outward) < 0.0 {
                *normal = -*normal;
            }
        }
    }
}

fn estimate_point_normal(
    position: &Point3<f64>,
    index: &SpatialIndex,
    points: &[EnginePoint],
    k: usize,
) -> Vector3<f64> {
    let query = [position.x, position.y, position.z];
    let positions: Vec<Point3<f64>> = index
        .nearest_n(&query, k.max(3))
        .iter()
        .map(|n| points[n.index].position)
        .collect();
    if positions.len() < 3 {
        return Vector3::z();
    }

    let sum: Vector3<f64> = positions.iter().map(|p| p.coords).sum();
    #[allow(clippy::cast_precision_loss)]
    let centroid = sum / positions.len() as f64;

    let mut cov = Matrix3::zeros();
    for p in &positions {
        let diff = p.coords - centroid;
        cov += diff * diff.transpose();
    }

    let eigen = cov.symmetric_eigen();
    let values = eigen.eigenvalues;
    let min_idx = if values[0] <= values[1] && values[0] <= values[2] {
        0
    } else if values[1] <= values[2] {
        1
    } else {
        2
    };
    let normal: Vector3<f64> = eigen.eigenvectors.column(min_idx).into_owned();

    normal.try_normalize(1e-10).unwrap_or_else(Vector3::z)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;

    fn planar_cloud(n: usize) -> EngineCloud {
        let mut cloud = EngineCloud::new();
        for i in 0..n {
            for j in 0..n {
                cloud.push_point(i as f32, j as f32, 0.0, 0);
            }
        }
        cloud
    }

    fn sphere_cloud(rings: usize, radius: f32) -> EngineCloud {
        use std::f32::consts::PI;
        let mut cloud = EngineCloud::new();
        // Skip the poles so no two samples coincide
        for i in 1..rings {
            let theta = PI * i as f32 / rings as f32;
            for j in 0..rings {
                let phi = 2.0 * PI * (j as f32 + 0.1 * i as f32) / rings as f32;
                cloud.push_point(
                    radius * theta.sin() * phi.cos(),
                    radius * theta.sin() * phi.sin(),
                    radius * theta.cos(),
                    0,
                );
            }
        }
        cloud
    }

    #[test]
    fn planar_normals_point_along_z() {
        let mut cloud = planar_cloud(8);
        estimate_normals(&mut cloud, 10).unwrap();

        assert!(cloud.has_normals());
        for i in 0..cloud.len() {
            let n = cloud.normal(i).unwrap();
            assert!(n.x.abs() < 0.1);
            assert!(n.y.abs() < 0.1);
            assert!(n.z.abs() > 0.9);
            assert!((n.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn insufficient_points() {
        let mut cloud = EngineCloud::new();
        cloud.push_point(0.0, 0.0, 0.0, 0);
        cloud.push_point(1.0, 0.0, 0.0, 0);

        let result = estimate_normals(&mut cloud, 10);
        assert!(matches!(
            result,
            Err(EngineError::InsufficientPoints {
                required: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn zero_k_is_rejected() {
        let mut cloud = planar_cloud(4);
        assert!(matches!(
            estimate_normals(&mut cloud, 0),
            Err(EngineError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn sphere_normals_point_outward() {
        let mut cloud = sphere_cloud(12, 1.0);
        estimate_normals(&mut cloud, 10).unwrap();
        orient_normals_outward(&mut cloud);

        let outward = cloud
            .points
            .iter()
            .filter(|p| p.normal.unwrap().dot(&p.position.coords) > 0.0)
            .count();
        let ratio = outward as f64 / cloud.len() as f64;
        assert!(ratio >= 0.8, "only {outward}/{} outward", cloud.len());
    }

    #[test]
    fn orient_without_normals_is_noop() {
        let mut cloud = planar_cloud(3);
        let before = cloud.clone();
        orient_normals_outward(&mut cloud);
        assert_eq!(cloud, before);
    }

    #[test]
    fn repeated_samples_get_unit_normals() {
        let mut cloud = EngineCloud::new();
        for _ in 0..40 {
            cloud.push_point(2.0, 2.0, 2.0, 0);
        }
        estimate_normals(&mut cloud, 10).unwrap();
        for i in 0..cloud.len() {
            assert!((cloud.normal(i).unwrap().norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn doubled_plane_normals() {
        let mut cloud = planar_cloud(8);
        let copy = cloud.clone();
        for point in copy.iter() {
            cloud.push(&point);
        }
        estimate_normals(&mut cloud, 12).unwrap();
        for i in 0..cloud.len() {
            assert!(cloud.normal(i).unwrap().z.abs() > 0.99);
        }
    }
}
