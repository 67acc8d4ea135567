//! A geometry engine built on kd-tree neighbor queries.
//!
//! - **Outlier removal** - mean k-nearest-neighbor distance against the
//!   global mean and standard deviation
//! - **Normals** - PCA over k nearest neighbors, oriented away from the
//!   centroid
//! - **Reconstruction** - Ball Pivoting with a radius estimated from point
//!   spacing
//!
//! # Example
//!
//! ```
//! use scan_engine::{EngineCloud, GeometryEngine, KdTreeEngine};
//!
//! // A small, slightly bumpy patch
//! let mut cloud = EngineCloud::new();
//! for i in 0..6 {
//!     for j in 0..6 {
//!         let z = (i * 6 + j) as f32 * 0.001;
//!         cloud.push_point(i as f32, j as f32, z, 0xff_ffff);
//!     }
//! }
//!
//! let engine = KdTreeEngine::default();
//! let with_normals = engine.estimate_normals(&cloud).unwrap();
//! let mesh = engine.reconstruct(&with_normals).unwrap();
//!
//! assert_eq!(mesh.cloud.len(), cloud.len());
//! assert!(!mesh.faces.is_empty());
//! ```

mod ball_pivoting;
mod normals;
mod outlier;

use std::collections::BTreeMap;

use kiddo::{ImmutableKdTree, NearestNeighbour, SquaredEuclidean};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cloud::{EngineCloud, EnginePoint};
use crate::engine::{GeometryEngine, Reconstruction};
use crate::error::{EngineError, EngineResult};

/// Parameters for the kd-tree engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineParams {
    /// Neighbors used for PCA normal estimation. Default: 15.
    pub normal_k: usize,

    /// Whether to flip normals to point away from the centroid. Default: true.
    pub orient_normals: bool,

    /// Neighbors used to estimate the ball radius. Default: 10.
    pub radius_k: usize,

    /// Scale applied to the estimated ball radius. Default: 1.0.
    pub radius_scale: f64,

    /// Maximum pivot angle in radians. Default: pi/2.
    pub max_pivot_angle: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            normal_k: 15,
            orient_normals: true,
            radius_k: 10,
            radius_scale: 1.0,
            max_pivot_angle: std::f64::consts::FRAC_PI_2,
        }
    }
}

impl EngineParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the neighbor count for normal estimation.
    #[must_use]
    pub const fn with_normal_k(mut self, k: usize) -> Self {
        self.normal_k = k;
        self
    }

    /// Sets whether normals are oriented outward.
    #[must_use]
    pub const fn with_orient_normals(mut self, orient: bool) -> Self {
        self.orient_normals = orient;
        self
    }

    /// Sets the neighbor count and scale for ball radius estimation.
    #[must_use]
    pub const fn with_radius_estimation(mut self, k: usize, scale: f64) -> Self {
        self.radius_k = k;
        self.radius_scale = scale;
        self
    }

    /// Parameters for fast, coarse meshing.
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            normal_k: 8,
            orient_normals: true,
            radius_k: 5,
            radius_scale: 1.2,
            max_pivot_angle: std::f64::consts::FRAC_PI_2,
        }
    }
}

/// The default geometry engine.
#[derive(Debug, Clone, Default)]
pub struct KdTreeEngine {
    params: EngineParams,
}

impl KdTreeEngine {
    /// Creates an engine with the given parameters.
    #[must_use]
    pub const fn new(params: EngineParams) -> Self {
        Self { params }
    }

    /// The engine's parameters.
    #[must_use]
    pub const fn params(&self) -> &EngineParams {
        &self.params
    }
}

impl GeometryEngine for KdTreeEngine {
    fn name(&self) -> &'static str {
        "kd-tree"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn remove_outliers(
        &self,
        cloud: &EngineCloud,
        k_neighbors: usize,
        std_multiplier: f64,
    ) -> EngineResult<EngineCloud> {
        if k_neighbors == 0 {
            return Err(EngineError::InvalidParameter {
                reason: "k_neighbors must be greater than 0".to_string(),
            });
        }
        if !std_multiplier.is_finite() {
            return Err(EngineError::InvalidParameter {
                reason: format!("std_multiplier must be finite, got {std_multiplier}"),
            });
        }
        Ok(outlier::remove_outliers(cloud, k_neighbors, std_multiplier))
    }

    fn estimate_normals(&self, cloud: &EngineCloud) -> EngineResult<EngineCloud> {
        let mut enriched = cloud.clone();
        normals::estimate_normals(&mut enriched, self.params.normal_k)?;
        if self.params.orient_normals {
            normals::orient_normals_outward(&mut enriched);
        }
        Ok(enriched)
    }

    fn reconstruct(&self, cloud: &EngineCloud) -> EngineResult<Reconstruction> {
        if cloud.is_empty() {
            return Err(EngineError::ReconstructionFailed {
                reason: "point cloud is empty".to_string(),
            });
        }
        if !cloud.has_normals() {
            return Err(EngineError::ReconstructionFailed {
                reason: "point cloud must have normals for ball pivoting".to_string(),
            });
        }

        let radius = ball_pivoting::estimate_radius(cloud, self.params.radius_k)
            * self.params.radius_scale;
        debug!(radius, points = cloud.len(), "ball pivoting");
        let faces = ball_pivoting::ball_pivoting(cloud, radius, self.params.max_pivot_angle);

        Ok(Reconstruction {
            cloud: cloud.clone(),
            faces,
        })
    }
}

/// A neighbor query hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Neighbor {
    /// Index into the indexed point slice.
    pub index: usize,
    /// Squared distance to the query.
    pub distance: f64,
}

/// Kd-tree over the distinct positions of a point slice.
///
/// Coincident points share one tree entry and are expanded back into their
/// point indices on query, in ascending index order. Repeated samples and
/// clouds lying in an axis-aligned plane index like any other cloud.
#[derive(Debug)]
pub(super) struct SpatialIndex {
    tree: Option<ImmutableKdTree<f64, 3>>,
    members: Vec<Vec<usize>>,
}

impl SpatialIndex {
    pub(super) fn new(points: &[EnginePoint]) -> Self {
        let mut slots: BTreeMap<[u64; 3], usize> = BTreeMap::new();
        let mut positions: Vec<[f64; 3]> = Vec::new();
        let mut members: Vec<Vec<usize>> = Vec::new();

        for (i, point) in points.iter().enumerate() {
            let coords = point.coords();
            // Adding 0.0 folds -0.0 into 0.0
            let key = coords.map(|c| (c + 0.0).to_bits());
            let slot = *slots.entry(key).or_insert_with(|| {
                positions.push(coords);
                members.push(Vec::new());
                positions.len() - 1
            });
            members[slot].push(i);
        }

        let tree = if positions.is_empty() {
            None
        } else {
            let tree: ImmutableKdTree<f64, 3> = ImmutableKdTree::new_from_slice(&positions);
            Some(tree)
        };
        Self { tree, members }
    }

    /// Number of distinct positions.
    pub(super) fn distinct(&self) -> usize {
        self.members.len()
    }

    /// The `n` points nearest to `query`, closest first.
    pub(super) fn nearest_n(&self, query: &[f64; 3], n: usize) -> Vec<Neighbor> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        if n == 0 {
            return Vec::new();
        }

        // n distinct positions always cover the n nearest points
        let mut hits: Vec<Neighbor> = tree
            .nearest_n::<SquaredEuclidean>(query, n.min(self.distinct()))
            .iter()
            .flat_map(|hit| self.expand(hit))
            .collect();
        sort_hits(&mut hits);
        hits.truncate(n);
        hits
    }

    /// All points within squared distance `radius_sq` of `query`, closest
    /// first.
    pub(super) fn within(&self, query: &[f64; 3], radius_sq: f64) -> Vec<Neighbor> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        let mut hits: Vec<Neighbor> = tree
            .within::<SquaredEuclidean>(query, radius_sq)
            .iter()
            .flat_map(|hit| self.expand(hit))
            .collect();
        sort_hits(&mut hits);
        hits
    }

    fn expand<'a>(
        &'a self,
        hit: &NearestNeighbour<f64, u64>,
    ) -> impl Iterator<Item = Neighbor> + 'a {
        let distance = hit.distance;
        #[allow(clippy::cast_possible_truncation)]
        let slot = hit.item as usize;
        self.members
            .get(slot)
            .into_iter()
            .flatten()
            .map(move |&index| Neighbor { index, distance })
    }
}

fn sort_hits(hits: &mut [Neighbor]) {
    hits.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.index.cmp(&b.index))
    });
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;

    fn bumpy_patch(n: usize) -> EngineCloud {
        let mut cloud = EngineCloud::new();
        for i in 0..n {
            for j in 0..n {
                let z = (i * n + j) as f32 * 0.0005;
                cloud.push_point(i as f32 * 0.5, j as f32 * 0.5, z, 0x00ff_0000);
            }
        }
        cloud
    }

    #[test]
    fn params_builder() {
        let params = EngineParams::new()
            .with_normal_k(20)
            .with_orient_normals(false)
            .with_radius_estimation(6, 1.5);
        assert_eq!(params.normal_k, 20);
        assert!(!params.orient_normals);
        assert_eq!(params.radius_k, 6);
        assert!((params.radius_scale - 1.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_neighbors() {
        let engine = KdTreeEngine::default();
        let result = engine.remove_outliers(&bumpy_patch(3), 0, 1.0);
        assert!(matches!(result, Err(EngineError::InvalidParameter { .. })));
    }

    #[test]
    fn rejects_non_finite_multiplier() {
        let engine = KdTreeEngine::default();
        let result = engine.remove_outliers(&bumpy_patch(3), 4, f64::NAN);
        assert!(matches!(result, Err(EngineError::InvalidParameter { .. })));
    }

    #[test]
    fn reconstruct_requires_normals() {
        let engine = KdTreeEngine::default();
        let result = engine.reconstruct(&bumpy_patch(4));
        assert!(matches!(
            result,
            Err(EngineError::ReconstructionFailed { .. })
        ));
    }

    #[test]
    fn reconstruct_empty_cloud() {
        let engine = KdTreeEngine::default();
        assert!(engine.reconstruct(&EngineCloud::new()).is_err());
    }

    #[test]
    fn normals_then_reconstruct_keeps_point_order() {
        let engine = KdTreeEngine::new(EngineParams::fast());
        let cloud = bumpy_patch(6);
        let enriched = engine.estimate_normals(&cloud).unwrap();
        assert!(enriched.has_normals());
        assert!(!cloud.has_normals());

        let result = engine.reconstruct(&enriched).unwrap();
        assert_eq!(result.cloud.len(), cloud.len());
        for i in 0..cloud.len() {
            assert_eq!(result.cloud.get(i), cloud.get(i));
        }
        assert!(!result.faces.is_empty());
        let n = cloud.len() as u32;
        assert!(result.faces.iter().flatten().all(|&i| i < n));
    }

    #[test]
    fn index_expands_repeated_samples() {
        let mut cloud = EngineCloud::new();
        for _ in 0..80 {
            cloud.push_point(1.0, 2.0, 3.0, 0);
        }
        cloud.push_point(5.0, 2.0, 3.0, 0);
        let index = SpatialIndex::new(&cloud.points);
        assert_eq!(index.distinct(), 2);

        let near = index.nearest_n(&[1.0, 2.0, 3.0], 5);
        let indices: Vec<usize> = near.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert!(near.iter().all(|n| n.distance.abs() < 1e-12));

        let all = index.nearest_n(&[5.0, 2.0, 3.0], 100);
        assert_eq!(all.len(), 81);
        assert_eq!(all[0].index, 80);
        assert_eq!(index.within(&[1.0, 2.0, 3.0], 1.0).len(), 80);
    }

    #[test]
    fn index_handles_axis_aligned_plane() {
        let mut cloud = EngineCloud::new();
        for i in 0..20 {
            for j in 0..20 {
                cloud.push_point(i as f32, j as f32, 0.0, 0);
            }
        }
        let index = SpatialIndex::new(&cloud.points);
        assert_eq!(index.distinct(), 400);

        let near = index.nearest_n(&[5.0, 5.0, 0.0], 5);
        assert_eq!(near[0].index, 5 * 20 + 5);
        assert!(near[1..].iter().all(|n| (n.distance - 1.0).abs() < 1e-12));
        assert_eq!(index.within(&[5.0, 5.0, 0.0], 1.5).len(), 5);
    }

    #[test]
    fn empty_index() {
        let index = SpatialIndex::new(&[]);
        assert_eq!(index.distinct(), 0);
        assert!(index.nearest_n(&[0.0; 3], 3).is_empty());
        assert!(index.within(&[0.0; 3], 1.0).is_empty());
    }

    #[test]
    fn negative_zero_shares_a_slot() {
        let mut cloud = EngineCloud::new();
        cloud.push_point(0.0, 0.0, 0.0, 0);
        cloud.push_point(-0.0, 0.0, -0.0, 0);
        assert_eq!(SpatialIndex::new(&cloud.points).distinct(), 1);
    }

    #[test]
    fn flat_cloud_runs_every_stage() {
        let mut cloud = EngineCloud::new();
        for i in 0..12 {
            for j in 0..12 {
                cloud.push_point(i as f32 * 0.5, j as f32 * 0.5, 0.0, 0x00ff_ffff);
            }
        }
        let engine = KdTreeEngine::default();

        let kept = engine.remove_outliers(&cloud, 50, 1.0).unwrap();
        assert!(!kept.is_empty());

        let enriched = engine.estimate_normals(&cloud).unwrap();
        for i in 0..enriched.len() {
            assert!(enriched.normal(i).unwrap().z.abs() > 0.99);
        }

        let result = engine.reconstruct(&enriched).unwrap();
        assert!(!result.faces.is_empty());
        let n = cloud.len() as u32;
        assert!(result.faces.iter().flatten().all(|&i| i < n));
    }

    #[test]
    fn repeated_samples_run_every_stage() {
        let mut cloud = EngineCloud::new();
        for _ in 0..80 {
            cloud.push_point(0.25, 0.25, 0.25, 0x00ff_0000);
        }
        let engine = KdTreeEngine::default();

        let kept = engine.remove_outliers(&cloud, 50, 1.0).unwrap();
        assert_eq!(kept.len(), 80);

        let enriched = engine.estimate_normals(&cloud).unwrap();
        assert!(enriched.has_normals());

        // Coincident points span no triangle
        let result = engine.reconstruct(&enriched).unwrap();
        assert!(result.faces.is_empty());
    }
}
