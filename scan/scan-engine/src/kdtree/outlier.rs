//! Statistical outlier removal.
//!
//! For each point:
//! 1. Find the k nearest neighbors
//! 2. Compute the mean distance to those neighbors
//!
//! A point is an outlier if its mean distance exceeds
//! `global_mean + std_multiplier * std_dev`.

use tracing::debug;

use super::SpatialIndex;
use crate::cloud::EngineCloud;

/// Removes statistical outliers, keeping the order of survivors.
///
/// Clouds with no more than `k_neighbors` points are returned unchanged,
/// there is no neighborhood to compare against.
pub(super) fn remove_outliers(
    cloud: &EngineCloud,
    k_neighbors: usize,
    std_multiplier: f64,
) -> EngineCloud {
    if cloud.len() <= k_neighbors {
        debug!(
            points = cloud.len(),
            k_neighbors, "cloud too small for outlier removal, kept as is"
        );
        return cloud.clone();
    }

    let (keep, threshold) = compute_outlier_mask(cloud, k_neighbors, std_multiplier);
    let filtered = cloud.retain_mask(&keep);
    debug!(
        threshold,
        removed = cloud.len() - filtered.len(),
        "outlier removal"
    );
    filtered
}

/// Computes which points to keep and the distance threshold used.
fn compute_outlier_mask(
    cloud: &EngineCloud,
    k_neighbors: usize,
    std_multiplier: f64,
) -> (Vec<bool>, f64) {
    let index = SpatialIndex::new(&cloud.points);

    let mean_distances: Vec<f64> = cloud
        .points
        .iter()
        .map(|point| {
            let neighbors = index.nearest_n(&point.coords(), k_neighbors + 1);

            // First hit is the point itself, or a sample at the same spot
            let sum: f64 = neighbors.iter().skip(1).map(|n| n.distance.sqrt()).sum();

            #[allow(clippy::cast_precision_loss)]
            let mean = if neighbors.len() > 1 {
                sum / (neighbors.len() - 1) as f64
            } else {
                0.0
            };
            mean
        })
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let count = mean_distances.len() as f64;
    let global_mean = mean_distances.iter().sum::<f64>() / count;
    let variance = mean_distances
        .iter()
        .map(|d| (d - global_mean).powi(2))
        .sum::<f64>()
        / count;

    let threshold = std_multiplier.mul_add(variance.sqrt(), global_mean);
    let keep = mean_distances.iter().map(|&d| d <= threshold).collect();

    (keep, threshold)
}
