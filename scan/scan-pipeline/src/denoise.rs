//! Denoising strategies.
//!
//! - **Statistical** - Merges both sides into one engine cloud and removes
//!   statistical outliers
//! - **Side recolor** - A stand-in for builds without a geometry engine. It
//!   removes nothing: every point is recolored by the side it came from and
//!   the two sides are swapped
//!
//! # Example
//!
//! ```
//! use scan_pipeline::{recolor_sides, DenoiseStrategy, MissingEnginePolicy};
//! use scan_types::{PairedCloud, Point, ScanColor};
//!
//! let strategy = DenoiseStrategy::select(false, MissingEnginePolicy::Degrade);
//! assert_eq!(strategy, DenoiseStrategy::SideRecolor);
//!
//! let cloud = PairedCloud::from_sides(vec![Point::from_coords(0.0, 0.0, 0.0)], vec![]);
//! let out = recolor_sides(&cloud);
//! assert_eq!(out.counts(), (0, 1));
//! assert_eq!(out.right[0].color, ScanColor::RED);
//! ```

use scan_engine::{EngineCloud, GeometryEngine};
use scan_types::{PairedCloud, ScanColor, Side};
use tracing::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::MissingEnginePolicy;
use crate::error::PipelineResult;
use crate::store::CloudEntry;

/// How `delete_noise` treats a cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DenoiseStrategy {
    /// Engine-backed statistical outlier removal producing a dense cloud.
    Statistical,

    /// Stub: recolor by side and swap the sides, producing a paired cloud.
    SideRecolor,
}

impl DenoiseStrategy {
    /// Picks the strategy for an engine's availability and the policy.
    ///
    /// Only a missing engine under [`MissingEnginePolicy::Degrade`] selects
    /// the stub. Under [`MissingEnginePolicy::Fail`] the statistical
    /// strategy is kept so every call reports the missing engine.
    #[must_use]
    pub const fn select(engine_available: bool, policy: MissingEnginePolicy) -> Self {
        match (engine_available, policy) {
            (false, MissingEnginePolicy::Degrade) => Self::SideRecolor,
            _ => Self::Statistical,
        }
    }

    /// Returns true if this strategy needs a geometry engine.
    #[must_use]
    pub const fn needs_engine(self) -> bool {
        matches!(self, Self::Statistical)
    }
}

/// Stub color for a side: red `255 - 255 * index`, clamped to `0..=255`.
#[must_use]
pub fn side_color(side: Side) -> ScanColor {
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    let index = side.index() as i64;
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let red = (255 - 255 * index).clamp(0, 255) as u8;
    ScanColor::new(red, 0, 0)
}

/// Recolors every point by its side and swaps the two sides.
///
/// Positions and per-side order are kept; nothing is removed.
#[must_use]
pub fn recolor_sides(cloud: &PairedCloud) -> PairedCloud {
    let recolored = cloud.map_sides(|side, points| {
        let color = side_color(side);
        points.iter().map(|p| p.with_color(color)).collect()
    });
    PairedCloud::from_sides(recolored.right, recolored.left)
}

/// Copies an entry into a single engine cloud, left side first.
#[must_use]
pub fn merge_for_engine(entry: &CloudEntry) -> EngineCloud {
    match entry {
        CloudEntry::Paired(cloud) => cloud.iter().collect(),
        CloudEntry::Dense(cloud) => cloud.to_engine_cloud(),
    }
}

/// Runs statistical outlier removal on an entry.
///
/// # Errors
///
/// Returns an error if the engine is unavailable or rejects the parameters.
pub fn remove_statistical_outliers(
    engine: &dyn GeometryEngine,
    entry: &CloudEntry,
    k_neighbors: usize,
    std_multiplier: f64,
) -> PipelineResult<EngineCloud> {
    let merged = merge_for_engine(entry);
    info!(
        engine = engine.name(),
        points = merged.len(),
        k_neighbors,
        std_multiplier,
        "outlier removal started"
    );
    let filtered = engine.remove_outliers(&merged, k_neighbors, std_multiplier)?;
    info!(
        points = filtered.len(),
        removed = merged.len().saturating_sub(filtered.len()),
        "outlier removal finished"
    );
    Ok(filtered)
}
