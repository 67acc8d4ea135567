//! The geometry engine seam.

use std::fmt;

use scan_types::Face;

use crate::cloud::EngineCloud;
use crate::error::{EngineError, EngineResult};

/// Spatial algorithms a processing pipeline delegates to.
///
/// Every operation reads its input cloud and returns a new one; inputs are
/// never modified. Implementations treat each call as atomic.
pub trait GeometryEngine: fmt::Debug {
    /// Short human-readable engine name for logs.
    fn name(&self) -> &'static str;

    /// Returns false if the engine cannot run any geometry operation.
    fn is_available(&self) -> bool;

    /// Statistical outlier removal.
    ///
    /// A point is kept if the mean distance to its `k_neighbors` nearest
    /// neighbors is at most `global_mean + std_multiplier * std_dev`, taken
    /// over all points' mean distances. Surviving points keep their order.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is unavailable or the parameters are
    /// invalid.
    fn remove_outliers(
        &self,
        cloud: &EngineCloud,
        k_neighbors: usize,
        std_multiplier: f64,
    ) -> EngineResult<EngineCloud>;

    /// Returns a copy of `cloud` with a unit normal on every point.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is unavailable or the cloud is too
    /// small to estimate normals.
    fn estimate_normals(&self, cloud: &EngineCloud) -> EngineResult<EngineCloud>;

    /// Triangulates a cloud that carries normals.
    ///
    /// The returned cloud lists the same points in the same order as the
    /// input, so face indices are valid against the input cloud as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is unavailable, the cloud is empty or
    /// it has no normals.
    fn reconstruct(&self, cloud: &EngineCloud) -> EngineResult<Reconstruction>;
}

/// Output of [`GeometryEngine::reconstruct`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    /// The mesh vertices, index-aligned with the input cloud.
    pub cloud: EngineCloud,
    /// Triangles as indices into `cloud`.
    pub faces: Vec<Face>,
}

impl fmt::Display for Reconstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reconstruction: {} vertices, {} triangles",
            self.cloud.len(),
            self.faces.len()
        )
    }
}

/// An engine for builds without geometry support.
///
/// Reports itself unavailable and fails every operation with
/// [`EngineError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEngine;

impl GeometryEngine for NullEngine {
    fn name(&self) -> &'static str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn remove_outliers(
        &self,
        _cloud: &EngineCloud,
        _k_neighbors: usize,
        _std_multiplier: f64,
    ) -> EngineResult<EngineCloud> {
        Err(EngineError::Unavailable {
            operation: "outlier removal",
        })
    }

    fn estimate_normals(&self, _cloud: &EngineCloud) -> EngineResult<EngineCloud> {
        Err(EngineError::Unavailable {
            operation: "normal estimation",
        })
    }

    fn reconstruct(&self, _cloud: &EngineCloud) -> EngineResult<Reconstruction> {
        Err(EngineError::Unavailable {
            operation: "surface reconstruction",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_engine_fails_everything() {
        let engine = NullEngine;
        let cloud = EngineCloud::new();

        assert!(!engine.is_available());
        assert!(matches!(
            engine.remove_outliers(&cloud, 50, 1.0),
            Err(EngineError::Unavailable { .. })
        ));
        assert!(matches!(
            engine.estimate_normals(&cloud),
            Err(EngineError::Unavailable { .. })
        ));
        assert!(matches!(
            engine.reconstruct(&cloud),
            Err(EngineError::Unavailable { .. })
        ));
    }

    #[test]
    fn reconstruction_display() {
        let r = Reconstruction {
            cloud: EngineCloud::new(),
            faces: vec![[0, 1, 2]],
        };
        assert_eq!(r.to_string(), "Reconstruction: 0 vertices, 1 triangles");
    }
}
