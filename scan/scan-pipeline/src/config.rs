//! Pipeline configuration.
//!
//! # Presets
//!
//! - [`PipelineConfig::default()`] - Degrades to the recolor stub without an
//!   engine, ASCII mesh output
//! - [`PipelineConfig::strict()`] - Fails engine operations without an engine
//!
//! # Example
//!
//! ```
//! use scan_io::StlFormat;
//! use scan_pipeline::{MissingEnginePolicy, PipelineConfig};
//!
//! let config = PipelineConfig::default()
//!     .with_sor_neighbors(30)
//!     .with_mesh_output("out/scan.stl", StlFormat::Binary)
//!     .with_missing_engine(MissingEnginePolicy::Fail);
//!
//! assert_eq!(config.sor_neighbors, 30);
//! ```

use std::path::PathBuf;

use scan_io::StlFormat;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What engine-backed operations do when no engine is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MissingEnginePolicy {
    /// Denoise with the side-recolor stub instead. Meshing still fails.
    #[default]
    Degrade,

    /// Fail every engine-backed operation with `EngineUnavailable`.
    Fail,
}

/// Configuration for a [`ScanPipeline`](crate::ScanPipeline).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineConfig {
    /// Neighbors considered by statistical outlier removal. Default: 50.
    pub sor_neighbors: usize,

    /// Store name for the normal-estimated copy made while meshing.
    /// Default: `"normals"`.
    pub normals_cloud_name: String,

    /// Where [`to_mesh`](crate::ScanPipeline::to_mesh) writes the mesh file.
    /// Default: `"scan_mesh.stl"`.
    pub mesh_output_path: PathBuf,

    /// Mesh file flavor. Default: ASCII.
    pub stl_format: StlFormat,

    /// Behavior without a geometry engine. Default: degrade.
    pub missing_engine: MissingEnginePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sor_neighbors: 50,
            normals_cloud_name: "normals".to_string(),
            mesh_output_path: PathBuf::from("scan_mesh.stl"),
            stl_format: StlFormat::Ascii,
            missing_engine: MissingEnginePolicy::Degrade,
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Never falls back to stub behavior.
    #[must_use]
    pub fn strict() -> Self {
        Self::default().with_missing_engine(MissingEnginePolicy::Fail)
    }

    /// Sets the outlier-removal neighbor count.
    #[must_use]
    pub const fn with_sor_neighbors(mut self, k: usize) -> Self {
        self.sor_neighbors = k;
        self
    }

    /// Sets the store name of the normal-estimated copy.
    #[must_use]
    pub fn with_normals_cloud_name(mut self, name: impl Into<String>) -> Self {
        self.normals_cloud_name = name.into();
        self
    }

    /// Sets the mesh file path and format.
    #[must_use]
    pub fn with_mesh_output(mut self, path: impl Into<PathBuf>, format: StlFormat) -> Self {
        self.mesh_output_path = path.into();
        self.stl_format = format;
        self
    }

    /// Sets the missing-engine policy.
    #[must_use]
    pub const fn with_missing_engine(mut self, policy: MissingEnginePolicy) -> Self {
        self.missing_engine = policy;
        self
    }
}
