//! Geometry engine abstraction for scanned point clouds.
//!
//! Spatial algorithms sit behind the [`GeometryEngine`] trait so a pipeline
//! can run with full geometry support or without it:
//!
//! - [`KdTreeEngine`] - Outlier removal, PCA normals and Ball Pivoting
//!   reconstruction over kd-tree neighbor queries
//! - [`NullEngine`] - Reports itself unavailable and fails every operation
//!
//! Engines work on [`EngineCloud`], a dense cloud handle that is filled point
//! by point and read back by index.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use scan_engine::{EngineCloud, GeometryEngine, KdTreeEngine, NullEngine};
//! use scan_types::{Point, ScanColor};
//!
//! let cloud: EngineCloud = (0..20)
//!     .map(|i| {
//!         let t = i as f32;
//!         Point::new(t * 0.1, t * 0.002, t * 0.003, ScanColor::WHITE)
//!     })
//!     .collect();
//!
//! let engine = KdTreeEngine::default();
//! let kept = engine.remove_outliers(&cloud, 5, 1.0).unwrap();
//! assert!(kept.len() <= cloud.len());
//!
//! assert!(NullEngine.remove_outliers(&cloud, 5, 1.0).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod cloud;
mod engine;
mod error;
mod kdtree;

pub use cloud::EngineCloud;
pub use engine::{GeometryEngine, NullEngine, Reconstruction};
pub use error::{EngineError, EngineResult};
pub use kdtree::{EngineParams, KdTreeEngine};
