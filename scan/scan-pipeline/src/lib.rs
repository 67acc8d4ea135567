//! Named point-cloud pipeline for paired scanner output.
//!
//! Raw left/right buffers are uploaded into a [`CloudStore`] and then
//! transformed name to name:
//!
//! - **Cut** - Crop along an axis or radially ([`Cut`])
//! - **Denoise** - Statistical outlier removal through a geometry engine, or
//!   a side-recolor stub without one ([`DenoiseStrategy`])
//! - **Mesh** - Normals and surface reconstruction into a [`Mesh`](scan_types::Mesh),
//!   exported as STL
//! - **Dump** - Pack a stored cloud back into point records
//!
//! Transforms never modify their input; each writes one new entry, replacing
//! whatever was stored under the output name.
//!
//! # Quick Start
//!
//! ```
//! use scan_engine::KdTreeEngine;
//! use scan_io::pack;
//! use scan_pipeline::{PipelineConfig, ScanPipeline};
//! use scan_types::Point;
//!
//! let left: Vec<Point> = (0..30)
//!     .map(|i| {
//!         let t = i as f32;
//!         Point::from_coords(t * 0.1, t * 0.002, t * 0.003)
//!     })
//!     .collect();
//!
//! let mut pipeline = ScanPipeline::new(
//!     Box::new(KdTreeEngine::default()),
//!     PipelineConfig::default().with_sor_neighbors(5),
//! );
//! pipeline.upload("scan", &pack(&left), &[]).unwrap();
//! pipeline.delete_noise("scan", "clean", 2.0).unwrap();
//!
//! let dump = pipeline.dump("clean").unwrap();
//! assert_eq!(dump.right_count, 0);
//! assert!(dump.left_count <= 30);
//! ```
//!
//! # Logging
//!
//! Operations log through `tracing`; installing a subscriber is up to the
//! application.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod config;
mod denoise;
mod error;
mod filter;
mod mesher;
mod pipeline;
mod serializer;
mod store;

pub use config::{MissingEnginePolicy, PipelineConfig};
pub use denoise::{
    merge_for_engine, recolor_sides, remove_statistical_outliers, side_color, DenoiseStrategy,
};
pub use error::{PipelineError, PipelineResult};
pub use filter::{Axis, Cut, Direction};
pub use mesher::{build_mesh, MeshBuild};
pub use pipeline::ScanPipeline;
pub use serializer::{dump, export_mesh, Dump};
pub use store::{CloudEntry, CloudStore, DenseCloud};
