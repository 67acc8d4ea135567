//! Core types for scanner point-cloud processing.
//!
//! This crate provides the foundational types shared by the scan crates:
//!
//! - [`Point`] - A scanned sample: position plus display-range color
//! - [`ScanColor`] - RGB color with 8-bit components
//! - [`Side`] - Which scanner camera produced a sample
//! - [`PairedCloud`] - Left and right sample sequences, not yet merged
//! - [`Mesh`] - A face list referencing a named cloud
//! - [`PointSource`] - Random access to points by index
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It carries no
//! I/O and no algorithms, only data.
//!
//! # Units
//!
//! Positions are `f32` in the scanner's real-world units. Colors are always
//! integers in `0..=255`; the normalized `[0, 1]` form only exists on the wire.
//!
//! # Example
//!
//! ```
//! use scan_types::{PairedCloud, Point, ScanColor, Side};
//!
//! let mut cloud = PairedCloud::new();
//! cloud.side_mut(Side::Left).push(Point::new(0.0, 0.0, 1.0, ScanColor::RED));
//! cloud.side_mut(Side::Right).push(Point::from_coords(1.0, 0.0, 1.0));
//!
//! assert_eq!(cloud.len(), 2);
//! assert_eq!(cloud.counts(), (1, 1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod cloud;
mod error;
mod mesh;
mod point;

pub use cloud::{PairedCloud, PointSource};
pub use error::{MeshError, MeshResult};
pub use mesh::{Face, Mesh, Triangle};
pub use point::{Point, ScanColor, Side};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
