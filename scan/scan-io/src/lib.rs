//! Scanner sample codec and mesh-file export.
//!
//! This crate moves scan data across the byte boundary:
//!
//! - **Codec** - 24-byte little-endian point records to and from [`Point`]s
//! - **STL** - ASCII and binary export of a [`Mesh`] resolved against its cloud
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use scan_io::{pack, unpack, write_stl, StlFormat, RECORD_SIZE};
//! use scan_types::{Mesh, Point, ScanColor};
//!
//! let points = vec![
//!     Point::new(0.0, 0.0, 0.0, ScanColor::WHITE),
//!     Point::new(1.0, 0.0, 0.0, ScanColor::WHITE),
//!     Point::new(0.0, 1.0, 0.0, ScanColor::WHITE),
//! ];
//!
//! // Through the wire format and back
//! let bytes = pack(&points);
//! assert_eq!(bytes.len(), 3 * RECORD_SIZE);
//! let decoded = unpack(&bytes).unwrap();
//!
//! // Export one triangle over the decoded cloud
//! let mesh = Mesh::new("scan", vec![[0, 1, 2]]);
//! let mut stl = Vec::new();
//! write_stl(&mesh, &decoded, &mut stl, StlFormat::Ascii).unwrap();
//! assert!(stl.starts_with(b"solid scan"));
//! ```
//!
//! [`Point`]: scan_types::Point
//! [`Mesh`]: scan_types::Mesh

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod codec;
mod error;
mod stl;

pub use codec::{pack, pack_into, pack_iter, unpack, RECORD_SIZE};
pub use error::{IoError, IoResult};
pub use stl::{save_stl, write_stl, StlFormat};
