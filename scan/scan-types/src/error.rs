//! Error types for mesh resolution.

use thiserror::Error;

/// Result type for resolving meshes against clouds.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that can occur when a mesh is resolved against its cloud.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// A face references a point the cloud does not have.
    ///
    /// This happens when the referenced cloud was overwritten after the mesh
    /// was built.
    #[error("face {face} references point {index}, but the cloud has {len} points")]
    IndexOutOfRange {
        /// Index of the offending face.
        face: usize,
        /// The point index that could not be resolved.
        index: u32,
        /// Number of points in the cloud.
        len: usize,
    },
}
