//! Error types for pipeline operations.

use scan_engine::EngineError;
use scan_io::IoError;
use scan_types::MeshError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can occur during pipeline operations.
///
/// A failing operation never modifies the cloud store.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An input buffer is not a whole number of point records.
    #[error("malformed buffer: {len} bytes is not a multiple of {record}", record = scan_io::RECORD_SIZE)]
    MalformedBuffer {
        /// Length of the rejected buffer.
        len: usize,
    },

    /// The filter axis token is not one of `x`, `y`, `z` or `r`.
    #[error("invalid filter mode: {mode:?}")]
    InvalidFilterMode {
        /// The rejected token.
        mode: String,
    },

    /// No cloud is stored under the name.
    #[error("unknown cloud: {name:?}")]
    UnknownCloudName {
        /// The missing name.
        name: String,
    },

    /// Packed output does not match the point counts.
    #[error("dump size mismatch: expected {expected} bytes, packed {actual}")]
    DumpSizeMismatch {
        /// Bytes implied by the point counts.
        expected: usize,
        /// Bytes actually produced.
        actual: usize,
    },

    /// A geometry operation was requested without a working engine.
    #[error("geometry engine unavailable: cannot run {operation}")]
    EngineUnavailable {
        /// The operation that was requested.
        operation: &'static str,
    },

    /// The operation needs a dense cloud but the entry is paired.
    #[error("cloud {name:?} is paired, a dense cloud is required")]
    NotDense {
        /// Name of the paired entry.
        name: String,
    },

    /// The operation needs a paired cloud but the entry is dense.
    #[error("cloud {name:?} is dense, a paired cloud is required")]
    NotPaired {
        /// Name of the dense entry.
        name: String,
    },

    /// No mesh has been built for the name.
    #[error("no mesh built for cloud {name:?}")]
    UnknownMesh {
        /// The cloud name the mesh was looked up by.
        name: String,
    },

    /// A mesh face points past the end of its cloud.
    ///
    /// Happens when the referenced cloud was overwritten after the mesh was
    /// built.
    #[error("mesh references point {index} but the cloud has {len} points")]
    MeshIndexOutOfRange {
        /// The offending point index.
        index: u32,
        /// Number of points in the cloud.
        len: usize,
    },

    /// The geometry engine failed.
    #[error("engine error: {0}")]
    Engine(EngineError),

    /// Writing a mesh file failed.
    #[error("I/O error: {0}")]
    Io(IoError),
}

impl From<EngineError> for PipelineError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Unavailable { operation } => Self::EngineUnavailable { operation },
            other => Self::Engine(other),
        }
    }
}

impl From<IoError> for PipelineError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::MalformedBuffer { len } => Self::MalformedBuffer { len },
            IoError::Mesh(MeshError::IndexOutOfRange { index, len, .. }) => {
                Self::MeshIndexOutOfRange { index, len }
            }
            other => Self::Io(other),
        }
    }
}

impl From<MeshError> for PipelineError {
    fn from(err: MeshError) -> Self {
        IoError::from(err).into()
    }
}
