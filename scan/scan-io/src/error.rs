//! Error types for codec and export operations.

use thiserror::Error;

use crate::codec::RECORD_SIZE;

/// Result type for codec and export operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur while decoding buffers or writing mesh files.
#[derive(Debug, Error)]
pub enum IoError {
    /// Buffer length is not a whole number of point records.
    #[error(
        "malformed buffer: {len} bytes is not a multiple of {record} (remainder {rem})",
        record = RECORD_SIZE,
        rem = .len % RECORD_SIZE
    )]
    MalformedBuffer {
        /// Length of the rejected buffer.
        len: usize,
    },

    /// A face could not be resolved against its cloud.
    #[error("mesh does not match its cloud: {0}")]
    Mesh(#[from] scan_types::MeshError),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
