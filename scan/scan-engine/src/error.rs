//! Error types for geometry engine operations.

use thiserror::Error;

/// Result type for geometry engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during geometry engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The engine cannot run geometry operations in this build.
    #[error("geometry engine unavailable: cannot run {operation}")]
    Unavailable {
        /// The operation that was requested.
        operation: &'static str,
    },

    /// Not enough points for the requested operation.
    #[error("insufficient points: need at least {required}, got {actual}")]
    InsufficientPoints {
        /// Minimum number of points required.
        required: usize,
        /// Actual number of points provided.
        actual: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// Surface reconstruction failed.
    #[error("reconstruction failed: {reason}")]
    ReconstructionFailed {
        /// Description of why reconstruction failed.
        reason: String,
    },
}
