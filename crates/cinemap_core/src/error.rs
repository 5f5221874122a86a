//! Surface error types

use thiserror::Error;

/// Errors raised by a rendering surface while reading or writing the camera
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// The surface rejected a camera write
    #[error("Camera apply failed: {0}")]
    Apply(String),

    /// The surface is gone (destroyed, context lost)
    #[error("Surface unavailable: {0}")]
    Unavailable(String),
}

/// Result type for surface operations
pub type Result<T> = std::result::Result<T, SurfaceError>;
