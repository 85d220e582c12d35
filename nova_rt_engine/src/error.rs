//! Error types for the NovaRT engine
//!
//! This module defines the error types used throughout the engine.
//! Device-level creation and allocation failures are fatal by design: there
//! is no meaningful retry for out-of-memory or driver errors during one-shot
//! infrastructure setup, so they are surfaced to the caller, who is expected
//! to tear down the render context.

use std::fmt;

/// Result type for NovaRT engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// NovaRT engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// A device-level creation or allocation call failed (image, view,
    /// descriptor layout/pool/set). Fatal; never retried.
    ResourceCreationFailed(String),

    /// The allocator refused a dedicated device-memory allocation
    OutOfDeviceMemory,

    /// Zero width or height passed to image creation
    InvalidDimensions {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },

    /// Backend-specific error (queue submission, wait-idle, etc.)
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ResourceCreationFailed(msg) => write!(f, "Resource creation failed: {}", msg),
            Error::OutOfDeviceMemory => write!(f, "Out of device memory"),
            Error::InvalidDimensions { width, height } => {
                write!(f, "Invalid image dimensions: {}x{}", width, height)
            }
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
