//! Error types for the simulated device

use thiserror::Error;

/// Simulation backend errors
#[derive(Debug, Error)]
pub enum SimError {
    /// Failed to open or initialize the backing file
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Backing file or initial data has the wrong size
    #[error("Device image must be {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Result type for simulation operations
pub type Result<T> = std::result::Result<T, SimError>;
