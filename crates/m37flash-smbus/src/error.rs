//! Error types for Linux SMBus operations

use thiserror::Error;

/// Linux SMBus specific errors
#[derive(Debug, Error)]
pub enum SmbusError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to select the target address
    #[error("Failed to select SMBus address 0x{address:02X}: {source}")]
    SetAddressFailed {
        address: u8,
        #[source]
        source: std::io::Error,
    },

    /// Adapter lacks the SMBus block transfers the protocol needs
    #[error("Adapter {path} does not support SMBus block read/write")]
    Unsupported { path: String },

    /// SMBus transfer failed
    #[error("SMBus transfer (command 0x{command:02X}) failed: {source}")]
    TransferFailed {
        command: u8,
        #[source]
        source: std::io::Error,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for Linux SMBus operations
pub type Result<T> = std::result::Result<T, SmbusError>;
