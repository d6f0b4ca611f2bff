//! Error types for m37flash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

use crate::chip::BlockId;

/// Details about a verification failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyFailure {
    /// Two independent reads of the block returned different data
    UnstableRead {
        /// Offset within the block of the first differing byte
        offset: usize,
    },
    /// Flash contents do not match the expected data
    Mismatch {
        /// Offset within the block of the first differing byte
        offset: usize,
        /// The byte value that was expected
        expected: u8,
        /// The byte value read back from flash
        found: u8,
    },
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bus errors
    /// A bus transaction failed or returned a malformed response
    TransportError,

    // Operation errors
    /// Verification of a block failed
    VerifyError {
        /// The block that failed verification
        block: BlockId,
        /// What went wrong
        failure: VerifyFailure,
    },

    // Size errors
    /// Caller supplied block data of the wrong length
    LengthMismatch {
        /// Required length in bytes
        expected: usize,
        /// Supplied length in bytes
        actual: usize,
    },
    /// A dump file does not have the size of the whole memory image
    SizeMismatch {
        /// Required size in bytes
        expected: usize,
        /// Size of the supplied container
        actual: usize,
    },
    /// Block length cannot be read in whole 16-byte transactions
    UnsupportedBlockLength(usize),

    // Address errors
    /// Block identifier is not one of the six fixed blocks
    UnknownBlock(char),
    /// Device address is not inside any block
    AddressOutOfRange(u16),

    // I/O errors
    /// Dump file could not be read or written
    IoError,
}

impl Error {
    /// The block this error refers to, if any
    pub fn block(&self) -> Option<BlockId> {
        match self {
            Self::VerifyError { block, .. } => Some(*block),
            _ => None,
        }
    }

    /// Returns true for verification failures
    pub fn is_verify_error(&self) -> bool {
        matches!(self, Self::VerifyError { .. })
    }
}

impl fmt::Display for VerifyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnstableRead { offset } => {
                write!(f, "two reads differ at offset 0x{:04X}", offset)
            }
            Self::Mismatch {
                offset,
                expected,
                found,
            } => write!(
                f,
                "mismatch at offset 0x{:04X}: expected 0x{:02X}, found 0x{:02X}",
                offset, expected, found
            ),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportError => write!(f, "bus transaction failed"),
            Self::VerifyError { block, failure } => {
                write!(f, "verification of block {} failed: {}", block, failure)
            }
            Self::LengthMismatch { expected, actual } => write!(
                f,
                "length mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            Self::SizeMismatch { expected, actual } => write!(
                f,
                "dump size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            Self::UnsupportedBlockLength(len) => {
                write!(f, "block length {} is not a multiple of 16", len)
            }
            Self::UnknownBlock(c) => write!(f, "unknown block '{}'", c),
            Self::AddressOutOfRange(addr) => {
                write!(f, "address 0x{:04X} is outside every block", addr)
            }
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
