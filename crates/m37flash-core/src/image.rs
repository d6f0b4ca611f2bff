//! The flat memory image
//!
//! A [`MemoryImage`] holds the contents of the whole device as one buffer of
//! [`MEMORY_SIZE`] bytes. Byte `i` of the buffer is image offset `i`; the
//! address map places each block at its fixed offset. On disk the image is
//! stored verbatim (BE2Works-compatible dump, no header, no checksum).

use alloc::vec;
use alloc::vec::Vec;

use crate::chip::{self, BlockId, MEMORY_SIZE};
use crate::error::{Error, Result};
use crate::flash::ERASED_VALUE;

/// In-memory copy of the whole flash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    data: Vec<u8>,
}

impl MemoryImage {
    /// Create an image with every byte erased (0xFF)
    pub fn open_for_write() -> Self {
        Self {
            data: vec![ERASED_VALUE; MEMORY_SIZE],
        }
    }

    /// Wrap an existing buffer, which must be exactly [`MEMORY_SIZE`] bytes
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() != MEMORY_SIZE {
            return Err(Error::SizeMismatch {
                expected: MEMORY_SIZE,
                actual: data.len(),
            });
        }
        Ok(Self { data })
    }

    /// Load a dump file
    ///
    /// Fails with [`Error::SizeMismatch`] if the file does not hold exactly
    /// [`MEMORY_SIZE`] bytes.
    #[cfg(feature = "std")]
    pub fn open_for_read(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            log::error!("Cannot read {}: {}", path.display(), e);
            Error::IoError
        })?;
        log::debug!("Loaded {} bytes from {}", data.len(), path.display());
        Self::from_bytes(data)
    }

    /// Write the image to a dump file, replacing any existing file
    #[cfg(feature = "std")]
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.data).map_err(|e| {
            log::error!("Cannot write {}: {}", path.display(), e);
            Error::IoError
        })?;
        log::debug!("Saved {} bytes to {}", self.data.len(), path.display());
        Ok(())
    }

    /// Contents of one block
    pub fn get_block(&self, id: BlockId) -> &[u8] {
        &self.data[chip::lookup(id).image_range()]
    }

    /// Replace the contents of one block
    pub fn put_block(&mut self, id: BlockId, data: &[u8]) -> Result<()> {
        let block = chip::lookup(id);
        if data.len() != block.length {
            return Err(Error::LengthMismatch {
                expected: block.length,
                actual: data.len(),
            });
        }
        self.data[block.image_range()].copy_from_slice(data);
        Ok(())
    }

    /// The whole image
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self::open_for_write()
    }
}
