//! Block-length reads and writes on top of the 16-byte transactions

use alloc::vec;
use alloc::vec::Vec;

use crate::chip::MemoryBlock;
use crate::error::{Error, Result};
use crate::programmer::SmbusMaster;
use crate::protocol::{self, READ_CHUNK, WRITE_CHUNK};

/// Turns block reads, span writes and block erases into bus transactions
///
/// The transport owns the bus backend. It never retries: the first failing
/// transaction aborts the operation.
pub struct BlockTransport<M> {
    master: M,
}

impl<M: SmbusMaster> BlockTransport<M> {
    /// Wrap a bus backend
    pub fn new(master: M) -> Self {
        Self { master }
    }

    /// Get a reference to the bus backend
    pub fn master(&self) -> &M {
        &self.master
    }

    /// Get a mutable reference to the bus backend
    pub fn master_mut(&mut self) -> &mut M {
        &mut self.master
    }

    /// Release the bus backend
    pub fn into_inner(self) -> M {
        self.master
    }

    /// Read a whole block, 16 bytes per transaction
    pub fn read_block(&mut self, block: &MemoryBlock) -> Result<Vec<u8>> {
        if block.length % READ_CHUNK != 0 {
            return Err(Error::UnsupportedBlockLength(block.length));
        }

        let mut data = vec![0u8; block.length];
        for (i, chunk) in data.chunks_exact_mut(READ_CHUNK).enumerate() {
            let addr = block.device_address.wrapping_add((i * READ_CHUNK) as u16);
            chunk.copy_from_slice(&protocol::read16(&mut self.master, addr)?);
        }

        log::trace!(
            "Read block {} ({} transactions)",
            block.id,
            block.length / READ_CHUNK
        );
        Ok(data)
    }

    /// Program up to 16 bytes at `addr` in one transaction
    pub fn write_span(&mut self, addr: u16, data: &[u8]) -> Result<()> {
        if data.is_empty() || data.len() > WRITE_CHUNK {
            return Err(Error::LengthMismatch {
                expected: WRITE_CHUNK,
                actual: data.len(),
            });
        }
        protocol::write(&mut self.master, addr, data)
    }

    /// Erase a whole block
    ///
    /// The erase command addresses the *last* byte of the block.
    pub fn erase(&mut self, block: &MemoryBlock) -> Result<()> {
        log::trace!(
            "Erasing block {} via address 0x{:04X}",
            block.id,
            block.last_address()
        );
        protocol::erase(&mut self.master, block.last_address())
    }
}
