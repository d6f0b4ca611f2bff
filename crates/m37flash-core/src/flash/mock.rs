//! Recording controller model used by the flash engine tests

use alloc::vec;
use alloc::vec::Vec;

use crate::chip::{self, MEMORY_SIZE};
use crate::error::{Error, Result};
use crate::programmer::SmbusMaster;
use crate::protocol::{self, Transaction, CMD_READ16, READ_CHUNK};

/// A transaction as seen by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    SetReadAddress(u16),
    Read16,
    Write(u16, Vec<u8>),
    Erase(u16),
}

/// In-memory M37512 that logs every transaction
///
/// Programming ANDs data into flash and erase resets the owning block to
/// 0xFF, like the real part.
pub struct MockBus {
    pub image: Vec<u8>,
    pub log: Vec<Op>,
    pointer: u16,
    reads: usize,
    /// Flip the first byte of the n-th (0-based) Read16 response
    pub corrupt_read: Option<usize>,
    /// Image offset that always reads back as the given value
    pub stuck: Option<(usize, u8)>,
    /// Fail every transaction once this many have been issued
    pub fail_after: Option<usize>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::with_image(vec![0xFF; MEMORY_SIZE])
    }

    pub fn with_image(image: Vec<u8>) -> Self {
        assert_eq!(image.len(), MEMORY_SIZE);
        Self {
            image,
            log: Vec::new(),
            pointer: 0,
            reads: 0,
            corrupt_read: None,
            stuck: None,
            fail_after: None,
        }
    }

    pub fn erases(&self) -> usize {
        self.log.iter().filter(|op| matches!(op, Op::Erase(_))).count()
    }

    pub fn writes(&self) -> usize {
        self.log.iter().filter(|op| matches!(op, Op::Write(..))).count()
    }

    /// Transactions other than reads, in issue order
    pub fn mutations(&self) -> Vec<&Op> {
        self.log
            .iter()
            .filter(|op| matches!(op, Op::Write(..) | Op::Erase(_)))
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn check_fault(&self) -> Result<()> {
        match self.fail_after {
            Some(limit) if self.log.len() >= limit => Err(Error::TransportError),
            _ => Ok(()),
        }
    }
}

impl SmbusMaster for MockBus {
    fn block_write(&mut self, command: u8, data: &[u8]) -> Result<()> {
        self.check_fault()?;
        match protocol::decode(command, data)? {
            Transaction::SetReadAddress(addr) => {
                self.pointer = addr;
                self.log.push(Op::SetReadAddress(addr));
            }
            Transaction::Write { addr, data } => {
                let (_, offset) = chip::locate(addr)?;
                for (i, b) in data.iter().enumerate() {
                    self.image[offset + i] &= *b;
                }
                self.log.push(Op::Write(addr, data.to_vec()));
            }
            Transaction::EraseBlock(addr) => {
                let (id, _) = chip::locate(addr)?;
                self.image[chip::lookup(id).image_range()].fill(0xFF);
                self.log.push(Op::Erase(addr));
            }
            Transaction::Read16 => return Err(Error::TransportError),
        }
        Ok(())
    }

    fn block_read(&mut self, command: u8, buf: &mut [u8]) -> Result<usize> {
        self.check_fault()?;
        if command != CMD_READ16 {
            return Err(Error::TransportError);
        }
        let (_, offset) = chip::locate(self.pointer)?;
        buf[..READ_CHUNK].copy_from_slice(&self.image[offset..offset + READ_CHUNK]);
        if let Some((stuck_offset, value)) = self.stuck {
            if (offset..offset + READ_CHUNK).contains(&stuck_offset) {
                buf[stuck_offset - offset] = value;
            }
        }
        if self.corrupt_read == Some(self.reads) {
            buf[0] ^= 0x01;
        }
        self.reads += 1;
        self.log.push(Op::Read16);
        Ok(READ_CHUNK)
    }
}
