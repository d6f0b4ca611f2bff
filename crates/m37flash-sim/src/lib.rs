//! m37flash-sim - Simulated M37512 for testing
//!
//! This crate provides a bus backend that emulates the flash of an M37512
//! battery controller. The flash contents live in memory and can optionally
//! be backed by a dump file, which is updated after every write and erase so
//! that it always holds the current device state.
//!
//! The simulation follows the real part where it matters for programming:
//! writes can only clear bits, erases reset a whole block to 0xFF and must
//! address the last byte of the block, and every `Read16` needs a fresh
//! `SetReadAddress` right before it.
//!
//! # Example
//!
//! ```no_run
//! use m37flash_core::chip::BlockId;
//! use m37flash_core::flash::FlashProgrammer;
//! use m37flash_sim::SimDevice;
//!
//! let device = SimDevice::open("battery.bin")?;
//! let mut programmer = FlashProgrammer::new(device);
//! let data = programmer.read_block(BlockId::A)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;

pub use error::{Result, SimError};

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use m37flash_core::chip::{self, MEMORY_SIZE};
use m37flash_core::error::{Error as CoreError, Result as CoreResult};
use m37flash_core::flash::ERASED_VALUE;
use m37flash_core::programmer::SmbusMaster;
use m37flash_core::protocol::{self, Transaction, CMD_READ16, READ_CHUNK};

/// Simulated M37512 flash
pub struct SimDevice {
    data: Vec<u8>,
    /// Backing dump file, kept in sync with `data`
    file: Option<(PathBuf, File)>,
    /// Read pointer, valid only until the next transaction
    read_pointer: Option<u16>,
    transactions: usize,
}

impl SimDevice {
    /// Create an in-memory device with erased flash
    pub fn new() -> Self {
        Self {
            data: vec![ERASED_VALUE; MEMORY_SIZE],
            file: None,
            read_pointer: None,
            transactions: 0,
        }
    }

    /// Create an in-memory device with the given flash contents
    pub fn with_data(data: Vec<u8>) -> Result<Self> {
        if data.len() != MEMORY_SIZE {
            return Err(SimError::SizeMismatch {
                expected: MEMORY_SIZE,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            file: None,
            read_pointer: None,
            transactions: 0,
        })
    }

    /// Open a device backed by a dump file
    ///
    /// A missing file is created with erased contents. An existing file
    /// must be exactly one memory image in size.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let open_failed = |source| SimError::OpenFailed {
            path: path.display().to_string(),
            source,
        };

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(open_failed)?;

        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(open_failed)?;

        if data.is_empty() {
            log::info!("sim: Creating erased device in {}", path.display());
            data = vec![ERASED_VALUE; MEMORY_SIZE];
            file.write_all(&data).map_err(open_failed)?;
        } else {
            log::info!("sim: Loaded device from {}", path.display());
        }

        let mut device = Self::with_data(data)?;
        device.file = Some((path.to_path_buf(), file));
        Ok(device)
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|(p, _)| p.as_path())
    }

    /// Number of transactions handled so far
    pub fn transactions(&self) -> usize {
        self.transactions
    }

    /// Write `data[offset..offset + len]` through to the backing file
    fn sync(&mut self, offset: usize, len: usize) -> CoreResult<()> {
        let Some((path, file)) = self.file.as_mut() else {
            return Ok(());
        };
        file.seek(SeekFrom::Start(offset as u64))
            .and_then(|_| file.write_all(&self.data[offset..offset + len]))
            .map_err(|e| {
                log::error!("sim: Failed to update {}: {}", path.display(), e);
                CoreError::TransportError
            })
    }

    fn handle_write(&mut self, addr: u16, data: &[u8]) -> CoreResult<()> {
        let (id, offset) = locate(addr)?;
        let last = addr as usize + data.len() - 1;
        if !chip::lookup(id).device_range().contains(&last) {
            log::error!(
                "sim: Write at 0x{:04X} ({} bytes) crosses the end of block {}",
                addr,
                data.len(),
                id
            );
            return Err(CoreError::TransportError);
        }

        // Flash programming: can only change 1 -> 0
        for (i, &byte) in data.iter().enumerate() {
            self.data[offset + i] &= byte;
        }
        self.sync(offset, data.len())
    }

    fn handle_erase(&mut self, addr: u16) -> CoreResult<()> {
        let (id, _) = locate(addr)?;
        let block = chip::lookup(id);
        if addr != block.last_address() {
            log::error!(
                "sim: Erase address 0x{:04X} is not the last address of block {} (0x{:04X})",
                addr,
                id,
                block.last_address()
            );
            return Err(CoreError::TransportError);
        }

        self.data[block.image_range()].fill(ERASED_VALUE);
        log::debug!("sim: Erased block {}", id);
        self.sync(block.image_offset, block.length)
    }
}

impl Default for SimDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn locate(addr: u16) -> CoreResult<(chip::BlockId, usize)> {
    chip::locate(addr).map_err(|e| {
        log::error!("sim: {}", e);
        CoreError::TransportError
    })
}

impl SmbusMaster for SimDevice {
    fn block_write(&mut self, command: u8, data: &[u8]) -> CoreResult<()> {
        self.transactions += 1;
        // Any transaction other than Read16 invalidates the read pointer
        self.read_pointer = None;

        match protocol::decode(command, data)? {
            Transaction::SetReadAddress(addr) => {
                self.read_pointer = Some(addr);
                Ok(())
            }
            Transaction::Write { addr, data } => self.handle_write(addr, data),
            Transaction::EraseBlock(addr) => self.handle_erase(addr),
            Transaction::Read16 => Err(CoreError::TransportError),
        }
    }

    fn block_read(&mut self, command: u8, buf: &mut [u8]) -> CoreResult<usize> {
        self.transactions += 1;
        if command != CMD_READ16 {
            log::error!("sim: Unsupported block read command 0x{:02X}", command);
            return Err(CoreError::TransportError);
        }

        let Some(addr) = self.read_pointer.take() else {
            log::error!("sim: Read16 without a preceding SetReadAddress");
            return Err(CoreError::TransportError);
        };

        let (id, offset) = locate(addr)?;
        if offset + READ_CHUNK > chip::lookup(id).image_range().end {
            log::error!("sim: Read at 0x{:04X} crosses the end of block {}", addr, id);
            return Err(CoreError::TransportError);
        }

        buf[..READ_CHUNK].copy_from_slice(&self.data[offset..offset + READ_CHUNK]);
        Ok(READ_CHUNK)
    }
}

/// Parse backend options from a list of key-value pairs
///
/// - `file=<path>` - Optional: backing dump file (in-memory when omitted)
pub fn parse_options(options: &[(&str, &str)]) -> Option<PathBuf> {
    let mut file = None;
    for (key, value) in options {
        match *key {
            "file" | "image" => file = Some(PathBuf::from(value)),
            _ => log::warn!("sim: Unknown option: {}={}", key, value),
        }
    }
    file
}

/// Open a simulated device from programmer options
pub fn open_sim(options: &[(&str, &str)]) -> Result<SimDevice> {
    match parse_options(options) {
        Some(path) => SimDevice::open(path),
        None => {
            log::info!("sim: Using in-memory device");
            Ok(SimDevice::new())
        }
    }
}
