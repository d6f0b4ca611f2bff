//! M37512 flash protocol
//!
//! The controller exposes its flash through four SMBus block commands:
//!
//! | Command | Code | Payload                                   |
//! |---------|------|-------------------------------------------|
//! | SetReadAddress | `0xFF` | address, little-endian          |
//! | Read16         | `0xFE` | (block read) returns 16 bytes   |
//! | Write          | `0x40` | address little-endian + 1-16 bytes |
//! | EraseBlock     | `0x20` | last block address, **big-endian** |
//!
//! The read pointer set by `SetReadAddress` is device state, so the pair
//! `SetReadAddress` + `Read16` must not be interleaved with any other
//! transaction. [`read16`] issues both back to back on one `&mut` borrow.

use crate::error::{Error, Result};
use crate::programmer::{SmbusMaster, SMBUS_BLOCK_MAX};

/// Set the flash read pointer
pub const CMD_SET_READ_ADDRESS: u8 = 0xFF;
/// Read 16 bytes at the read pointer
pub const CMD_READ16: u8 = 0xFE;
/// Program up to 16 bytes
pub const CMD_WRITE: u8 = 0x40;
/// Erase the block containing the given (last) address
pub const CMD_ERASE_BLOCK: u8 = 0x20;

/// Bytes returned by a single read transaction
pub const READ_CHUNK: usize = 16;
/// Maximum number of data bytes in a single write transaction
pub const WRITE_CHUNK: usize = 16;

/// A single bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction<'a> {
    /// Set the address of the next `Read16`
    SetReadAddress(u16),
    /// Read 16 bytes at the read pointer
    Read16,
    /// Program `data` starting at `addr`
    Write {
        /// First address to program
        addr: u16,
        /// 1 to 16 data bytes
        data: &'a [u8],
    },
    /// Erase the block whose last address is given
    EraseBlock(u16),
}

impl Transaction<'_> {
    /// SMBus command code of this transaction
    pub fn command(&self) -> u8 {
        match self {
            Self::SetReadAddress(_) => CMD_SET_READ_ADDRESS,
            Self::Read16 => CMD_READ16,
            Self::Write { .. } => CMD_WRITE,
            Self::EraseBlock(_) => CMD_ERASE_BLOCK,
        }
    }

    /// Encode the block-write payload into `buf`, returning its length
    ///
    /// `Read16` is a block read and has no payload. A `Write` must carry 1 to
    /// [`WRITE_CHUNK`] bytes, else [`Error::LengthMismatch`].
    pub fn encode_payload(&self, buf: &mut [u8; SMBUS_BLOCK_MAX]) -> Result<usize> {
        match self {
            Self::SetReadAddress(addr) => {
                buf[..2].copy_from_slice(&addr.to_le_bytes());
                Ok(2)
            }
            Self::Read16 => Ok(0),
            Self::Write { addr, data } => {
                if data.is_empty() || data.len() > WRITE_CHUNK {
                    return Err(Error::LengthMismatch {
                        expected: WRITE_CHUNK,
                        actual: data.len(),
                    });
                }
                buf[..2].copy_from_slice(&addr.to_le_bytes());
                buf[2..2 + data.len()].copy_from_slice(data);
                Ok(2 + data.len())
            }
            Self::EraseBlock(addr) => {
                buf[..2].copy_from_slice(&addr.to_be_bytes());
                Ok(2)
            }
        }
    }
}

/// Decode a block-write transaction as received by a device
///
/// Used by simulated backends. Malformed payloads and unknown commands are
/// reported as [`Error::TransportError`].
pub fn decode(command: u8, payload: &[u8]) -> Result<Transaction<'_>> {
    let addr_bytes = |p: &[u8]| -> Result<[u8; 2]> {
        p.get(..2)
            .and_then(|b| b.try_into().ok())
            .ok_or(Error::TransportError)
    };

    match command {
        CMD_SET_READ_ADDRESS if payload.len() == 2 => Ok(Transaction::SetReadAddress(
            u16::from_le_bytes(addr_bytes(payload)?),
        )),
        CMD_WRITE if (3..=2 + WRITE_CHUNK).contains(&payload.len()) => Ok(Transaction::Write {
            addr: u16::from_le_bytes(addr_bytes(payload)?),
            data: &payload[2..],
        }),
        CMD_ERASE_BLOCK if payload.len() == 2 => Ok(Transaction::EraseBlock(
            u16::from_be_bytes(addr_bytes(payload)?),
        )),
        _ => {
            log::error!(
                "m37512: malformed transaction 0x{:02X} with {} byte payload",
                command,
                payload.len()
            );
            Err(Error::TransportError)
        }
    }
}

/// Send one block-write transaction
fn send<M: SmbusMaster + ?Sized>(master: &mut M, tx: &Transaction<'_>) -> Result<()> {
    let mut buf = [0u8; SMBUS_BLOCK_MAX];
    let len = tx.encode_payload(&mut buf)?;
    log::trace!("m37512: cmd 0x{:02X} payload {:02X?}", tx.command(), &buf[..len]);
    master.block_write(tx.command(), &buf[..len])
}

/// Set the read pointer to `addr`
pub fn set_read_address<M: SmbusMaster + ?Sized>(master: &mut M, addr: u16) -> Result<()> {
    send(master, &Transaction::SetReadAddress(addr))
}

/// Read 16 bytes starting at `addr`
///
/// Issues `SetReadAddress` immediately followed by `Read16`. A response of
/// any length other than 16 is a transport fault.
pub fn read16<M: SmbusMaster + ?Sized>(master: &mut M, addr: u16) -> Result<[u8; READ_CHUNK]> {
    set_read_address(master, addr)?;

    let mut buf = [0u8; SMBUS_BLOCK_MAX];
    let len = master.block_read(CMD_READ16, &mut buf)?;
    if len != READ_CHUNK {
        log::error!(
            "m37512: read at 0x{:04X} returned {} bytes, expected {}",
            addr,
            len,
            READ_CHUNK
        );
        return Err(Error::TransportError);
    }

    let mut out = [0u8; READ_CHUNK];
    out.copy_from_slice(&buf[..READ_CHUNK]);
    Ok(out)
}

/// Program 1 to 16 bytes starting at `addr`
pub fn write<M: SmbusMaster + ?Sized>(master: &mut M, addr: u16, data: &[u8]) -> Result<()> {
    send(master, &Transaction::Write { addr, data })
}

/// Erase the block whose last address is `last_addr`
pub fn erase<M: SmbusMaster + ?Sized>(master: &mut M, last_addr: u16) -> Result<()> {
    send(master, &Transaction::EraseBlock(last_addr))
}
