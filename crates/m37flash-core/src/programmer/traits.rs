//! Programmer trait definitions

use crate::error::Result;

/// Maximum payload of an SMBus block transfer
pub const SMBUS_BLOCK_MAX: usize = 32;

/// SMBus master trait
///
/// This trait represents a bus backend that can perform SMBus block
/// transfers to the battery controller. The M37512 flash protocol only needs
/// the two block primitives; the [`protocol`](crate::protocol) module builds
/// the four flash transactions on top of them.
///
/// Implementations must perform each call as exactly one bus transaction and
/// must not retry on failure. Any failure is reported as
/// [`Error::TransportError`](crate::Error::TransportError), after logging the
/// underlying cause.
///
/// ## Example: simulated controller
///
/// ```ignore
/// impl SmbusMaster for MyDevice {
///     fn block_write(&mut self, command: u8, data: &[u8]) -> Result<()> {
///         match protocol::decode(command, data)? {
///             Transaction::SetReadAddress(addr) => self.pointer = addr,
///             // ...
///         }
///         Ok(())
///     }
///
///     fn block_read(&mut self, command: u8, buf: &mut [u8]) -> Result<usize> {
///         // ...
///     }
/// }
/// ```
pub trait SmbusMaster {
    /// SMBus "Block Write": send `command` followed by a byte count and `data`
    ///
    /// `data` is at most [`SMBUS_BLOCK_MAX`] bytes long.
    fn block_write(&mut self, command: u8, data: &[u8]) -> Result<()>;

    /// SMBus "Block Read": send `command`, then receive a counted block
    ///
    /// The received bytes are stored at the start of `buf` (which is at least
    /// [`SMBUS_BLOCK_MAX`] bytes long) and their number is returned.
    fn block_read(&mut self, command: u8, buf: &mut [u8]) -> Result<usize>;
}

// Blanket impls so boxed backends and borrowed backends can be used anywhere
// a concrete backend is expected
impl<M: SmbusMaster + ?Sized> SmbusMaster for alloc::boxed::Box<M> {
    fn block_write(&mut self, command: u8, data: &[u8]) -> Result<()> {
        (**self).block_write(command, data)
    }

    fn block_read(&mut self, command: u8, buf: &mut [u8]) -> Result<usize> {
        (**self).block_read(command, buf)
    }
}

impl<M: SmbusMaster + ?Sized> SmbusMaster for &mut M {
    fn block_write(&mut self, command: u8, data: &[u8]) -> Result<()> {
        (**self).block_write(command, data)
    }

    fn block_read(&mut self, command: u8, buf: &mut [u8]) -> Result<usize> {
        (**self).block_read(command, buf)
    }
}

/// Information about a programmer
#[derive(Debug, Clone)]
pub struct ProgrammerInfo {
    /// Name of the programmer
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Description
    pub description: &'static str,
    /// Whether this programmer talks to real hardware
    pub hardware: bool,
}

impl ProgrammerInfo {
    /// Check whether `name` is the name or an alias of this programmer
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}
