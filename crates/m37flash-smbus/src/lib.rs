//! m37flash-smbus - Linux i2c-dev SMBus support
//!
//! This crate provides access to the battery controller through the Linux
//! `/dev/i2c-N` character devices, using the kernel's SMBus block transfer
//! ioctls.
//!
//! # Example
//!
//! ```no_run
//! use m37flash_smbus::{LinuxSmbus, LinuxSmbusConfig};
//! use m37flash_core::flash::FlashProgrammer;
//! use m37flash_core::chip::BlockId;
//!
//! // Battery on bus 5 at the default smart battery address 0x0B
//! let bus = LinuxSmbus::open(&LinuxSmbusConfig::for_bus(5))?;
//! let mut programmer = FlashProgrammer::new(bus);
//! let data = programmer.read_block(BlockId::B)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the m37flash CLI
//!
//! ```bash
//! m37flash read -p smbus:bus=5 -o battery.bin
//! m37flash write -p smbus:dev=/dev/i2c-2,addr=0x0b -i battery.bin --blocks AB
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with `i2c-dev` loaded
//! - Read/write access to `/dev/i2c-N`
//! - An adapter that supports SMBus block read and block write

pub mod device;
pub mod error;

pub use device::{parse_options, LinuxSmbus, LinuxSmbusConfig, DEFAULT_ADDRESS, DEFAULT_BUS};
pub use error::{Result, SmbusError};

/// Open a Linux SMBus device from programmer options
///
/// # Example Options
///
/// - `bus=5` - Optional: bus number (default: 5)
/// - `dev=/dev/i2c-5` - Optional: device path, overrides `bus`
/// - `addr=0x0b` - Optional: 7-bit SMBus address (default: 0x0B)
pub fn open_smbus(options: &[(&str, &str)]) -> Result<LinuxSmbus> {
    let config = parse_options(options)?;
    LinuxSmbus::open(&config)
}
