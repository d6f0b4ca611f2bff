//! m37flash-core - Core library for M37512 flash programming
//!
//! This crate provides the functionality for reading, writing, erasing and
//! verifying the internal flash of the M37512 smart battery controller over
//! SMBus. Everything except dump-file I/O is `no_std` compatible (it only
//! needs `alloc`).
//!
//! # Layers
//!
//! - [`chip`] - the fixed block geometry (address map)
//! - [`programmer`] - the [`SmbusMaster`](programmer::SmbusMaster) trait every
//!   bus backend implements
//! - [`protocol`] - the four M37512 bus transactions encoded on top of SMBus
//! - [`flash`] - block transport, the diff/erase/write/verify engine and batch
//!   operations
//! - [`image`] - the flat memory image / dump file
//!
//! # Features
//!
//! - `std` - Enable loading and saving dump files
//!
//! # Example
//!
//! ```ignore
//! use m37flash_core::chip::BlockId;
//! use m37flash_core::flash::FlashProgrammer;
//!
//! let mut programmer = FlashProgrammer::new(bus);
//! let data = programmer.read_block(BlockId::B)?;
//! assert_eq!(data.len(), 0x800);
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod chip;
pub mod error;
pub mod flash;
pub mod image;
pub mod programmer;
pub mod protocol;

pub use error::{Error, Result, VerifyFailure};
