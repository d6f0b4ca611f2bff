//! Protocol implementations
//!
//! This module contains the M37512 flash command set as it is carried over
//! SMBus block transfers.

mod m37512;

pub use m37512::*;
