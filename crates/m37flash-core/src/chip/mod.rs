//! Flash geometry of the M37512
//!
//! The controller's flash is split into six fixed blocks. This module holds
//! the block table and the lookups that translate between block identifiers,
//! device addresses and offsets in the flat memory image.

mod map;
mod types;

pub use map::*;
pub use types::{BlockId, MemoryBlock};
