//! High-level flash operations
//!
//! This module provides verified reads, smart writes, verification and
//! erasing of M37512 flash blocks, plus batch helpers over block selections.

mod batch;
#[cfg(test)]
mod mock;
mod operations;
mod programmer;
mod transport;

pub use batch::{BatchPolicy, BatchReport, BlockProgress, NoProgress};
pub use operations::*;
pub use programmer::{FlashProgrammer, WritePlan, WriteStats};
pub use transport::BlockTransport;
