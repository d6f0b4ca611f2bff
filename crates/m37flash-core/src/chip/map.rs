//! The static address map

use alloc::vec::Vec;

use super::types::{BlockId, MemoryBlock};
use crate::error::{Error, Result};

const fn block(id: BlockId, device_address: u16, length: usize, image_offset: usize) -> MemoryBlock {
    MemoryBlock {
        id,
        device_address,
        length,
        image_offset,
    }
}

const BLOCK_TABLE: [MemoryBlock; 6] = [
    block(BlockId::B, 0x1000, 0x0800, 0x0000),
    block(BlockId::A, 0x1800, 0x0800, 0x0800),
    block(BlockId::Block3, 0x4000, 0x4000, 0x1000),
    block(BlockId::Block2, 0x8000, 0x4000, 0x5000),
    block(BlockId::Block1, 0xC000, 0x2000, 0x9000),
    block(BlockId::Block0, 0xE000, 0x2000, 0xB000),
];

const fn table_size(table: &[MemoryBlock]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < table.len() {
        total += table[i].length;
        i += 1;
    }
    total
}

/// The six flash blocks, in address map order
pub static BLOCKS: [MemoryBlock; 6] = BLOCK_TABLE;

/// Total size of the memory image (sum of all block lengths)
pub const MEMORY_SIZE: usize = table_size(&BLOCK_TABLE);

/// Order in which batch operations visit the blocks by default
pub const DEFAULT_ORDER: &str = "AB0123";

/// Look up the descriptor of a block
pub fn lookup(id: BlockId) -> &'static MemoryBlock {
    &BLOCKS[id.index()]
}

/// Look up a block by its single-character tag
pub fn lookup_char(c: char) -> Result<&'static MemoryBlock> {
    BlockId::from_char(c).map(lookup)
}

/// Find the block owning a device address
///
/// Returns the block identifier and the image offset that corresponds to
/// `addr`.
pub fn locate(addr: u16) -> Result<(BlockId, usize)> {
    BLOCKS
        .iter()
        .find(|b| b.contains(addr))
        .map(|b| (b.id, b.image_offset + (addr - b.device_address) as usize))
        .ok_or(Error::AddressOutOfRange(addr))
}

/// Total size of the memory image in bytes
pub fn total_size() -> usize {
    MEMORY_SIZE
}

/// Parse a block selection such as `"AB0123"`
///
/// Unknown identifiers are skipped with a warning. A block listed more than
/// once is only selected the first time.
pub fn parse_selection(selection: &str) -> Vec<BlockId> {
    let mut blocks = Vec::new();
    for c in selection.chars().filter(|c| !c.is_whitespace() && *c != ',') {
        match BlockId::from_char(c) {
            Ok(id) if !blocks.contains(&id) => blocks.push(id),
            Ok(id) => log::debug!("Block {} selected twice, ignoring repeat", id),
            Err(_) => log::warn!("Skipping unknown block '{}'", c),
        }
    }
    blocks
}
