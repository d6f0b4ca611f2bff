//! Block identifier and block descriptor types

use core::fmt;
use core::ops::Range;
use core::str::FromStr;

use crate::error::Error;

/// Identifier of one of the six flash blocks
///
/// Blocks `A` and `B` are the 2 KiB data blocks, `0` to `3` the program
/// blocks. On the command line and in logs each block is a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockId {
    /// Data block B (0x1000)
    B,
    /// Data block A (0x1800)
    A,
    /// Program block 3 (0x4000)
    Block3,
    /// Program block 2 (0x8000)
    Block2,
    /// Program block 1 (0xC000)
    Block1,
    /// Program block 0 (0xE000)
    Block0,
}

impl BlockId {
    /// All blocks, in address map order
    pub const ALL: [BlockId; 6] = [
        BlockId::B,
        BlockId::A,
        BlockId::Block3,
        BlockId::Block2,
        BlockId::Block1,
        BlockId::Block0,
    ];

    /// Parse a block identifier (case-insensitive)
    pub fn from_char(c: char) -> Result<Self, Error> {
        match c.to_ascii_uppercase() {
            'B' => Ok(Self::B),
            'A' => Ok(Self::A),
            '3' => Ok(Self::Block3),
            '2' => Ok(Self::Block2),
            '1' => Ok(Self::Block1),
            '0' => Ok(Self::Block0),
            _ => Err(Error::UnknownBlock(c)),
        }
    }

    /// The single-character tag of this block
    pub fn as_char(self) -> char {
        match self {
            Self::B => 'B',
            Self::A => 'A',
            Self::Block3 => '3',
            Self::Block2 => '2',
            Self::Block1 => '1',
            Self::Block0 => '0',
        }
    }

    /// Position of this block in the address map
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for BlockId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            (Some(c), Some(_)) => Err(Error::UnknownBlock(c)),
            (None, _) => Err(Error::UnknownBlock(' ')),
        }
    }
}

/// A fixed flash block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBlock {
    /// Block identifier
    pub id: BlockId,
    /// First device address of the block
    pub device_address: u16,
    /// Length in bytes
    pub length: usize,
    /// Offset of the block in the flat memory image
    pub image_offset: usize,
}

impl MemoryBlock {
    /// Last device address inside the block
    ///
    /// The erase command addresses the block by this address.
    pub const fn last_address(&self) -> u16 {
        (self.device_address as usize + self.length - 1) as u16
    }

    /// Check whether a device address falls inside this block
    pub const fn contains(&self, addr: u16) -> bool {
        let addr = addr as usize;
        let start = self.device_address as usize;
        addr >= start && addr < start + self.length
    }

    /// Device address range covered by this block (as `usize`)
    pub fn device_range(&self) -> Range<usize> {
        let start = self.device_address as usize;
        start..start + self.length
    }

    /// Byte range of this block in the memory image
    pub fn image_range(&self) -> Range<usize> {
        self.image_offset..self.image_offset + self.length
    }
}
