//! Verified block read, smart block write, verify and erase

use alloc::vec::Vec;
use core::ops::AddAssign;

use super::operations::{first_difference, write_spans, DiffScan, ERASED_VALUE};
use super::transport::BlockTransport;
use crate::chip::{self, BlockId, MemoryBlock};
use crate::error::{Error, Result, VerifyFailure};
use crate::programmer::SmbusMaster;
use crate::protocol::WRITE_CHUNK;

/// What a block write has to do, decided by the diff scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePlan {
    /// Flash already holds the target data
    Idle,
    /// Every changed byte is erased and can be programmed in place
    WriteOnly,
    /// The block must be erased before programming
    EraseThenWrite,
}

impl From<DiffScan> for WritePlan {
    fn from(scan: DiffScan) -> Self {
        match (scan.write_needed, scan.erase_needed) {
            (false, _) => Self::Idle,
            (true, false) => Self::WriteOnly,
            (true, true) => Self::EraseThenWrite,
        }
    }
}

/// Statistics from a smart write operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Number of bytes that were different from the flash contents
    pub bytes_changed: usize,
    /// Number of erase operations performed
    pub erases_performed: usize,
    /// Number of write spans programmed
    pub spans: usize,
    /// Number of write transactions performed
    pub writes_performed: usize,
    /// Total bytes written
    pub bytes_written: usize,
    /// Whether any flash operations were performed
    pub flash_modified: bool,
}

impl AddAssign<&WriteStats> for WriteStats {
    fn add_assign(&mut self, other: &WriteStats) {
        self.bytes_changed += other.bytes_changed;
        self.erases_performed += other.erases_performed;
        self.spans += other.spans;
        self.writes_performed += other.writes_performed;
        self.bytes_written += other.bytes_written;
        self.flash_modified |= other.flash_modified;
    }
}

/// Flash programmer for the M37512
///
/// Owns the bus backend for its whole lifetime, so no other caller can
/// interleave transactions with a read in progress. Every operation works on
/// one block and keeps no state between calls.
pub struct FlashProgrammer<M> {
    transport: BlockTransport<M>,
}

impl<M: SmbusMaster> FlashProgrammer<M> {
    /// Create a programmer on top of a bus backend
    pub fn new(master: M) -> Self {
        Self {
            transport: BlockTransport::new(master),
        }
    }

    /// Get a reference to the bus backend
    pub fn master(&self) -> &M {
        self.transport.master()
    }

    /// Get a mutable reference to the bus backend
    pub fn master_mut(&mut self) -> &mut M {
        self.transport.master_mut()
    }

    /// Release the bus backend
    pub fn into_inner(self) -> M {
        self.transport.into_inner()
    }

    /// Read a block twice and return the data if both reads agree
    pub fn read_block(&mut self, id: BlockId) -> Result<Vec<u8>> {
        let block = chip::lookup(id);
        let first = self.transport.read_block(block)?;
        let second = self.transport.read_block(block)?;

        if let Some((offset, a, b)) = first_difference(&first, &second) {
            log::error!(
                "Block {}: reads differ at offset 0x{:04X} (0x{:02X} vs 0x{:02X})",
                id,
                offset,
                a,
                b
            );
            return Err(Error::VerifyError {
                block: id,
                failure: VerifyFailure::UnstableRead { offset },
            });
        }

        log::debug!("Block {}: read {} bytes", id, first.len());
        Ok(first)
    }

    /// Bring a block to exactly `data`, touching as little flash as possible
    ///
    /// The current contents are read once and compared with `data`. If a
    /// changed byte is not erased, the whole block is erased first. Only the
    /// spans that differ are then programmed, 16 bytes per transaction, and
    /// the block is read back and compared. A block that already holds
    /// `data` causes no erase or write at all.
    ///
    /// A failure part way through leaves the block in whatever state the
    /// last transaction produced.
    pub fn write_block(&mut self, id: BlockId, data: &[u8]) -> Result<WriteStats> {
        let block = chip::lookup(id);
        check_length(block, data)?;

        let mut existing = self.transport.read_block(block)?;
        let scan = DiffScan::scan(&existing, data);
        let plan = WritePlan::from(scan);
        log::debug!("Block {}: {:?}", id, plan);

        let mut stats = WriteStats::default();
        if plan == WritePlan::Idle {
            log::info!("Block {}: already up to date", id);
            return Ok(stats);
        }

        stats.bytes_changed = existing
            .iter()
            .zip(data.iter())
            .filter(|(h, w)| h != w)
            .count();

        if plan == WritePlan::EraseThenWrite {
            self.transport.erase(block)?;
            existing.fill(ERASED_VALUE);
            stats.erases_performed = 1;
            stats.flash_modified = true;
        }

        let spans = write_spans(&existing, data);
        log::debug!("Block {}: {} span(s) to write", id, spans.len());
        for span in &spans {
            log::trace!(
                "Block {}: span 0x{:04X}..0x{:04X}",
                id,
                span.start,
                span.end()
            );
            for (offset, len) in span.chunks(WRITE_CHUNK) {
                let addr = block.device_address + offset as u16;
                self.transport
                    .write_span(addr, &data[offset..offset + len])?;
                stats.writes_performed += 1;
                stats.bytes_written += len;
            }
        }
        stats.spans = spans.len();
        stats.flash_modified |= stats.writes_performed > 0;

        let readback = self.transport.read_block(block)?;
        compare(id, data, &readback)?;

        log::info!(
            "Block {}: {} bytes changed, {} erase(s), {} write(s)",
            id,
            stats.bytes_changed,
            stats.erases_performed,
            stats.writes_performed
        );
        Ok(stats)
    }

    /// Check that a block holds exactly `data`
    pub fn verify_block(&mut self, id: BlockId, data: &[u8]) -> Result<()> {
        check_length(chip::lookup(id), data)?;
        let actual = self.read_block(id)?;
        compare(id, data, &actual)?;
        log::debug!("Block {}: verified", id);
        Ok(())
    }

    /// Erase a block unconditionally
    pub fn erase_block(&mut self, id: BlockId) -> Result<()> {
        self.transport.erase(chip::lookup(id))?;
        log::info!("Block {}: erased", id);
        Ok(())
    }
}

fn check_length(block: &MemoryBlock, data: &[u8]) -> Result<()> {
    if data.len() != block.length {
        return Err(Error::LengthMismatch {
            expected: block.length,
            actual: data.len(),
        });
    }
    Ok(())
}

fn compare(id: BlockId, expected: &[u8], actual: &[u8]) -> Result<()> {
    match first_difference(expected, actual) {
        None => Ok(()),
        Some((offset, expected, found)) => {
            log::error!(
                "Block {}: mismatch at offset 0x{:04X}: expected 0x{:02X}, found 0x{:02X}",
                id,
                offset,
                expected,
                found
            );
            Err(Error::VerifyError {
                block: id,
                failure: VerifyFailure::Mismatch {
                    offset,
                    expected,
                    found,
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::BLOCKS;
    use crate::flash::mock::{MockBus, Op};
    use alloc::vec;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_read_block_lengths() {
        let mut programmer = FlashProgrammer::new(MockBus::new());
        for block in &BLOCKS {
            let data = programmer.read_block(block.id).unwrap();
            assert_eq!(data.len(), block.length);
        }
    }

    #[test]
    fn test_read_block_reads_twice() {
        let mut programmer = FlashProgrammer::new(MockBus::new());
        programmer.read_block(BlockId::A).unwrap();
        let reads = programmer
            .master()
            .log
            .iter()
            .filter(|op| **op == Op::Read16)
            .count();
        assert_eq!(reads, 2 * 0x800 / 16);
    }

    #[test]
    fn test_read_pairs_address_with_read() {
        let mut programmer = FlashProgrammer::new(MockBus::new());
        programmer.read_block(BlockId::B).unwrap();
        let log = &programmer.master().log;
        for pair in log.chunks(2) {
            assert!(matches!(pair[0], Op::SetReadAddress(_)));
            assert_eq!(pair[1], Op::Read16);
        }
        assert_eq!(log[0], Op::SetReadAddress(0x1000));
        assert_eq!(log[2], Op::SetReadAddress(0x1010));
    }

    #[test]
    fn test_unstable_read() {
        let mut bus = MockBus::new();
        // First Read16 of the second pass over block B
        bus.corrupt_read = Some(0x800 / 16);
        let mut programmer = FlashProgrammer::new(bus);
        let err = programmer.read_block(BlockId::B).unwrap_err();
        assert_eq!(
            err,
            Error::VerifyError {
                block: BlockId::B,
                failure: VerifyFailure::UnstableRead { offset: 0 },
            }
        );
        assert!(programmer.master().mutations().is_empty());
    }

    #[test]
    fn test_round_trip_all_blocks() {
        let mut programmer = FlashProgrammer::new(MockBus::new());
        for block in &BLOCKS {
            let data = pattern(block.length);
            programmer.write_block(block.id, &data).unwrap();
            assert_eq!(programmer.read_block(block.id).unwrap(), data);
        }
    }

    #[test]
    fn test_write_is_idempotent() {
        let mut programmer = FlashProgrammer::new(MockBus::new());
        let data = pattern(0x2000);
        programmer.write_block(BlockId::Block1, &data).unwrap();

        programmer.master_mut().clear_log();
        let stats = programmer.write_block(BlockId::Block1, &data).unwrap();
        assert_eq!(stats, WriteStats::default());
        assert_eq!(programmer.master().erases(), 0);
        assert_eq!(programmer.master().writes(), 0);
        // Only the initial read, no verify pass
        assert_eq!(programmer.master().log.len(), 2 * 0x2000 / 16);
    }

    #[test]
    fn test_erase_precedes_writes() {
        let mut image = vec![0xFF; chip::MEMORY_SIZE];
        image[chip::lookup(BlockId::A).image_range()].fill(0x00);
        let mut programmer = FlashProgrammer::new(MockBus::with_image(image));

        let data = vec![0x5A; 0x800];
        let stats = programmer.write_block(BlockId::A, &data).unwrap();
        assert_eq!(stats.erases_performed, 1);

        let mutations = programmer.master().mutations();
        assert_eq!(*mutations[0], Op::Erase(0x1FFF));
        assert_eq!(programmer.master().erases(), 1);
        assert!(mutations[1..].iter().all(|op| matches!(op, Op::Write(..))));
        assert_eq!(mutations.len() - 1, 0x800 / 16);
    }

    #[test]
    fn test_write_minimization() {
        let mut programmer = FlashProgrammer::new(MockBus::new());
        let mut data = vec![0xFF; 0x4000];
        data[0x123..0x123 + 40].fill(0x11);

        let stats = programmer.write_block(BlockId::Block2, &data).unwrap();
        assert_eq!(programmer.master().erases(), 0);
        assert_eq!(programmer.master().writes(), 3);
        assert_eq!(stats.writes_performed, 3);
        assert_eq!(stats.bytes_written, 40);

        let writes: Vec<_> = programmer
            .master()
            .mutations()
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(
            writes,
            [
                Op::Write(0x8123, vec![0x11; 16]),
                Op::Write(0x8133, vec![0x11; 16]),
                Op::Write(0x8143, vec![0x11; 8]),
            ]
        );
    }

    #[test]
    fn test_programs_erased_bytes_around_gap() {
        // Device holds 0x00 at [100, 110) and is erased elsewhere; target is
        // all zeros. Nothing needs erasing, the gap splits the write in two.
        let mut image = vec![0xFF; chip::MEMORY_SIZE];
        image[100..110].fill(0x00);
        let mut programmer = FlashProgrammer::new(MockBus::with_image(image));

        let data = vec![0x00; 0x800];
        let stats = programmer.write_block(BlockId::B, &data).unwrap();
        assert_eq!(stats.erases_performed, 0);
        assert_eq!(stats.spans, 2);
        assert_eq!(stats.writes_performed, 100usize.div_ceil(16) + 1938usize.div_ceil(16));
        assert_eq!(stats.bytes_written, 0x800 - 10);
        assert_eq!(programmer.read_block(BlockId::B).unwrap(), data);
    }

    #[test]
    fn test_erase_merges_spans() {
        // One non-erased byte forces an erase; afterwards the whole block
        // differs from 0xFF and is written as a single span.
        let mut image = vec![0xFF; chip::MEMORY_SIZE];
        image[100..110].fill(0x55);
        let mut programmer = FlashProgrammer::new(MockBus::with_image(image));

        let data = vec![0x00; 0x800];
        let stats = programmer.write_block(BlockId::B, &data).unwrap();
        assert_eq!(stats.erases_performed, 1);
        assert_eq!(stats.spans, 1);
        assert_eq!(stats.writes_performed, 0x800 / 16);
        assert_eq!(stats.bytes_changed, 0x800);
    }

    #[test]
    fn test_write_length_mismatch_touches_nothing() {
        let mut programmer = FlashProgrammer::new(MockBus::new());
        let err = programmer.write_block(BlockId::B, &[0u8; 10]).unwrap_err();
        assert_eq!(
            err,
            Error::LengthMismatch {
                expected: 0x800,
                actual: 10
            }
        );
        assert!(programmer.master().log.is_empty());
    }

    #[test]
    fn test_write_readback_mismatch() {
        let mut bus = MockBus::new();
        let a = chip::lookup(BlockId::A);
        bus.stuck = Some((a.image_offset + 0x20, 0xFF));
        let mut programmer = FlashProgrammer::new(bus);

        let data = vec![0x00; a.length];
        let err = programmer.write_block(BlockId::A, &data).unwrap_err();
        assert_eq!(err.block(), Some(BlockId::A));
        assert_eq!(
            err,
            Error::VerifyError {
                block: BlockId::A,
                failure: VerifyFailure::Mismatch {
                    offset: 0x20,
                    expected: 0x00,
                    found: 0xFF,
                },
            }
        );
    }

    #[test]
    fn test_transport_error_propagates() {
        let mut bus = MockBus::new();
        bus.fail_after = Some(3);
        let mut programmer = FlashProgrammer::new(bus);
        assert_eq!(
            programmer.read_block(BlockId::B),
            Err(Error::TransportError)
        );
    }

    #[test]
    fn test_verify_block() {
        let mut programmer = FlashProgrammer::new(MockBus::new());
        let mut data = vec![0xFF; 0x800];
        programmer.verify_block(BlockId::B, &data).unwrap();

        data[0x7FF] = 0x00;
        let err = programmer.verify_block(BlockId::B, &data).unwrap_err();
        assert!(err.is_verify_error());
        assert!(programmer.master().mutations().is_empty());

        assert!(matches!(
            programmer.verify_block(BlockId::B, &data[..16]),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_erase_block() {
        let mut image = vec![0x00; chip::MEMORY_SIZE];
        image[..16].fill(0x12);
        let mut programmer = FlashProgrammer::new(MockBus::with_image(image));
        programmer.erase_block(BlockId::Block0).unwrap();
        assert_eq!(programmer.master().log, [Op::Erase(0xFFFF)]);
        assert!(programmer
            .read_block(BlockId::Block0)
            .unwrap()
            .iter()
            .all(|&b| b == 0xFF));
        // Neighbouring block untouched
        assert!(programmer
            .read_block(BlockId::Block1)
            .unwrap()
            .iter()
            .all(|&b| b == 0x00));
    }

    #[test]
    fn test_plan_from_scan() {
        assert_eq!(WritePlan::from(DiffScan::default()), WritePlan::Idle);
        assert_eq!(
            WritePlan::from(DiffScan {
                write_needed: true,
                erase_needed: false
            }),
            WritePlan::WriteOnly
        );
        assert_eq!(
            WritePlan::from(DiffScan {
                write_needed: true,
                erase_needed: true
            }),
            WritePlan::EraseThenWrite
        );
    }
}
