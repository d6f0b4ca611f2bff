//! Batch operations over several blocks
//!
//! Blocks are processed strictly one after another on the single bus
//! connection. A verification failure can either stop the batch or be
//! recorded while the remaining blocks are processed, see [`BatchPolicy`].
//! Any other error always stops the batch.

use alloc::vec::Vec;

use super::programmer::{FlashProgrammer, WriteStats};
use crate::chip::{self, BlockId};
use crate::error::{Error, Result};
use crate::image::MemoryImage;
use crate::programmer::SmbusMaster;

/// What to do when a block fails verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Stop at the first failing block
    #[default]
    Abort,
    /// Record the failure and continue with the next block
    KeepGoing,
}

/// Progress callback for batch operations
///
/// All methods have empty default implementations.
pub trait BlockProgress {
    /// Called before a block is processed
    fn started(&mut self, _block: BlockId, _index: usize, _total: usize) {}

    /// Called after a block was processed successfully
    fn finished(&mut self, _block: BlockId, _stats: Option<&WriteStats>) {}

    /// Called when a block fails
    fn failed(&mut self, _block: BlockId, _error: &Error) {}
}

/// Progress reporter that ignores all events
pub struct NoProgress;

impl BlockProgress for NoProgress {}

/// Outcome of a batch operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Blocks that completed successfully, in processing order
    pub completed: Vec<BlockId>,
    /// Blocks that failed verification (only with [`BatchPolicy::KeepGoing`])
    pub failed: Vec<(BlockId, Error)>,
    /// Write statistics summed over all written blocks
    pub stats: WriteStats,
}

impl BatchReport {
    /// True if no block failed
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<M: SmbusMaster> FlashProgrammer<M> {
    /// Read every block (verified) into a fresh image
    ///
    /// Blocks are visited in [`DEFAULT_ORDER`](chip::DEFAULT_ORDER).
    pub fn read_all(&mut self, progress: &mut dyn BlockProgress) -> Result<MemoryImage> {
        let mut image = MemoryImage::open_for_write();
        let blocks = chip::parse_selection(chip::DEFAULT_ORDER);
        for (index, &id) in blocks.iter().enumerate() {
            progress.started(id, index, blocks.len());
            let data = self.read_block(id).inspect_err(|e| progress.failed(id, e))?;
            image.put_block(id, &data)?;
            progress.finished(id, None);
        }
        Ok(image)
    }

    /// Write the selected blocks of `image` to flash
    pub fn write_blocks(
        &mut self,
        image: &MemoryImage,
        blocks: &[BlockId],
        policy: BatchPolicy,
        progress: &mut dyn BlockProgress,
    ) -> Result<BatchReport> {
        self.run_batch(blocks, policy, progress, |programmer, id| {
            programmer
                .write_block(id, image.get_block(id))
                .map(Some)
        })
    }

    /// Verify the selected blocks of flash against `image`
    pub fn verify_blocks(
        &mut self,
        image: &MemoryImage,
        blocks: &[BlockId],
        policy: BatchPolicy,
        progress: &mut dyn BlockProgress,
    ) -> Result<BatchReport> {
        self.run_batch(blocks, policy, progress, |programmer, id| {
            programmer.verify_block(id, image.get_block(id)).map(|()| None)
        })
    }

    /// Erase the selected blocks
    pub fn erase_blocks(
        &mut self,
        blocks: &[BlockId],
        progress: &mut dyn BlockProgress,
    ) -> Result<BatchReport> {
        self.run_batch(blocks, BatchPolicy::Abort, progress, |programmer, id| {
            programmer.erase_block(id).map(|()| None)
        })
    }

    fn run_batch<F>(
        &mut self,
        blocks: &[BlockId],
        policy: BatchPolicy,
        progress: &mut dyn BlockProgress,
        mut op: F,
    ) -> Result<BatchReport>
    where
        F: FnMut(&mut Self, BlockId) -> Result<Option<WriteStats>>,
    {
        let mut report = BatchReport::default();

        for (index, &id) in blocks.iter().enumerate() {
            progress.started(id, index, blocks.len());
            match op(self, id) {
                Ok(stats) => {
                    if let Some(stats) = &stats {
                        report.stats += stats;
                    }
                    progress.finished(id, stats.as_ref());
                    report.completed.push(id);
                }
                Err(e) => {
                    progress.failed(id, &e);
                    if e.is_verify_error() && policy == BatchPolicy::KeepGoing {
                        log::warn!("Block {} failed ({}), continuing", id, e);
                        report.failed.push((id, e));
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::MEMORY_SIZE;
    use crate::error::VerifyFailure;
    use crate::flash::mock::MockBus;
    use alloc::vec;

    #[derive(Default)]
    struct Recorder {
        started: Vec<BlockId>,
        finished: Vec<BlockId>,
        failed: Vec<BlockId>,
    }

    impl BlockProgress for Recorder {
        fn started(&mut self, block: BlockId, _index: usize, _total: usize) {
            self.started.push(block);
        }

        fn finished(&mut self, block: BlockId, _stats: Option<&WriteStats>) {
            self.finished.push(block);
        }

        fn failed(&mut self, block: BlockId, _error: &Error) {
            self.failed.push(block);
        }
    }

    fn sample_image() -> MemoryImage {
        let data = (0..MEMORY_SIZE).map(|i| (i % 251) as u8).collect();
        MemoryImage::from_bytes(data).unwrap()
    }

    #[test]
    fn test_read_all_order_and_content() {
        let image = sample_image();
        let mut programmer =
            FlashProgrammer::new(MockBus::with_image(image.as_bytes().to_vec()));
        let mut progress = Recorder::default();

        let read = programmer.read_all(&mut progress).unwrap();
        assert_eq!(read, image);
        assert_eq!(progress.started, chip::parse_selection("AB0123"));
        assert_eq!(progress.finished.len(), 6);
    }

    #[test]
    fn test_write_selected_blocks() {
        let image = sample_image();
        let mut programmer = FlashProgrammer::new(MockBus::new());
        let blocks = chip::parse_selection("A1");

        let report = programmer
            .write_blocks(&image, &blocks, BatchPolicy::Abort, &mut NoProgress)
            .unwrap();
        assert!(report.is_success());
        assert_eq!(report.completed, blocks);
        assert_eq!(report.stats.erases_performed, 0);

        let device = &programmer.master().image;
        for id in BlockId::ALL {
            let range = chip::lookup(id).image_range();
            if blocks.contains(&id) {
                assert_eq!(&device[range.clone()], image.get_block(id));
            } else {
                assert!(device[range].iter().all(|&b| b == 0xFF));
            }
        }
    }

    #[test]
    fn test_verify_keep_going_reports_failures() {
        let image = MemoryImage::open_for_write();
        let mut device = vec![0xFF; MEMORY_SIZE];
        device[chip::lookup(BlockId::A).image_offset + 5] = 0x00;
        device[chip::lookup(BlockId::Block2).image_offset] = 0x00;
        let mut programmer = FlashProgrammer::new(MockBus::with_image(device));
        let mut progress = Recorder::default();

        let report = programmer
            .verify_blocks(
                &image,
                &BlockId::ALL,
                BatchPolicy::KeepGoing,
                &mut progress,
            )
            .unwrap();
        assert!(!report.is_success());
        assert_eq!(progress.failed, [BlockId::A, BlockId::Block2]);
        assert_eq!(report.completed.len(), 4);
        assert_eq!(
            report.failed[0],
            (
                BlockId::A,
                Error::VerifyError {
                    block: BlockId::A,
                    failure: VerifyFailure::Mismatch {
                        offset: 5,
                        expected: 0xFF,
                        found: 0x00
                    }
                }
            )
        );
    }

    #[test]
    fn test_verify_abort_stops_at_first_failure() {
        let image = MemoryImage::open_for_write();
        let mut device = vec![0xFF; MEMORY_SIZE];
        device[chip::lookup(BlockId::A).image_offset] = 0x00;
        let mut programmer = FlashProgrammer::new(MockBus::with_image(device));
        let mut progress = Recorder::default();

        let err = programmer
            .verify_blocks(
                &image,
                &chip::parse_selection("AB"),
                BatchPolicy::Abort,
                &mut progress,
            )
            .unwrap_err();
        assert_eq!(err.block(), Some(BlockId::A));
        assert_eq!(progress.started, [BlockId::A]);
    }

    #[test]
    fn test_transport_error_aborts_even_when_keep_going() {
        let image = MemoryImage::open_for_write();
        let mut bus = MockBus::new();
        bus.fail_after = Some(0);
        let mut programmer = FlashProgrammer::new(bus);

        let err = programmer
            .verify_blocks(&image, &BlockId::ALL, BatchPolicy::KeepGoing, &mut NoProgress)
            .unwrap_err();
        assert_eq!(err, Error::TransportError);
    }

    #[test]
    fn test_erase_blocks() {
        let mut programmer =
            FlashProgrammer::new(MockBus::with_image(vec![0x00; MEMORY_SIZE]));
        let report = programmer
            .erase_blocks(&chip::parse_selection("B0"), &mut NoProgress)
            .unwrap();
        assert_eq!(report.completed, [BlockId::B, BlockId::Block0]);
        assert_eq!(programmer.master().erases(), 2);
    }
}
