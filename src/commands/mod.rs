//! CLI command implementations
//!
//! Every command opens its programmer, wraps it in a `FlashProgrammer` and
//! runs one batch operation over the selected blocks, reporting progress per
//! block through indicatif.

mod erase;
mod list;
mod read;
mod verify;
mod write;

pub use erase::run_erase;
pub use list::{list_blocks, list_programmers};
pub use read::run_read;
pub use verify::run_verify;
pub use write::run_write;

use indicatif::{ProgressBar, ProgressStyle};
use m37flash_core::chip::{self, BlockId};
use m37flash_core::flash::{BatchReport, BlockProgress, FlashProgrammer, WriteStats};
use m37flash_core::programmer::SmbusMaster;
use m37flash_core::Error;

use crate::programmers;

/// Programmer type used by all commands
pub type Programmer = FlashProgrammer<Box<dyn SmbusMaster>>;

/// Open the programmer named on the command line
pub fn open(programmer: &str) -> Result<Programmer, Box<dyn std::error::Error>> {
    let master = programmers::open_programmer(programmer)?;
    Ok(FlashProgrammer::new(master))
}

/// Parse a `--blocks` argument, rejecting a selection with no valid block
fn select_blocks(selection: &str) -> Result<Vec<BlockId>, Box<dyn std::error::Error>> {
    let blocks = chip::parse_selection(selection);
    if blocks.is_empty() {
        return Err(format!(
            "No valid blocks in '{}' (expected any of B, A, 0, 1, 2, 3)",
            selection
        )
        .into());
    }
    Ok(blocks)
}

/// Turn a batch report with recorded failures into an error
fn check_report(report: &BatchReport, action: &str) -> Result<(), Box<dyn std::error::Error>> {
    if report.is_success() {
        return Ok(());
    }
    for (block, e) in &report.failed {
        eprintln!("  Block {}: {}", block, e);
    }
    Err(format!(
        "{} failed for {} of {} block(s)",
        action,
        report.failed.len(),
        report.failed.len() + report.completed.len()
    )
    .into())
}

/// Create a standard progress bar style
fn create_progress_bar_style() -> Result<ProgressStyle, indicatif::style::TemplateError> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} blocks {msg}")?
        .progress_chars("#>-"))
}

/// Progress reporter using an indicatif progress bar, one step per block
pub struct IndicatifProgress {
    bar: Option<ProgressBar>,
    phase: &'static str,
}

impl IndicatifProgress {
    pub fn new(phase: &'static str) -> Self {
        Self { bar: None, phase }
    }

    /// Finish the bar with a final message
    pub fn finish(&mut self, message: &str) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl BlockProgress for IndicatifProgress {
    fn started(&mut self, block: BlockId, index: usize, total: usize) {
        let pb = self.bar.get_or_insert_with(|| {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(create_progress_bar_style().unwrap_or_else(|_| ProgressStyle::default_bar()));
            pb
        });
        pb.set_position(index as u64);
        pb.set_message(format!("{} block {}", self.phase, block));
    }

    fn finished(&mut self, block: BlockId, stats: Option<&WriteStats>) {
        if let Some(pb) = &self.bar {
            if let Some(stats) = stats {
                pb.println(format!("  Block {}: {}", block, describe_stats(stats)));
            }
            pb.inc(1);
        }
    }

    fn failed(&mut self, block: BlockId, error: &Error) {
        if let Some(pb) = &self.bar {
            pb.println(format!("  Block {}: FAILED ({})", block, error));
            pb.inc(1);
        }
    }
}

/// One-line summary of a block or batch write
fn describe_stats(stats: &WriteStats) -> String {
    if !stats.flash_modified {
        return "already up to date".to_string();
    }
    format!(
        "{} bytes changed, {} erase(s), {} span(s), {} write(s) ({} bytes)",
        stats.bytes_changed,
        stats.erases_performed,
        stats.spans,
        stats.writes_performed,
        stats.bytes_written
    )
}
