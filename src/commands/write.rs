//! Write command implementation

use m37flash_core::flash::{BatchPolicy, FlashProgrammer};
use m37flash_core::image::MemoryImage;
use m37flash_core::programmer::SmbusMaster;
use std::path::Path;

use super::{check_report, describe_stats, select_blocks, IndicatifProgress};

/// Run the write command
pub fn run_write<M: SmbusMaster>(
    programmer: &mut FlashProgrammer<M>,
    input: &Path,
    selection: &str,
    policy: BatchPolicy,
) -> Result<(), Box<dyn std::error::Error>> {
    let blocks = select_blocks(selection)?;
    let image = MemoryImage::open_for_read(input)?;
    println!("Read {} bytes from {:?}", image.as_bytes().len(), input);

    let mut progress = IndicatifProgress::new("Writing");
    let report = programmer.write_blocks(&image, &blocks, policy, &mut progress)?;
    progress.finish("Write complete");

    if report.stats.flash_modified {
        println!("Smart write: {}", describe_stats(&report.stats));
    } else {
        println!("Flash already contains the desired data - no changes needed");
    }

    check_report(&report, "Write")?;
    println!("Write complete! ({} block(s) verified)", report.completed.len());

    Ok(())
}
