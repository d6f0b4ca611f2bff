//! Verify command implementation

use m37flash_core::flash::{BatchPolicy, FlashProgrammer};
use m37flash_core::image::MemoryImage;
use m37flash_core::programmer::SmbusMaster;
use std::path::Path;

use super::{check_report, select_blocks, IndicatifProgress};

/// Run the verify command
pub fn run_verify<M: SmbusMaster>(
    programmer: &mut FlashProgrammer<M>,
    input: &Path,
    selection: &str,
    policy: BatchPolicy,
) -> Result<(), Box<dyn std::error::Error>> {
    let blocks = select_blocks(selection)?;
    let image = MemoryImage::open_for_read(input)?;
    println!("Read {} bytes from {:?}", image.as_bytes().len(), input);

    let mut progress = IndicatifProgress::new("Verifying");
    let report = programmer.verify_blocks(&image, &blocks, policy, &mut progress)?;
    progress.finish("Verify complete");

    check_report(&report, "Verification")?;
    println!("Verification passed!");

    Ok(())
}
