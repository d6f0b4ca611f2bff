//! Erase command implementation

use m37flash_core::flash::{BatchPolicy, FlashProgrammer, NoProgress};
use m37flash_core::image::MemoryImage;
use m37flash_core::programmer::SmbusMaster;

use super::{select_blocks, IndicatifProgress};

/// Run the erase command
///
/// The erased blocks are read back and checked for 0xFF afterwards.
pub fn run_erase<M: SmbusMaster>(
    programmer: &mut FlashProgrammer<M>,
    selection: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let blocks = select_blocks(selection)?;
    let names: String = blocks.iter().map(|b| b.as_char()).collect();
    println!("Erasing block(s) {}", names);

    let mut progress = IndicatifProgress::new("Erasing");
    programmer.erase_blocks(&blocks, &mut progress)?;
    progress.finish("Erase complete");

    let blank = MemoryImage::open_for_write();
    programmer.verify_blocks(&blank, &blocks, BatchPolicy::Abort, &mut NoProgress)?;

    println!("Erase complete! Block(s) {} are blank", names);
    Ok(())
}
