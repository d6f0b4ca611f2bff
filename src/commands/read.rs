//! Read command implementation

use m37flash_core::chip;
use m37flash_core::flash::FlashProgrammer;
use m37flash_core::programmer::SmbusMaster;
use std::path::Path;

use super::IndicatifProgress;

/// Run the read command
pub fn run_read<M: SmbusMaster>(
    programmer: &mut FlashProgrammer<M>,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Reading {} blocks ({} bytes), every block is read twice",
        chip::BLOCKS.len(),
        chip::total_size()
    );

    let mut progress = IndicatifProgress::new("Reading");
    let image = programmer.read_all(&mut progress)?;
    progress.finish("Read complete");

    image.save(output)?;
    println!("Wrote {} bytes to {:?}", image.as_bytes().len(), output);

    Ok(())
}

#[cfg(all(test, feature = "sim"))]
mod tests {
    use super::*;
    use m37flash_core::chip::BlockId;
    use m37flash_core::image::MemoryImage;
    use m37flash_sim::SimDevice;

    #[test]
    fn test_read_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dump.bin");

        let mut data = vec![0xFF; chip::MEMORY_SIZE];
        data[chip::lookup(BlockId::Block1).image_offset] = 0x12;
        let mut programmer = FlashProgrammer::new(SimDevice::with_data(data.clone()).unwrap());

        run_read(&mut programmer, &output).unwrap();
        let image = MemoryImage::open_for_read(&output).unwrap();
        assert_eq!(image.as_bytes(), &data[..]);
    }
}
