//! List commands implementation

use m37flash_core::chip;

use crate::programmers;

/// List all available programmers
pub fn list_programmers() {
    let programmers = programmers::available_programmers();
    if programmers.is_empty() {
        println!("No programmers available (recompile with programmer features enabled)");
        return;
    }

    println!("Available programmers:");
    println!();
    for p in &programmers {
        let aliases = if p.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", p.aliases.join(", "))
        };
        let kind = if p.hardware { "hardware" } else { "simulation" };
        println!("  {:8} [{}] - {}{}", p.name, kind, p.description, aliases);
    }
}

/// List the flash blocks
pub fn list_blocks() {
    println!("M37512 flash blocks:");
    println!();
    println!(
        "{:<6} {:>15} {:>10} {:>15}",
        "Block", "Device address", "Size", "File offset"
    );
    println!("{}", "-".repeat(50));

    for block in &chip::BLOCKS {
        println!(
            "{:<6} {:>15} {:>10} {:>15}",
            block.id.as_char(),
            format!("0x{:04X}-0x{:04X}", block.device_address, block.last_address()),
            format_size(block.length),
            format!("0x{:05X}", block.image_offset),
        );
    }

    println!();
    println!(
        "Dump file size: {} bytes ({})",
        chip::total_size(),
        format_size(chip::total_size())
    );
}

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
