//! CLI argument parsing

use crate::programmers;
use clap::{Parser, Subcommand};
use m37flash_core::chip::DEFAULT_ORDER;
use std::path::PathBuf;

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "m37flash")]
#[command(author, version, about = "M37512 battery controller flash programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Block selection shared by write and verify
#[derive(clap::Args, Debug, Clone)]
pub struct BlockArgs {
    /// Blocks to process, in order (any of B, A, 0, 1, 2, 3)
    #[arg(short, long, default_value = DEFAULT_ORDER)]
    pub blocks: String,

    /// Continue with the remaining blocks when a block fails verification
    #[arg(long)]
    pub keep_going: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the whole flash (every block read twice) to a dump file
    Read {
        /// Programmer to use
        #[arg(short, long, default_value = "smbus", help = programmer_help())]
        programmer: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write blocks from a dump file, erasing only where needed
    Write {
        /// Programmer to use
        #[arg(short, long, default_value = "smbus", help = programmer_help())]
        programmer: String,

        /// Input dump file (exactly 53248 bytes)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        blocks: BlockArgs,
    },

    /// Compare blocks of flash against a dump file
    Verify {
        /// Programmer to use
        #[arg(short, long, default_value = "smbus", help = programmer_help())]
        programmer: String,

        /// Input dump file (exactly 53248 bytes)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        blocks: BlockArgs,
    },

    /// Erase blocks
    Erase {
        /// Programmer to use
        #[arg(short, long, default_value = "smbus", help = programmer_help())]
        programmer: String,

        /// Blocks to erase (any of B, A, 0, 1, 2, 3)
        #[arg(short, long)]
        blocks: String,
    },

    /// List the flash blocks and their location in the dump file
    ListBlocks,

    /// List available programmers
    ListProgrammers,
}
