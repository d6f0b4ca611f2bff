//! m37flash - M37512 battery controller flash programmer
//!
//! Reads, verifies and reprograms the internal flash of the Mitsubishi/Renesas
//! M37512 controller found in smart battery packs, over SMBus.
//!
//! # Architecture
//!
//! All commands go through [`FlashProgrammer`](m37flash_core::flash::FlashProgrammer),
//! which works block by block on top of any `SmbusMaster` backend:
//! - **smbus** - a Linux i2c-dev adapter talking to the real controller
//! - **sim** - a simulated controller, optionally backed by a dump file

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use m37flash_core::flash::BatchPolicy;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger, RUST_LOG still takes precedence
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(cli.verbose)))
        .init();

    match cli.command {
        Commands::Read { programmer, output } => {
            let mut programmer = commands::open(&programmer)?;
            commands::run_read(&mut programmer, &output)
        }
        Commands::Write {
            programmer,
            input,
            blocks,
        } => {
            let mut programmer = commands::open(&programmer)?;
            commands::run_write(&mut programmer, &input, &blocks.blocks, policy(blocks.keep_going))
        }
        Commands::Verify {
            programmer,
            input,
            blocks,
        } => {
            let mut programmer = commands::open(&programmer)?;
            commands::run_verify(&mut programmer, &input, &blocks.blocks, policy(blocks.keep_going))
        }
        Commands::Erase { programmer, blocks } => {
            let mut programmer = commands::open(&programmer)?;
            commands::run_erase(&mut programmer, &blocks)
        }
        Commands::ListBlocks => {
            commands::list_blocks();
            Ok(())
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    }
}

/// Default log filter for a `-v` count
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn policy(keep_going: bool) -> BatchPolicy {
    if keep_going {
        BatchPolicy::KeepGoing
    } else {
        BatchPolicy::Abort
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_sets_filter() {
        assert_eq!(log_filter(0), "info");
        assert_eq!(log_filter(1), "debug");
        assert_eq!(log_filter(2), "trace");
        assert_eq!(log_filter(5), "trace");
    }

    #[test]
    fn test_debug_filter_enables_debug_records() {
        let logger = env_logger::Builder::new()
            .parse_filters(log_filter(1))
            .build();
        assert_eq!(logger.filter(), log::LevelFilter::Debug);

        let logger = env_logger::Builder::new()
            .parse_filters(log_filter(2))
            .build();
        assert_eq!(logger.filter(), log::LevelFilter::Trace);
    }
}
