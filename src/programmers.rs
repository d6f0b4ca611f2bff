//! Programmer registration and dispatch
//!
//! This module provides a centralized registry for all bus backends, with
//! support for feature-gated inclusion and dynamic help text generation.

use m37flash_core::programmer::{ProgrammerInfo, SmbusMaster};

/// Errors from selecting or opening a programmer
#[derive(Debug, thiserror::Error)]
pub enum ProgrammerError {
    /// Name matches no compiled-in programmer
    #[error("Unknown programmer: {name}\n\n{help}\nUse 'm37flash list-programmers' for more details")]
    Unknown { name: String, help: String },

    /// Malformed programmer string
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    InvalidParameter(String),

    #[cfg(feature = "sim")]
    #[error(transparent)]
    Sim(#[from] m37flash_sim::SimError),

    #[cfg(feature = "smbus")]
    #[error("{0}\nMake sure i2c-dev is loaded and you have access to the device.")]
    Smbus(#[from] m37flash_smbus::SmbusError),
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "smbus")]
    programmers.push(ProgrammerInfo {
        name: "smbus",
        aliases: &["i2c", "linux_smbus"],
        description: "Linux i2c-dev SMBus adapter (bus=<N>,dev=/dev/i2c-N,addr=<0xNN>)",
        hardware: true,
    });

    #[cfg(feature = "sim")]
    programmers.push(ProgrammerInfo {
        name: "sim",
        aliases: &["dummy"],
        description: "Simulated controller, optionally backed by a dump file (file=<path>)",
        hardware: false,
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:8} - {}\n", p.name, p.description));
    }
    help
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Find the registry entry for a name or alias
pub fn find_programmer(name: &str) -> Option<ProgrammerInfo> {
    available_programmers().into_iter().find(|p| p.matches(name))
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> Result<(&str, Vec<(&str, &str)>), ProgrammerError> {
    let (name, opts) = s.split_once(':').unwrap_or((s, ""));

    let mut options = Vec::new();
    for opt in opts.split(',').filter(|o| !o.is_empty()) {
        match opt.split_once('=') {
            Some(pair) => options.push(pair),
            None => return Err(ProgrammerError::InvalidParameter(opt.to_string())),
        }
    }

    Ok((name, options))
}

/// Open the bus backend named by a programmer string
#[allow(unused_variables)]
pub fn open_programmer(programmer: &str) -> Result<Box<dyn SmbusMaster>, ProgrammerError> {
    let (name, options) = parse_programmer_string(programmer)?;

    let info = find_programmer(name).ok_or_else(|| ProgrammerError::Unknown {
        name: name.to_string(),
        help: programmer_help(),
    })?;

    log::debug!("Opening programmer {} with {} option(s)", info.name, options.len());

    match info.name {
        #[cfg(feature = "smbus")]
        "smbus" => Ok(Box::new(m37flash_smbus::open_smbus(&options)?)),

        #[cfg(feature = "sim")]
        "sim" => Ok(Box::new(m37flash_sim::open_sim(&options)?)),

        _ => Err(ProgrammerError::Unknown {
            name: name.to_string(),
            help: programmer_help(),
        }),
    }
}
