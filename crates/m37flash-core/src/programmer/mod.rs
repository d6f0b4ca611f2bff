//! Programmer traits and abstractions
//!
//! This module defines the trait that every bus backend (real SMBus adapter
//! or simulation) implements so the flash engine can talk to the controller.

mod traits;

pub use traits::*;
