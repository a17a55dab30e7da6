//! SPI types and command structures
//!
//! This module provides the SPI25 opcodes used over the bridge, the status
//! register flags and the frame encoding of a single command.

mod command;
pub mod opcodes;
mod status;

pub use command::{FlashCommand, ADDRESS_LEN, ADDRESS_SPACE};
pub use opcodes::*;
pub use status::Status;
