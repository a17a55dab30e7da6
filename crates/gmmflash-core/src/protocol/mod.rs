//! Protocol implementations
//!
//! This module contains the SPI25 command sequences spoken over the frame
//! channel and the write-enable handshake that guards every program and
//! erase opcode.

mod spi25;
mod write_cycle;

pub use spi25::*;
pub use write_cycle::{Busy, Enabled, Idle, WriteCycle, WriteState};
