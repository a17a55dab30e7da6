//! Device identification and geometry
//!
//! This module decodes the JEDEC identifier, holds the table of supported
//! parts and derives the erase/program geometry of the identified chip.

mod table;
mod types;

#[cfg(feature = "std")]
mod database;

pub use table::*;
pub use types::*;

#[cfg(feature = "std")]
pub use database::*;
