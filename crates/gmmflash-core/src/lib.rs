//! gmmflash-core - Core library for SPI NOR flash access over a frame bridge
//!
//! This crate implements everything between a user's address selection and
//! the bytes sent over a USB-serial SPI bridge: the frame channel
//! abstraction, the SPI25 command set, device geometry lookup, address-unit
//! resolution and the chunked read/program/erase scheduler. It is `no_std`
//! compatible; the `std` feature adds the RON device database loader.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation
//!
//! # Example
//!
//! ```ignore
//! use gmmflash_core::chip::BUILTIN_DEVICES;
//! use gmmflash_core::flash::{NoProgress, Session, SessionOptions};
//!
//! let mut session = Session::open(channel, BUILTIN_DEVICES, SessionOptions::default())?;
//! println!("JEDEC ID: {}", session.device().id.jedec);
//!
//! let mut buf = [0u8; 256];
//! session.read(0, &mut buf, &mut NoProgress)?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod address;
pub mod channel;
pub mod chip;
pub mod error;
pub mod flash;
pub mod protocol;
pub mod spi;

#[cfg(test)]
mod testing;

pub use error::{Error, ErrorClass, Result};
