//! CLI command implementations
//!
//! Every command checks what it can without hardware first (address given,
//! input readable and non-empty), then opens a [`Session`] through
//! [`Context::open`] and resolves the address against the identified chip.

mod erase;
mod id;
mod load;
mod progress;
mod read;
mod verify;
mod write;

pub use erase::run_erase;
pub use id::run_id;
pub use load::run_load;
pub use read::run_read;
pub use verify::run_verify;
pub use write::run_write;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use gmmflash_core::address::AddressSelection;
use gmmflash_core::channel::FrameChannel;
use gmmflash_core::chip::DeviceDatabase;
use gmmflash_core::flash::{Mode, Session, SessionOptions};
use gmmflash_sim::SimFlash;

/// Channel type the CLI works with
pub type Channel = Box<dyn FrameChannel + Send>;

/// Errors raised by the CLI itself
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Input file could not be read
    #[error("cannot read {path}: {source}")]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Output file could not be written
    #[error("cannot write {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input file does not fit the 24-bit address space
    #[error("{path} is too large ({len} bytes)")]
    TooLarge { path: PathBuf, len: usize },

    /// Built without the serial backend
    #[error("serial support not compiled in; use --no-hw")]
    NoSerial,
}

/// Everything a command needs to reach the device
pub struct Context {
    /// Connection string of the bridge
    pub port: String,
    /// Session configuration built from the global flags
    pub options: SessionOptions,
    /// Built-in and user-supplied device rows
    pub devices: DeviceDatabase,
}

impl Context {
    /// Open the channel and identify the device
    pub fn open(&self) -> Result<Session<Channel>, Box<dyn Error>> {
        let channel = self.channel()?;
        Ok(Session::open(channel, self.devices.entries(), self.options)?)
    }

    /// Open the channel without identifying anything
    pub fn channel(&self) -> Result<Channel, Box<dyn Error>> {
        if self.options.mode == Mode::NoHardware {
            log::debug!("no hardware: {} not opened", self.port);
            return Ok(Box::new(SimFlash::new_default()));
        }
        open_serial(&self.port)
    }
}

#[cfg(feature = "serial")]
fn open_serial(port: &str) -> Result<Channel, Box<dyn Error>> {
    let conn = gmmflash_serial::SerialConnection::parse(port)?;
    Ok(Box::new(gmmflash_serial::open_bridge(&conn)?))
}

#[cfg(not(feature = "serial"))]
fn open_serial(_port: &str) -> Result<Channel, Box<dyn Error>> {
    Err(CliError::NoSerial.into())
}

/// Fail before touching hardware when no unit or more than one was given
fn require_address(selection: &AddressSelection) -> Result<(), gmmflash_core::Error> {
    let kinds = selection.kinds();
    if kinds.is_empty() {
        return Err(gmmflash_core::Error::MissingAddress);
    }
    if kinds.bits().count_ones() > 1 {
        return Err(gmmflash_core::Error::AmbiguousUnit(kinds));
    }
    Ok(())
}

/// Read a whole input file, refusing empty ones
fn read_input(path: &Path) -> Result<Vec<u8>, Box<dyn Error>> {
    let data = fs::read(path).map_err(|source| CliError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    if data.is_empty() {
        return Err(gmmflash_core::Error::NoData.into());
    }
    if u32::try_from(data.len()).is_err() {
        return Err(CliError::TooLarge {
            path: path.to_path_buf(),
            len: data.len(),
        }
        .into());
    }
    log::debug!("{}: {} bytes", path.display(), data.len());
    Ok(data)
}
