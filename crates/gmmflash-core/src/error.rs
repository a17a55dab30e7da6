//! Error types for gmmflash-core
//!
//! This module provides a no_std compatible error type that is shared by the
//! resolver, the command protocol and the scheduler.

use core::fmt;

use crate::address::UnitKinds;
use crate::chip::{IdField, JedecId};

/// Broad category of an error
///
/// The CLI maps each class to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad, missing or conflicting address selection
    Usage,
    /// Range ordering or chip bounds violated
    Range,
    /// The identified device is not in the device table
    Device,
    /// Transport or flash handshake failure
    Hardware,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Address selection errors
    /// Selector text is not `N`, `N,M` or `N,+K`
    InvalidSelector,
    /// More than one address unit kind was supplied
    AmbiguousUnit(UnitKinds),
    /// The operation needs an address and none was supplied
    MissingAddress,
    /// There is nothing to write
    NoData,
    /// The selected range cannot hold the data to be written
    RangeTooSmall {
        /// Length of the selected range in bytes
        range_len: u32,
        /// Length of the data in bytes
        data_len: u32,
    },

    // Range errors
    /// End address lies before the start address
    InvalidRange {
        /// Start address
        start: u32,
        /// End address (inclusive)
        end: u32,
    },
    /// End address lies beyond the chip
    OutOfRange {
        /// End address (inclusive)
        end: u32,
        /// Chip size in bytes
        chip_size: u32,
    },

    // Device errors
    /// The JEDEC ID does not match any known device
    UnsupportedDevice {
        /// First identifier field that failed to match
        field: IdField,
        /// The identifier read from the device
        id: JedecId,
    },

    // Hardware errors
    /// WIP did not clear within the poll budget
    Timeout {
        /// Number of status reads performed
        attempts: u32,
    },
    /// WEL was not set after Write Enable
    WriteEnableRejected {
        /// Status register value seen after Write Enable
        status: u8,
    },
    /// The bridge returned fewer bytes than were clocked out
    ShortRead {
        /// Bytes expected
        expected: usize,
        /// Bytes received
        got: usize,
    },
    /// A single transaction does not fit into one frame
    FrameTooLong {
        /// Requested transaction length
        len: usize,
        /// Channel frame limit
        max: usize,
    },
    /// The underlying transport failed
    Transport,
    /// Read-back data differs from the expected data
    VerifyMismatch {
        /// Address of the first differing byte
        addr: u32,
    },
}

impl Error {
    /// Category of this error
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidSelector
            | Self::AmbiguousUnit(_)
            | Self::MissingAddress
            | Self::NoData
            | Self::RangeTooSmall { .. } => ErrorClass::Usage,
            Self::InvalidRange { .. } | Self::OutOfRange { .. } => ErrorClass::Range,
            Self::UnsupportedDevice { .. } => ErrorClass::Device,
            Self::Timeout { .. }
            | Self::WriteEnableRejected { .. }
            | Self::ShortRead { .. }
            | Self::FrameTooLong { .. }
            | Self::Transport
            | Self::VerifyMismatch { .. } => ErrorClass::Hardware,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSelector => {
                write!(f, "invalid address selector (expected N, N,M or N,+K)")
            }
            Self::AmbiguousUnit(kinds) => {
                write!(f, "more than one address unit given ({})", kinds)
            }
            Self::MissingAddress => write!(f, "no address given for this operation"),
            Self::NoData => write!(f, "nothing to write: the data is empty"),
            Self::RangeTooSmall {
                range_len,
                data_len,
            } => write!(
                f,
                "selected range holds {} bytes but the data is {} bytes",
                range_len, data_len
            ),
            Self::InvalidRange { start, end } => write!(
                f,
                "end address 0x{:06X} is before start address 0x{:06X}",
                end, start
            ),
            Self::OutOfRange { end, chip_size } => write!(
                f,
                "end address 0x{:06X} is beyond the chip (size 0x{:06X})",
                end, chip_size
            ),
            Self::UnsupportedDevice { field, id } => {
                write!(f, "unsupported flash device {}: unknown {}", id, field)
            }
            Self::Timeout { attempts } => write!(
                f,
                "flash still busy after {} status polls",
                attempts
            ),
            Self::WriteEnableRejected { status } => write!(
                f,
                "device did not accept write enable (status 0x{:02X})",
                status
            ),
            Self::ShortRead { expected, got } => {
                write!(f, "short read: expected {} bytes, got {}", expected, got)
            }
            Self::FrameTooLong { len, max } => write!(
                f,
                "transaction of {} bytes exceeds the {} byte frame",
                len, max
            ),
            Self::Transport => write!(f, "transport error"),
            Self::VerifyMismatch { addr } => {
                write!(f, "verify failed: data mismatch at 0x{:06X}", addr)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
