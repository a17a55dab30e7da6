//! gmmflash-serial - USB-serial SPI bridge transport
//!
//! This crate implements [`FrameChannel`](gmmflash_core::channel::FrameChannel)
//! over the CDC-ACM port exposed by the bridge firmware. Every frame written
//! to the port is clocked out on SPI and the bytes clocked in come back with
//! the same length; the DTR line is chip-select.
//!
//! # Example
//!
//! ```no_run
//! use gmmflash_serial::{SerialBridge, SerialConnection};
//! use gmmflash_core::protocol;
//!
//! let conn = SerialConnection::parse("/dev/ttyACM2:115200")?;
//! let mut bridge = SerialBridge::open(&conn.device, conn.baud)?;
//! let id = protocol::read_jedec_id(&mut bridge)?;
//! println!("JEDEC ID: {}", id);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bridge;
pub mod error;

pub use bridge::{SerialBridge, DEFAULT_BAUD};
pub use error::{Result, SerialError};

/// Where the bridge is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConnection {
    /// Device path (e.g., "/dev/ttyACM2" or "COM3")
    pub device: String,
    /// Baud rate (None for [`DEFAULT_BAUD`])
    pub baud: Option<u32>,
}

impl SerialConnection {
    /// Parse a connection string
    ///
    /// Formats:
    /// - `/dev/ttyACM2` - default baud
    /// - `/dev/ttyACM2:115200` - specified baud
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(SerialError::InvalidParameter(
                "empty serial device".to_string(),
            ));
        }
        if let Some((device, baud_str)) = s.rsplit_once(':') {
            let baud = baud_str
                .parse()
                .ok()
                .filter(|&b: &u32| b > 0)
                .ok_or_else(|| {
                    SerialError::InvalidParameter(format!("Invalid baud rate: {}", baud_str))
                })?;
            if device.is_empty() {
                return Err(SerialError::InvalidParameter(format!(
                    "Missing device in {}",
                    s
                )));
            }
            Ok(SerialConnection {
                device: device.to_string(),
                baud: Some(baud),
            })
        } else {
            Ok(SerialConnection {
                device: s.to_string(),
                baud: None,
            })
        }
    }
}

impl std::str::FromStr for SerialConnection {
    type Err = SerialError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Open the bridge described by a connection string
pub fn open_bridge(conn: &SerialConnection) -> Result<SerialBridge> {
    SerialBridge::open(&conn.device, conn.baud)
}
