//! Error types for the serial bridge

use thiserror::Error;

/// Serial bridge errors
#[derive(Debug, Error)]
pub enum SerialError {
    /// Opening or configuring the port failed
    #[error("Serial port error: {0}")]
    Port(#[from] serialport::Error),

    /// I/O error during communication
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for serial bridge operations
pub type Result<T> = core::result::Result<T, SerialError>;

/// The detailed cause is logged; the core error only carries its class
impl From<SerialError> for gmmflash_core::Error {
    fn from(e: SerialError) -> Self {
        log::error!("{}", e);
        gmmflash_core::Error::Transport
    }
}
