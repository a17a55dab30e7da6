//! USB-CDC frame bridge
//!
//! The bridge firmware turns every write on the CDC data endpoint into one
//! SPI transfer of the same length and sends the received bytes back. DTR
//! drives nCS: asserting DTR pulls chip-select low.

use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use gmmflash_core::channel::FrameChannel;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::error::{Result, SerialError};

/// Default line rate of the bridge
pub const DEFAULT_BAUD: u32 = 115_200;

/// Read and write timeout of the port
const TIMEOUT: Duration = Duration::from_secs(5);

/// Minimum time DTR stays released before the next select
///
/// The firmware samples DTR once per 1 ms scheduler tick and only raises
/// nCS on a tick that sees it released. A shorter release can be missed,
/// merging two commands into one SPI transaction.
const SELECT_SETTLE: Duration = Duration::from_millis(2);

/// Time still to wait before chip-select may be asserted again
fn settle_remaining(released_at: Option<Instant>, now: Instant) -> Option<Duration> {
    let elapsed = now.saturating_duration_since(released_at?);
    SELECT_SETTLE.checked_sub(elapsed).filter(|d| !d.is_zero())
}

/// Serial port bridge to the SPI flash
pub struct SerialBridge {
    port: Box<dyn SerialPort>,
    baud: u32,
    released_at: Option<Instant>,
}

impl SerialBridge {
    /// Open a serial port with the specified baud rate
    ///
    /// If `baud` is `None`, uses [`DEFAULT_BAUD`].
    pub fn open(device: &str, baud: Option<u32>) -> Result<Self> {
        let baud = baud.unwrap_or(DEFAULT_BAUD);

        let mut port = serialport::new(device, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(TIMEOUT)
            .open()?;

        // Start with the flash deselected
        port.write_data_terminal_ready(false)?;

        log::info!("Opened serial port {} at {} baud", device, baud);

        Ok(Self {
            port,
            baud,
            released_at: Some(Instant::now()),
        })
    }

    fn set_select(&mut self, active: bool) -> Result<()> {
        if active {
            if let Some(wait) = settle_remaining(self.released_at, Instant::now()) {
                std::thread::sleep(wait);
            }
        }
        self.port.write_data_terminal_ready(active)?;
        self.released_at = if active { None } else { Some(Instant::now()) };
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    /// Read until `buf` is full or the port times out
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut got = 0;
        while got < buf.len() {
            match self.port.read(&mut buf[got..]) {
                Ok(0) => break,
                Ok(n) => got += n,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(SerialError::from(e)),
            }
        }
        if got < buf.len() {
            log::debug!("echo timed out after {} of {} bytes", got, buf.len());
        }
        Ok(got)
    }

    fn change_baud(&mut self, rate: u32) -> Result<()> {
        if rate == 0 {
            return Err(SerialError::InvalidParameter(
                "baud rate must be non-zero".to_string(),
            ));
        }
        self.port.set_baud_rate(rate)?;
        log::debug!("bit rate {} -> {}", self.baud, rate);
        self.baud = rate;
        Ok(())
    }
}

impl FrameChannel for SerialBridge {
    fn assert_select(&mut self) -> gmmflash_core::Result<()> {
        Ok(self.set_select(true)?)
    }

    fn deassert_select(&mut self) -> gmmflash_core::Result<()> {
        Ok(self.set_select(false)?)
    }

    fn write_frame(&mut self, data: &[u8]) -> gmmflash_core::Result<()> {
        Ok(self.send(data)?)
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> gmmflash_core::Result<usize> {
        Ok(self.receive(buf)?)
    }

    fn bit_rate(&self) -> u32 {
        self.baud
    }

    fn set_bit_rate(&mut self, rate: u32) -> gmmflash_core::Result<()> {
        Ok(self.change_baud(rate)?)
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(us as u64));
    }
}

impl Drop for SerialBridge {
    fn drop(&mut self) {
        // Leave the flash deselected
        if let Err(e) = self.port.write_data_terminal_ready(false) {
            log::warn!("Failed to release chip-select: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_after_recent_release() {
        let released = Instant::now();
        let wait = settle_remaining(Some(released), released + Duration::from_micros(500));
        assert_eq!(wait, Some(Duration::from_micros(1500)));
    }

    #[test]
    fn test_no_settle_when_idle_long_enough() {
        let released = Instant::now();
        assert_eq!(settle_remaining(Some(released), released + SELECT_SETTLE), None);
        assert_eq!(
            settle_remaining(Some(released), released + Duration::from_millis(50)),
            None
        );
    }

    #[test]
    fn test_no_settle_while_selected() {
        assert_eq!(settle_remaining(None, Instant::now()), None);
    }
}
