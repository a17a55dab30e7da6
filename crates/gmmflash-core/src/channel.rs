//! Frame channel abstraction
//!
//! The bridge turns every byte frame written to it into one full-duplex SPI
//! transfer and sends the clocked-in bytes back, so a request of `n` bytes
//! always answers with `n` bytes. Chip-select is a side-band signal: the
//! bridge holds nCS low while the host asserts it.

use crate::error::{Error, Result};

/// Largest transaction the bridge accepts in one frame
pub const MAX_FRAME_LEN: usize = 64;

/// One transaction's worth of bytes
pub type Frame = heapless::Vec<u8, MAX_FRAME_LEN>;

/// Byte-frame channel with an explicit chip-select line
///
/// Implementations only provide the raw primitives. The provided
/// [`transact`](FrameChannel::transact) method brackets one exchange with
/// chip-select, which is the only way the command protocol talks to the
/// flash.
pub trait FrameChannel {
    /// Largest frame this channel accepts (never more than [`MAX_FRAME_LEN`])
    fn max_frame_len(&self) -> usize {
        MAX_FRAME_LEN
    }

    /// Drive chip-select active
    fn assert_select(&mut self) -> Result<()>;

    /// Release chip-select
    fn deassert_select(&mut self) -> Result<()>;

    /// Send one frame
    fn write_frame(&mut self, data: &[u8]) -> Result<()>;

    /// Receive up to `buf.len()` bytes, returning how many arrived
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Current bit rate
    fn bit_rate(&self) -> u32;

    /// Change the bit rate
    fn set_bit_rate(&mut self, rate: u32) -> Result<()>;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Write one frame and collect its echo, without touching chip-select
    fn exchange(&mut self, out: &[u8]) -> Result<Frame> {
        let max = self.max_frame_len().min(MAX_FRAME_LEN);
        if out.len() > max {
            return Err(Error::FrameTooLong {
                len: out.len(),
                max,
            });
        }

        self.write_frame(out)?;

        let mut frame = Frame::new();
        frame
            .resize(out.len(), 0)
            .map_err(|_| Error::FrameTooLong {
                len: out.len(),
                max: MAX_FRAME_LEN,
            })?;
        let got = self.read_frame(&mut frame)?;
        if got < out.len() {
            return Err(Error::ShortRead {
                expected: out.len(),
                got,
            });
        }

        log::trace!("xfer {:02X?} -> {:02X?}", out, frame.as_slice());
        Ok(frame)
    }

    /// Run one complete transaction: select, exchange, deselect
    ///
    /// Chip-select is released even when the exchange fails.
    fn transact(&mut self, out: &[u8]) -> Result<Frame> {
        self.assert_select()?;
        let result = self.exchange(out);
        let released = self.deassert_select();
        let frame = result?;
        released?;
        Ok(frame)
    }
}

impl<C: FrameChannel + ?Sized> FrameChannel for &mut C {
    fn max_frame_len(&self) -> usize {
        (**self).max_frame_len()
    }

    fn assert_select(&mut self) -> Result<()> {
        (**self).assert_select()
    }

    fn deassert_select(&mut self) -> Result<()> {
        (**self).deassert_select()
    }

    fn write_frame(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_frame(data)
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_frame(buf)
    }

    fn bit_rate(&self) -> u32 {
        (**self).bit_rate()
    }

    fn set_bit_rate(&mut self, rate: u32) -> Result<()> {
        (**self).set_bit_rate(rate)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

// Lets the CLI pick a backend at runtime
#[cfg(feature = "alloc")]
impl FrameChannel for alloc::boxed::Box<dyn FrameChannel + Send> {
    fn max_frame_len(&self) -> usize {
        (**self).max_frame_len()
    }

    fn assert_select(&mut self) -> Result<()> {
        (**self).assert_select()
    }

    fn deassert_select(&mut self) -> Result<()> {
        (**self).deassert_select()
    }

    fn write_frame(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_frame(data)
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_frame(buf)
    }

    fn bit_rate(&self) -> u32 {
        (**self).bit_rate()
    }

    fn set_bit_rate(&mut self, rate: u32) -> Result<()> {
        (**self).set_bit_rate(rate)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes `fill` for every byte and can drop the tail of a reply
    struct Loopback {
        selected: bool,
        select_events: u32,
        last_len: usize,
        fill: u8,
        short_by: usize,
    }

    impl Loopback {
        fn new() -> Self {
            Self {
                selected: false,
                select_events: 0,
                last_len: 0,
                fill: 0xA5,
                short_by: 0,
            }
        }
    }

    impl FrameChannel for Loopback {
        fn assert_select(&mut self) -> Result<()> {
            self.selected = true;
            self.select_events += 1;
            Ok(())
        }

        fn deassert_select(&mut self) -> Result<()> {
            self.selected = false;
            Ok(())
        }

        fn write_frame(&mut self, data: &[u8]) -> Result<()> {
            assert!(self.selected);
            self.last_len = data.len();
            Ok(())
        }

        fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
            let n = self.last_len.saturating_sub(self.short_by).min(buf.len());
            buf[..n].fill(self.fill);
            Ok(n)
        }

        fn bit_rate(&self) -> u32 {
            115_200
        }

        fn set_bit_rate(&mut self, _rate: u32) -> Result<()> {
            Ok(())
        }

        fn delay_us(&mut self, _us: u32) {}
    }

    #[test]
    fn test_transact_echoes_same_length() {
        let mut ch = Loopback::new();
        let frame = ch.transact(&[0x9F, 0, 0, 0]).unwrap();
        assert_eq!(frame.len(), 4);
        assert!(frame.iter().all(|&b| b == 0xA5));
        assert!(!ch.selected);
        assert_eq!(ch.select_events, 1);
    }

    #[test]
    fn test_short_read_releases_select() {
        let mut ch = Loopback::new();
        ch.short_by = 2;
        let err = ch.transact(&[0x03, 0, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            Error::ShortRead {
                expected: 6,
                got: 4
            }
        );
        assert!(!ch.selected);
    }

    #[test]
    fn test_oversized_frame_never_written() {
        let mut ch = Loopback::new();
        let out = [0u8; MAX_FRAME_LEN + 1];
        let err = ch.transact(&out).unwrap_err();
        assert_eq!(
            err,
            Error::FrameTooLong {
                len: MAX_FRAME_LEN + 1,
                max: MAX_FRAME_LEN
            }
        );
        assert_eq!(ch.last_len, 0);
        assert!(!ch.selected);
    }
}
