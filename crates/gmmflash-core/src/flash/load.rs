//! Raw bitstream upload
//!
//! A configuration bitstream is not a flash command: the target (typically
//! an FPGA in slave SPI mode) takes the bytes as they come. The upload
//! therefore needs no identification and no address logic.

use crate::channel::{FrameChannel, MAX_FRAME_LEN};
use crate::error::{Error, Result};

use super::progress::{Phase, Progress};
use super::session::Mode;

/// Stream `data` with chip-select held for the whole upload
///
/// The data goes out in full frames and the echoed bytes are discarded.
/// Chip-select is released even when a frame fails. In [`Mode::DryRun`]
/// and [`Mode::NoHardware`] nothing is sent.
pub fn load_bitstream<C, P>(channel: &mut C, mode: Mode, data: &[u8], progress: &mut P) -> Result<()>
where
    C: FrameChannel + ?Sized,
    P: Progress + ?Sized,
{
    if data.is_empty() {
        return Err(Error::NoData);
    }
    let total = u32::try_from(data.len()).map_err(|_| Error::OutOfRange {
        end: u32::MAX,
        chip_size: u32::MAX,
    })?;

    progress.begin(Phase::Loading, total);
    match mode {
        Mode::Normal => {}
        Mode::DryRun => log::info!("dry run: bitstream of {} bytes not sent", total),
        Mode::NoHardware => log::info!("no hardware: bitstream of {} bytes skipped", total),
    }
    if mode != Mode::Normal {
        progress.advance(total);
        progress.end();
        return Ok(());
    }

    channel.assert_select()?;
    let result = stream(channel, data, progress);
    let released = channel.deassert_select();
    result?;
    released?;

    log::debug!("loaded {} bytes", total);
    progress.end();
    Ok(())
}

fn stream<C, P>(channel: &mut C, data: &[u8], progress: &mut P) -> Result<()>
where
    C: FrameChannel + ?Sized,
    P: Progress + ?Sized,
{
    let frame_len = channel.max_frame_len().min(MAX_FRAME_LEN);
    let mut done = 0u32;
    for chunk in data.chunks(frame_len) {
        channel.exchange(chunk).map_err(|e| {
            log::error!("bitstream frame at offset {} failed: {}", done, e);
            e
        })?;
        done += chunk.len() as u32;
        progress.advance(done);
    }
    Ok(())
}
