//! SPI25 protocol implementation
//!
//! This module implements the JEDEC SPI flash command sequences the bridge
//! can carry: identification, status polling, the write-enable handshake,
//! page program, normal read and the erase opcodes. Every function issues
//! whole frames through [`FlashCommand::execute`], so chip-select always
//! brackets exactly one command.

use crate::channel::{FrameChannel, MAX_FRAME_LEN};
use crate::chip::{DeviceId, JedecId, UniqueId};
use crate::error::{Error, Result};
use crate::spi::{opcodes, FlashCommand, Status, ADDRESS_LEN};

/// Opcode plus 3-byte address
pub const HEADER_LEN: usize = 1 + ADDRESS_LEN;

/// Data bytes one read or program frame carries on `channel`
pub fn payload_len<C: FrameChannel + ?Sized>(channel: &C) -> usize {
    channel.max_frame_len().min(MAX_FRAME_LEN) - HEADER_LEN
}

/// How long to keep polling the status register for WIP to clear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Number of status reads before giving up
    pub max_attempts: u32,
    /// Delay between two status reads
    pub delay_us: u32,
}

impl PollPolicy {
    /// Default number of status reads
    pub const DEFAULT_ATTEMPTS: u32 = 1000;

    /// Page program: typically well under a millisecond
    pub const PROGRAM: Self = Self::new(Self::DEFAULT_ATTEMPTS, 0);
    /// 4 KiB sector erase
    pub const SECTOR_ERASE: Self = Self::new(Self::DEFAULT_ATTEMPTS, 1_000);
    /// 32/64 KiB block erase
    pub const BLOCK_ERASE: Self = Self::new(Self::DEFAULT_ATTEMPTS, 4_000);
    /// Chip erase, which can take minutes on large parts
    pub const CHIP_ERASE: Self = Self::new(Self::DEFAULT_ATTEMPTS, 200_000);

    /// Create a policy
    pub const fn new(max_attempts: u32, delay_us: u32) -> Self {
        Self {
            max_attempts,
            delay_us,
        }
    }

    /// Same delay with a different attempt bound
    pub const fn with_attempts(self, max_attempts: u32) -> Self {
        Self::new(max_attempts, self.delay_us)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::PROGRAM
    }
}

/// Read the JEDEC ID from a flash chip
pub fn read_jedec_id<C: FrameChannel + ?Sized>(channel: &mut C) -> Result<JedecId> {
    let mut buf = [0u8; 3];
    let mut cmd = FlashCommand::read_reg(opcodes::RDID, &mut buf);
    cmd.execute(channel)?;
    Ok(JedecId::from_bytes(buf))
}

/// Read the 128-bit factory unique ID
pub fn read_unique_id<C: FrameChannel + ?Sized>(channel: &mut C) -> Result<UniqueId> {
    let mut buf = [0u8; opcodes::UID_LEN];
    let mut cmd = FlashCommand::read_reg(opcodes::RDUID, &mut buf)
        .with_dummy_len(opcodes::RDUID_DUMMY_BYTES);
    cmd.execute(channel)?;
    Ok(UniqueId(buf))
}

/// Read JEDEC ID and unique ID
pub fn read_device_id<C: FrameChannel + ?Sized>(channel: &mut C) -> Result<DeviceId> {
    let jedec = read_jedec_id(channel)?;
    let uid = read_unique_id(channel)?;
    Ok(DeviceId { jedec, uid })
}

/// Read the status register 1
pub fn read_status<C: FrameChannel + ?Sized>(channel: &mut C) -> Result<Status> {
    let mut buf = [0u8; 1];
    let mut cmd = FlashCommand::read_reg(opcodes::RDSR, &mut buf);
    cmd.execute(channel)?;
    Ok(Status::from_bits_retain(buf[0]))
}

/// Wait for the WIP (Write In Progress) bit to clear
///
/// Reads the status register at most `policy.max_attempts` times, sleeping
/// `policy.delay_us` between reads. If WIP is still set after the last
/// read the result is [`Error::Timeout`].
pub fn wait_idle<C: FrameChannel + ?Sized>(channel: &mut C, policy: PollPolicy) -> Result<()> {
    for attempt in 1..=policy.max_attempts {
        let status = read_status(channel)?;
        if !status.busy() {
            if attempt > 1 {
                log::trace!("idle after {} polls", attempt);
            }
            return Ok(());
        }
        if policy.delay_us > 0 && attempt < policy.max_attempts {
            channel.delay_us(policy.delay_us);
        }
    }

    log::error!(
        "flash still busy after {} status polls",
        policy.max_attempts
    );
    Err(Error::Timeout {
        attempts: policy.max_attempts,
    })
}

/// Set the write enable latch
///
/// Waits for the device to go idle, sends WREN and reads the status back.
/// If WEL did not latch the result is [`Error::WriteEnableRejected`] and
/// the caller must not send the program/erase opcode.
pub fn write_enable<C: FrameChannel + ?Sized>(channel: &mut C, policy: PollPolicy) -> Result<()> {
    wait_idle(channel, policy)?;

    let mut cmd = FlashCommand::simple(opcodes::WREN);
    cmd.execute(channel)?;

    let status = read_status(channel)?;
    if !status.write_enabled() {
        log::error!("write enable not accepted, status 0x{:02X}", status.bits());
        return Err(Error::WriteEnableRejected {
            status: status.bits(),
        });
    }
    Ok(())
}

/// Send the Write Disable command
pub fn write_disable<C: FrameChannel + ?Sized>(channel: &mut C) -> Result<()> {
    let mut cmd = FlashCommand::simple(opcodes::WRDI);
    cmd.execute(channel)
}

/// Build a Page Program command for one frame of data
///
/// No handshake is performed; see [`WriteCycle`](super::WriteCycle).
pub fn page_program_cmd(addr: u32, data: &[u8]) -> FlashCommand<'_> {
    FlashCommand::write(opcodes::PP, addr, data)
}

/// Build an erase command for `opcode` at `addr`
///
/// [`opcodes::CE_60`] takes no address.
pub fn erase_cmd(opcode: u8, addr: u32) -> FlashCommand<'static> {
    if opcode == opcodes::CE_60 {
        FlashCommand::simple(opcode)
    } else {
        FlashCommand::erase(opcode, addr)
    }
}

/// Normal read of `buf.len()` bytes starting at `addr`
///
/// The read is split into frame-sized transactions issued in ascending
/// address order.
pub fn read<C: FrameChannel + ?Sized>(channel: &mut C, addr: u32, buf: &mut [u8]) -> Result<()> {
    let payload = payload_len(channel);
    let mut offset = addr;
    for chunk in buf.chunks_mut(payload) {
        let len = chunk.len() as u32;
        let mut cmd = FlashCommand::read(opcodes::READ, offset, chunk);
        cmd.execute(channel)?;
        offset += len;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Scripted;

    #[test]
    fn test_read_jedec_id() {
        let mut ch = Scripted::new();
        ch.id = [0xC2, 0x20, 0x16];
        let id = read_jedec_id(&mut ch).unwrap();
        assert_eq!(id, JedecId::new(0xC2, 0x20, 0x16));
        assert_eq!(ch.frames, [[0x9F, 0, 0, 0]]);
    }

    #[test]
    fn test_read_unique_id() {
        let mut ch = Scripted::new();
        for (i, b) in ch.uid.iter_mut().enumerate() {
            *b = i as u8;
        }
        let uid = read_unique_id(&mut ch).unwrap();
        assert_eq!(uid.0[15], 15);
        assert_eq!(ch.frames[0].len(), 21);
        assert_eq!(ch.frames[0][0], 0x4B);
    }

    #[test]
    fn test_wait_idle_polls_until_clear() {
        let mut ch = Scripted::new();
        ch.statuses.extend([0x01, 0x03, 0x01, 0x00]);
        wait_idle(&mut ch, PollPolicy::new(10, 5)).unwrap();
        assert_eq!(ch.frames.len(), 4);
        assert_eq!(ch.delays, 3);
    }

    #[test]
    fn test_wait_idle_timeout_after_exact_bound() {
        for bound in [1, 7, 1000] {
            let mut ch = Scripted::new();
            ch.stuck_busy = true;
            let err = wait_idle(&mut ch, PollPolicy::new(bound, 0)).unwrap_err();
            assert_eq!(err, Error::Timeout { attempts: bound });
            assert_eq!(ch.frames.len(), bound as usize);
            assert!(ch.opcodes().iter().all(|&op| op == opcodes::RDSR));
        }
    }

    #[test]
    fn test_write_enable_confirms_wel() {
        let mut ch = Scripted::new();
        write_enable(&mut ch, PollPolicy::PROGRAM).unwrap();
        assert_eq!(
            ch.opcodes(),
            [opcodes::RDSR, opcodes::WREN, opcodes::RDSR]
        );
    }

    #[test]
    fn test_write_enable_rejected() {
        let mut ch = Scripted::new();
        ch.reject_wel = true;
        let err = write_enable(&mut ch, PollPolicy::PROGRAM).unwrap_err();
        assert_eq!(err, Error::WriteEnableRejected { status: 0 });
        assert_eq!(err.class(), crate::ErrorClass::Hardware);
    }

    #[test]
    fn test_read_chunks_to_payload() {
        let mut ch = Scripted::new();
        let mut buf = [0u8; 130];
        read(&mut ch, 0x100, &mut buf).unwrap();

        let lens: std::vec::Vec<usize> = ch.frames.iter().map(|f| f.len()).collect();
        assert_eq!(lens, [64, 64, 14]);
        assert_eq!(&ch.frames[1][..4], &[0x03, 0x00, 0x01, 0x3C]);
        for (i, b) in buf.iter().enumerate() {
            assert_eq!(*b, (0x100 + i) as u8);
        }
    }

    #[test]
    fn test_erase_cmd_encoding() {
        assert_eq!(
            erase_cmd(opcodes::BE_D8, 0x01_0000).encode().unwrap().as_slice(),
            &[0xD8, 0x01, 0x00, 0x00]
        );
        assert_eq!(
            erase_cmd(opcodes::CE_60, 0).encode().unwrap().as_slice(),
            &[0x60]
        );
    }
}
