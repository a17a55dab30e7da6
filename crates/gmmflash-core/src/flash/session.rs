//! Flash session: one identified device behind one frame channel

use crate::address::{ByteRange, EraseTarget, UnitKind};
use crate::channel::{FrameChannel, MAX_FRAME_LEN};
use crate::chip::{self, DeviceEntry, DeviceId, FlashGeometry, JedecId, UniqueId};
use crate::error::{Error, Result};
use crate::protocol::{self, erase_cmd, page_program_cmd, payload_len, PollPolicy, WriteCycle};
use crate::spi::{opcodes, FlashCommand};

use super::erase::ErasePlan;
use super::progress::{Phase, Progress};

/// Longest vendor or part name kept in [`DeviceInfo`]
pub const NAME_LEN: usize = 32;

/// How much of the hardware an invocation may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Every command is sent
    #[default]
    Normal,
    /// Identification and reads run, program/erase/load are only logged
    DryRun,
    /// No frame is sent at all; a mock identifier stands in for the device
    NoHardware,
}

/// Configuration of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Hardware gating
    pub mode: Mode,
    /// Poll policy after Page Program
    pub program_poll: PollPolicy,
    /// Poll policy after Sector Erase
    pub sector_erase_poll: PollPolicy,
    /// Poll policy after 32/64 KiB Block Erase
    pub block_erase_poll: PollPolicy,
    /// Poll policy after Chip Erase
    pub chip_erase_poll: PollPolicy,
    /// Bit rate used only while reading the identifiers
    pub id_bit_rate: Option<u32>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Normal,
            program_poll: PollPolicy::PROGRAM,
            sector_erase_poll: PollPolicy::SECTOR_ERASE,
            block_erase_poll: PollPolicy::BLOCK_ERASE,
            chip_erase_poll: PollPolicy::CHIP_ERASE,
            id_bit_rate: None,
        }
    }
}

impl SessionOptions {
    /// Use the same status poll bound for every operation
    pub fn with_poll_attempts(mut self, attempts: u32) -> Self {
        self.program_poll = self.program_poll.with_attempts(attempts);
        self.sector_erase_poll = self.sector_erase_poll.with_attempts(attempts);
        self.block_erase_poll = self.block_erase_poll.with_attempts(attempts);
        self.chip_erase_poll = self.chip_erase_poll.with_attempts(attempts);
        self
    }

    /// Set the mode
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

/// The identified device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Identifiers read from the device (or the mock)
    pub id: DeviceId,
    /// Vendor from the device table
    pub vendor: heapless::String<NAME_LEN>,
    /// Part name from the device table
    pub name: heapless::String<NAME_LEN>,
    /// Geometry derived from the table row
    pub geometry: FlashGeometry,
}

fn short_name(s: &str) -> heapless::String<NAME_LEN> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Exclusive owner of the channel for one invocation
///
/// Identification happens in [`Session::open`], so every later operation
/// knows the geometry and checks its range before any data frame is sent.
/// Chunks are issued strictly in ascending address order and a failed
/// chunk aborts the whole operation.
pub struct Session<C: FrameChannel> {
    channel: C,
    options: SessionOptions,
    device: DeviceInfo,
}

impl<C: FrameChannel> Session<C> {
    /// Identify the device on `channel` and look it up in `devices`
    pub fn open<S: AsRef<str>>(
        mut channel: C,
        devices: &[DeviceEntry<S>],
        options: SessionOptions,
    ) -> Result<Self> {
        let id = read_id(&mut channel, &options)?;
        log::debug!("JEDEC ID {}, UID {}", id.jedec, id.uid);

        let entry = chip::identify(devices, id.jedec)?;
        let device = DeviceInfo {
            id,
            vendor: short_name(entry.vendor.as_ref()),
            name: short_name(entry.name.as_ref()),
            geometry: entry.geometry(),
        };
        log::info!(
            "Found {} {} ({} KiB)",
            device.vendor,
            device.name,
            device.geometry.chip_size / 1024
        );

        Ok(Self {
            channel,
            options,
            device,
        })
    }

    /// The identified device
    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    /// Geometry of the identified device
    pub fn geometry(&self) -> &FlashGeometry {
        &self.device.geometry
    }

    /// Options this session was opened with
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Access the channel
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Give the channel back
    pub fn into_channel(self) -> C {
        self.channel
    }

    fn span(&self, addr: u32, len: usize) -> Result<ByteRange> {
        let chip_size = self.device.geometry.chip_size;
        let end = addr as u64 + len as u64 - 1;
        let end = u32::try_from(end).map_err(|_| Error::OutOfRange {
            end: u32::MAX,
            chip_size,
        })?;
        ByteRange::new(addr, end).validate(chip_size)
    }

    fn gated(&self, what: &str, range: ByteRange) -> bool {
        match self.options.mode {
            Mode::Normal => false,
            Mode::DryRun => {
                log::info!("dry run: {} {} not sent", what, range);
                true
            }
            Mode::NoHardware => {
                log::info!("no hardware: {} {} skipped", what, range);
                true
            }
        }
    }

    /// Read `buf.len()` bytes starting at `addr`
    pub fn read<P: Progress + ?Sized>(
        &mut self,
        addr: u32,
        buf: &mut [u8],
        progress: &mut P,
    ) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let range = self.span(addr, buf.len())?;
        progress.begin(Phase::Reading, range.len());

        if self.options.mode == Mode::NoHardware {
            buf.fill(0xFF);
            progress.advance(range.len());
            progress.end();
            return Ok(());
        }

        let payload = payload_len(&self.channel);
        let mut done = 0u32;
        for chunk in buf.chunks_mut(payload) {
            let at = addr + done;
            protocol::read(&mut self.channel, at, chunk).map_err(|e| {
                log::error!("read failed at 0x{:06X}: {}", at, e);
                e
            })?;
            done += chunk.len() as u32;
            progress.advance(done);
        }
        log::debug!("read {} ({} bytes)", range, done);
        progress.end();
        Ok(())
    }

    /// Program `data` at `addr`
    ///
    /// The target must already be erased. Each frame carries at most one
    /// frame payload and never crosses a page boundary; every frame is a
    /// complete write cycle before the next one starts.
    pub fn write<P: Progress + ?Sized>(
        &mut self,
        addr: u32,
        data: &[u8],
        progress: &mut P,
    ) -> Result<()> {
        if data.is_empty() {
            return Err(Error::NoData);
        }
        let range = self.span(addr, data.len())?;
        progress.begin(Phase::Writing, range.len());
        if self.gated("write", range) {
            progress.advance(range.len());
            progress.end();
            return Ok(());
        }

        let payload = payload_len(&self.channel) as u32;
        let page = self.device.geometry.page_size;
        let policy = self.options.program_poll;
        let mut done = 0u32;
        while done < range.len() {
            let at = addr + done;
            let len = payload.min(page - at % page).min(range.len() - done);
            let chunk = &data[done as usize..(done + len) as usize];

            let mut cmd = page_program_cmd(at, chunk);
            WriteCycle::new(&mut self.channel, policy)
                .run(&mut cmd)
                .map_err(|e| {
                    log::error!("program failed at 0x{:06X}: {}", at, e);
                    e
                })?;

            done += len;
            progress.advance(done);
        }
        log::debug!("programmed {}", range);
        progress.end();
        Ok(())
    }

    /// Erase a target
    ///
    /// A range is widened to sector boundaries and erased with the greedy
    /// block/sector plan of [`ErasePlan`]; the chip target uses Chip Erase.
    pub fn erase<P: Progress + ?Sized>(
        &mut self,
        target: EraseTarget,
        progress: &mut P,
    ) -> Result<()> {
        match target {
            EraseTarget::Chip => self.erase_chip(progress),
            EraseTarget::Range(range) => self.erase_range(range, progress),
        }
    }

    fn erase_chip<P: Progress + ?Sized>(&mut self, progress: &mut P) -> Result<()> {
        let chip_size = self.device.geometry.chip_size;
        let range = ByteRange::new(0, chip_size - 1);
        progress.begin(Phase::Erasing, chip_size);
        if !self.gated("chip erase", range) {
            let mut cmd = erase_cmd(opcodes::CE_60, 0);
            self.cycle(&mut cmd, self.options.chip_erase_poll)?;
            log::debug!("chip erased");
        }
        progress.advance(chip_size);
        progress.end();
        Ok(())
    }

    fn erase_range<P: Progress + ?Sized>(
        &mut self,
        range: ByteRange,
        progress: &mut P,
    ) -> Result<()> {
        let range = range.validate(self.device.geometry.chip_size)?;
        let plan = ErasePlan::new(range, &self.device.geometry);
        let aligned = plan.range();
        if aligned != range {
            log::info!("erase widened to sector boundaries: {}", aligned);
        }

        progress.begin(Phase::Erasing, aligned.len());
        if self.gated("erase", aligned) {
            progress.advance(aligned.len());
            progress.end();
            return Ok(());
        }

        let mut done = 0u32;
        for step in plan {
            let policy = match step.kind {
                UnitKind::Sector => self.options.sector_erase_poll,
                _ => self.options.block_erase_poll,
            };
            log::debug!("erase {} at 0x{:06X}", step.kind, step.addr);
            let mut cmd = erase_cmd(step.opcode(), step.addr);
            self.cycle(&mut cmd, policy).map_err(|e| {
                log::error!("{} erase failed at 0x{:06X}: {}", step.kind, step.addr, e);
                e
            })?;
            done += step.size;
            progress.advance(done);
        }
        progress.end();
        Ok(())
    }

    fn cycle(&mut self, cmd: &mut FlashCommand<'_>, policy: PollPolicy) -> Result<()> {
        WriteCycle::new(&mut self.channel, policy).run(cmd)
    }

    /// Read back `expected.len()` bytes at `addr` and compare
    ///
    /// Fails with [`Error::VerifyMismatch`] at the first differing byte.
    pub fn verify<P: Progress + ?Sized>(
        &mut self,
        addr: u32,
        expected: &[u8],
        progress: &mut P,
    ) -> Result<()> {
        if expected.is_empty() {
            return Ok(());
        }
        let range = self.span(addr, expected.len())?;
        progress.begin(Phase::Verifying, range.len());

        let payload = payload_len(&self.channel);
        let mut buf = [0u8; MAX_FRAME_LEN];
        let mut done = 0u32;
        for want in expected.chunks(payload) {
            let at = addr + done;
            let got = &mut buf[..want.len()];
            if self.options.mode == Mode::NoHardware {
                got.fill(0xFF);
            } else {
                protocol::read(&mut self.channel, at, got)?;
            }
            if let Some(i) = got.iter().zip(want).position(|(a, b)| a != b) {
                let addr = at + i as u32;
                log::error!("verify mismatch at 0x{:06X}", addr);
                return Err(Error::VerifyMismatch { addr });
            }
            done += want.len() as u32;
            progress.advance(done);
        }
        progress.end();
        Ok(())
    }

    /// Stream a configuration bitstream through the bridge
    ///
    /// See [`load_bitstream`](super::load_bitstream); the session mode
    /// gates the upload.
    pub fn load_bitstream<P: Progress + ?Sized>(
        &mut self,
        data: &[u8],
        progress: &mut P,
    ) -> Result<()> {
        super::load::load_bitstream(&mut self.channel, self.options.mode, data, progress)
    }
}

fn read_id<C: FrameChannel>(channel: &mut C, options: &SessionOptions) -> Result<DeviceId> {
    if options.mode == Mode::NoHardware {
        log::info!("no hardware: using mock JEDEC ID {}", JedecId::MOCK);
        return Ok(DeviceId {
            jedec: JedecId::MOCK,
            uid: UniqueId::default(),
        });
    }

    let Some(rate) = options.id_bit_rate else {
        return protocol::read_device_id(channel);
    };

    let saved = channel.bit_rate();
    log::debug!("identifying at {} bit/s (was {})", rate, saved);
    channel.set_bit_rate(rate)?;
    let result = protocol::read_device_id(channel);
    let restored = channel.set_bit_rate(saved);
    let id = result?;
    restored?;
    Ok(id)
}
