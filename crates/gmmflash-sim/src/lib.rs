//! gmmflash-sim - Simulated SPI NOR flash behind a frame bridge
//!
//! This crate provides [`SimFlash`], a [`FrameChannel`] that decodes every
//! frame the way a real SPI25 part would and answers with the full-duplex
//! echo the bridge produces. It backs no-hardware runs of the CLI and the
//! end-to-end tests of the scheduler.
//!
//! The model follows the part closely where the host can observe it:
//! memory starts erased (`0xFF`), programming only clears bits and wraps
//! inside a page, program/erase opcodes are ignored unless WEL is set, and
//! WIP stays set for a configurable number of status reads.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use gmmflash_core::channel::FrameChannel;
use gmmflash_core::chip::{JedecId, UniqueId, PAGE_SIZE};
use gmmflash_core::error::{Error, Result};
use gmmflash_core::spi::{opcodes, ADDRESS_LEN};

/// Configuration for the simulated flash
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Identifier returned by RDID
    pub id: JedecId,
    /// Identifier returned by RDUID
    pub uid: UniqueId,
    /// Flash size in bytes
    pub size: usize,
    /// Page size for programming
    pub page_size: usize,
    /// Busy status reads after each program/erase opcode
    pub busy_polls: u32,
    /// WIP never clears (models a hung part)
    pub stuck_busy: bool,
    /// WREN never sets WEL (models a write-protected part)
    pub reject_write_enable: bool,
    /// Initial bit rate of the bridge
    pub bit_rate: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            id: JedecId::MOCK,
            uid: UniqueId::default(),
            size: 16 * 1024 * 1024,
            page_size: PAGE_SIZE as usize,
            busy_polls: 0,
            stuck_busy: false,
            reject_write_enable: false,
            bit_rate: 115_200,
        }
    }
}

/// Everything clocked during one chip-select assertion
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    /// Bytes sent, all frames concatenated
    pub bytes: Vec<u8>,
    /// Number of frames
    pub frames: usize,
}

#[cfg(feature = "alloc")]
impl Transaction {
    /// First byte sent, the opcode of a command transaction
    pub fn opcode(&self) -> Option<u8> {
        self.bytes.first().copied()
    }

    /// 3-byte address following the opcode
    pub fn address(&self) -> Option<u32> {
        let b = self.bytes.get(1..1 + ADDRESS_LEN)?;
        Some(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }
}

/// Simulated flash part on a frame bridge
///
/// The first frame after chip-select is decoded as a command. Further
/// frames under the same chip-select are clocked through unchanged, which
/// is how a bitstream upload looks on the wire.
#[cfg(feature = "alloc")]
pub struct SimFlash {
    config: SimConfig,
    data: Vec<u8>,
    write_enabled: bool,
    busy: u32,
    selected: bool,
    reply: Vec<u8>,
    transactions: Vec<Transaction>,
    status_reads: u32,
    bit_rate: u32,
}

#[cfg(feature = "alloc")]
impl SimFlash {
    /// Create a new simulated flash with the given configuration
    pub fn new(config: SimConfig) -> Self {
        let data = vec![0xFF; config.size];
        let bit_rate = config.bit_rate;
        Self {
            config,
            data,
            write_enabled: false,
            busy: 0,
            selected: false,
            reply: Vec::new(),
            transactions: Vec::new(),
            status_reads: 0,
            bit_rate,
        }
    }

    /// Create a simulated W25Q128 with default settings
    pub fn new_default() -> Self {
        Self::new(SimConfig::default())
    }

    /// Create a simulated flash with pre-filled data
    pub fn with_data(config: SimConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Get a mutable reference to the configuration
    ///
    /// Changes to the busy and write-enable knobs apply to the next command.
    pub fn config_mut(&mut self) -> &mut SimConfig {
        &mut self.config
    }

    /// Every transaction seen so far
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Opcodes of all transactions except status reads
    pub fn commands(&self) -> Vec<u8> {
        self.transactions
            .iter()
            .filter_map(Transaction::opcode)
            .filter(|&op| op != opcodes::RDSR)
            .collect()
    }

    /// Number of RDSR commands answered
    pub fn status_reads(&self) -> u32 {
        self.status_reads
    }

    /// Forget the transaction log and status read count
    pub fn clear_log(&mut self) {
        self.transactions.clear();
        self.status_reads = 0;
    }

    fn status(&mut self) -> u8 {
        self.status_reads += 1;
        let mut status = 0;
        if self.config.stuck_busy || self.busy > 0 {
            status |= opcodes::SR1_WIP;
            self.busy = self.busy.saturating_sub(1);
        }
        if self.write_enabled {
            status |= opcodes::SR1_WEL;
        }
        status
    }

    fn is_busy(&self) -> bool {
        self.config.stuck_busy || self.busy > 0
    }

    fn address(frame: &[u8]) -> Option<usize> {
        let b = frame.get(1..1 + ADDRESS_LEN)?;
        Some(u32::from_be_bytes([0, b[0], b[1], b[2]]) as usize)
    }

    /// Program/erase may only start with WEL set and WIP clear
    fn accept_write(&mut self, opcode: u8) -> bool {
        if !self.write_enabled || self.is_busy() {
            log::warn!(
                "sim: opcode 0x{:02X} ignored (WEL {}, busy {})",
                opcode,
                self.write_enabled,
                self.is_busy()
            );
            return false;
        }
        self.write_enabled = false;
        self.busy = self.config.busy_polls;
        true
    }

    fn fill_reply(reply: &mut [u8], offset: usize, src: &[u8]) {
        if let Some(dst) = reply.get_mut(offset..) {
            let n = dst.len().min(src.len());
            dst[..n].copy_from_slice(&src[..n]);
        }
    }

    fn command(&mut self, frame: &[u8], reply: &mut [u8]) {
        let header = 1 + ADDRESS_LEN;
        match frame[0] {
            opcodes::RDID => {
                let id = self.config.id;
                Self::fill_reply(reply, 1, &[id.manufacturer, id.memory_type, id.capacity]);
            }
            opcodes::RDUID => {
                let uid = self.config.uid.0;
                let offset = 1 + opcodes::RDUID_DUMMY_BYTES as usize;
                Self::fill_reply(reply, offset, &uid);
            }
            opcodes::RDSR => {
                let status = self.status();
                Self::fill_reply(reply, 1, &[status]);
            }
            opcodes::WREN => {
                if !self.config.reject_write_enable && !self.is_busy() {
                    self.write_enabled = true;
                }
            }
            opcodes::WRDI => self.write_enabled = false,
            opcodes::READ => {
                if let Some(addr) = Self::address(frame) {
                    let size = self.data.len();
                    for (i, b) in reply.iter_mut().skip(header).enumerate() {
                        *b = self.data[(addr + i) % size];
                    }
                }
            }
            opcodes::PP => {
                let Some(addr) = Self::address(frame) else {
                    return;
                };
                if !self.accept_write(opcodes::PP) {
                    return;
                }
                let page = self.config.page_size;
                let base = (addr % self.data.len()) / page * page;
                let start = addr % page;
                for (i, &byte) in frame[header..].iter().enumerate() {
                    // Only 1 -> 0 transitions; the address wraps inside the page
                    self.data[base + (start + i) % page] &= byte;
                }
            }
            op @ (opcodes::SE_20 | opcodes::BE_52 | opcodes::BE_D8) => {
                let Some(addr) = Self::address(frame) else {
                    return;
                };
                if !self.accept_write(op) {
                    return;
                }
                let size = match op {
                    opcodes::SE_20 => 4 * 1024,
                    opcodes::BE_52 => 32 * 1024,
                    _ => 64 * 1024,
                };
                let aligned = (addr % self.data.len()) & !(size - 1);
                let end = (aligned + size).min(self.data.len());
                self.data[aligned..end].fill(0xFF);
            }
            opcodes::CE_60 => {
                if self.accept_write(opcodes::CE_60) {
                    self.data.fill(0xFF);
                }
            }
            op => log::debug!("sim: ignoring opcode 0x{:02X}", op),
        }
    }
}

#[cfg(feature = "alloc")]
impl FrameChannel for SimFlash {
    fn assert_select(&mut self) -> Result<()> {
        self.selected = true;
        self.transactions.push(Transaction::default());
        Ok(())
    }

    fn deassert_select(&mut self) -> Result<()> {
        self.selected = false;
        Ok(())
    }

    fn write_frame(&mut self, data: &[u8]) -> Result<()> {
        if !self.selected {
            log::error!("sim: frame written without chip-select");
            return Err(Error::Transport);
        }

        let mut reply = vec![0u8; data.len()];
        let first = self
            .transactions
            .last()
            .map_or(true, |t| t.frames == 0);
        if first && !data.is_empty() {
            self.command(data, &mut reply);
        }

        if let Some(t) = self.transactions.last_mut() {
            t.bytes.extend_from_slice(data);
            t.frames += 1;
        }
        self.reply = reply;
        Ok(())
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.reply.len().min(buf.len());
        buf[..n].copy_from_slice(&self.reply[..n]);
        self.reply.clear();
        Ok(n)
    }

    fn bit_rate(&self) -> u32 {
        self.bit_rate
    }

    fn set_bit_rate(&mut self, rate: u32) -> Result<()> {
        log::debug!("sim: bit rate {} -> {}", self.bit_rate, rate);
        self.bit_rate = rate;
        Ok(())
    }

    fn delay_us(&mut self, _us: u32) {
        // No delay needed for in-memory operations
    }
}
