//! Scripted frame channel shared by the unit tests

use std::collections::VecDeque;
use std::vec::Vec;

use crate::channel::FrameChannel;
use crate::error::{Error, Result};
use crate::spi::opcodes;

/// Answers just enough of the SPI25 command set to drive the protocol code
///
/// Every frame is recorded. RDSR answers come from `statuses` first and
/// fall back to the modelled WIP/WEL state once the script is exhausted.
pub(crate) struct Scripted {
    pub frames: Vec<Vec<u8>>,
    pub statuses: VecDeque<u8>,
    pub id: [u8; 3],
    pub uid: [u8; 16],
    /// Number of busy RDSR answers after each program/erase opcode
    pub busy_polls: u32,
    pub stuck_busy: bool,
    pub reject_wel: bool,
    pub bit_rate: u32,
    pub rate_changes: Vec<u32>,
    pub delays: u32,
    pub selects: u32,
    selected: bool,
    wel: bool,
    busy: u32,
    pending: Vec<u8>,
}

impl Scripted {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            statuses: VecDeque::new(),
            id: [0xEF, 0x40, 0x18],
            uid: [0; 16],
            busy_polls: 0,
            stuck_busy: false,
            reject_wel: false,
            bit_rate: 115_200,
            rate_changes: Vec::new(),
            delays: 0,
            selects: 0,
            selected: false,
            wel: false,
            busy: 0,
            pending: Vec::new(),
        }
    }

    pub fn opcodes(&self) -> Vec<u8> {
        self.frames.iter().map(|f| f[0]).collect()
    }

    /// Opcodes with the RDSR polls left out
    pub fn commands(&self) -> Vec<u8> {
        self.opcodes()
            .into_iter()
            .filter(|&op| op != opcodes::RDSR)
            .collect()
    }

    fn status(&mut self) -> u8 {
        if let Some(s) = self.statuses.pop_front() {
            return s;
        }
        let mut s = 0;
        if self.stuck_busy || self.busy > 0 {
            s |= opcodes::SR1_WIP;
            self.busy = self.busy.saturating_sub(1);
        }
        if self.wel {
            s |= opcodes::SR1_WEL;
        }
        s
    }

    fn respond(&mut self, out: &[u8]) -> Vec<u8> {
        let mut reply = std::vec![0u8; out.len()];
        match out[0] {
            opcodes::RDID => reply[1..4].copy_from_slice(&self.id),
            opcodes::RDUID => reply[5..21].copy_from_slice(&self.uid),
            opcodes::RDSR => reply[1] = self.status(),
            opcodes::WREN => self.wel = !self.reject_wel,
            opcodes::WRDI => self.wel = false,
            opcodes::READ => {
                let addr = u32::from_be_bytes([0, out[1], out[2], out[3]]);
                for (i, b) in reply[4..].iter_mut().enumerate() {
                    *b = (addr as usize + i) as u8;
                }
            }
            opcodes::PP | opcodes::SE_20 | opcodes::BE_52 | opcodes::BE_D8 | opcodes::CE_60 => {
                self.wel = false;
                self.busy = self.busy_polls;
            }
            _ => {}
        }
        reply
    }
}

impl FrameChannel for Scripted {
    fn assert_select(&mut self) -> Result<()> {
        self.selected = true;
        self.selects += 1;
        Ok(())
    }

    fn deassert_select(&mut self) -> Result<()> {
        self.selected = false;
        Ok(())
    }

    fn write_frame(&mut self, data: &[u8]) -> Result<()> {
        if !self.selected {
            return Err(Error::Transport);
        }
        self.frames.push(data.to_vec());
        self.pending = self.respond(data);
        Ok(())
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        Ok(n)
    }

    fn bit_rate(&self) -> u32 {
        self.bit_rate
    }

    fn set_bit_rate(&mut self, rate: u32) -> Result<()> {
        self.bit_rate = rate;
        self.rate_changes.push(rate);
        Ok(())
    }

    fn delay_us(&mut self, _us: u32) {
        self.delays += 1;
    }
}
