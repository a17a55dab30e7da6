//! Status register 1 flags

use bitflags::bitflags;

use super::opcodes::{SR1_WEL, SR1_WIP};

bitflags! {
    /// Status register 1 as returned by RDSR
    ///
    /// Only WIP and WEL drive the write cycle; the block-protect bits are
    /// kept so the raw value survives a round trip through this type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Write In Progress - program or erase still running
        const WIP = SR1_WIP;
        /// Write Enable Latch - the next program/erase opcode is accepted
        const WEL = SR1_WEL;
        const _ = !0;
    }
}

impl Status {
    /// True while a program or erase is running
    pub fn busy(self) -> bool {
        self.contains(Status::WIP)
    }

    /// True when the write enable latch is set
    pub fn write_enabled(self) -> bool {
        self.contains(Status::WEL)
    }
}
