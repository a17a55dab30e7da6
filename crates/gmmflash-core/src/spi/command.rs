//! SPI command structure

use crate::channel::{Frame, FrameChannel};
use crate::error::{Error, Result};

/// Number of address bytes sent after the opcode
pub const ADDRESS_LEN: usize = 3;

/// Bytes reachable with a 3-byte address (16 MiB)
pub const ADDRESS_SPACE: u32 = 1 << 24;

/// A single SPI transaction
///
/// Designed to avoid allocation - uses slices for data.
/// The lifetime parameter `'a` ties the command to the buffers it references.
///
/// On the wire the command is `opcode`, the optional big-endian address,
/// `dummy_len` zero bytes, `write_data`, then one zero byte per byte of
/// `read_buf`. The bridge answers with the same number of bytes; the tail
/// matching `read_buf` is the device's response.
pub struct FlashCommand<'a> {
    /// The opcode byte
    pub opcode: u8,

    /// 3-byte address (if any)
    pub address: Option<u32>,

    /// Dummy bytes between header and data
    pub dummy_len: u8,

    /// Data to write after opcode/address/dummy
    pub write_data: &'a [u8],

    /// Buffer to read into (mutable)
    pub read_buf: &'a mut [u8],
}

impl<'a> FlashCommand<'a> {
    /// Create a simple command with no address or data (e.g., WREN, WRDI)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            dummy_len: 0,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a read register command with no address (e.g., RDSR, RDID)
    pub fn read_reg(opcode: u8, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: None,
            dummy_len: 0,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a read command with 3-byte address (e.g., READ)
    pub fn read(opcode: u8, addr: u32, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            dummy_len: 0,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a write command with 3-byte address (e.g., PP)
    pub fn write(opcode: u8, addr: u32, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            dummy_len: 0,
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Create an erase command with 3-byte address
    pub fn erase(opcode: u8, addr: u32) -> Self {
        Self {
            opcode,
            address: Some(addr),
            dummy_len: 0,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Set the number of dummy bytes
    pub fn with_dummy_len(mut self, len: u8) -> Self {
        self.dummy_len = len;
        self
    }

    /// Length of opcode, address and dummy bytes
    pub fn header_len(&self) -> usize {
        let addr_len = if self.address.is_some() { ADDRESS_LEN } else { 0 };
        1 + addr_len + self.dummy_len as usize
    }

    /// Total number of bytes clocked in this transaction
    pub fn total_len(&self) -> usize {
        self.header_len() + self.write_data.len() + self.read_buf.len()
    }

    /// Encode the outgoing frame
    pub fn encode(&self) -> Result<Frame> {
        let mut frame = Frame::new();
        let too_long = |_| Error::FrameTooLong {
            len: self.total_len(),
            max: crate::channel::MAX_FRAME_LEN,
        };

        frame.push(self.opcode).map_err(too_long)?;
        if let Some(addr) = self.address {
            if addr >= ADDRESS_SPACE {
                return Err(Error::OutOfRange {
                    end: addr,
                    chip_size: ADDRESS_SPACE,
                });
            }
            frame
                .extend_from_slice(&addr.to_be_bytes()[1..])
                .map_err(|_| too_long(0))?;
        }
        frame
            .resize(self.header_len(), 0)
            .map_err(|_| too_long(0))?;
        frame
            .extend_from_slice(self.write_data)
            .map_err(|_| too_long(0))?;
        frame
            .resize(self.total_len(), 0)
            .map_err(|_| too_long(0))?;
        Ok(frame)
    }

    /// Run this command as one transaction on `channel`
    ///
    /// The response bytes that line up with `read_buf` are copied into it.
    pub fn execute<C: FrameChannel + ?Sized>(&mut self, channel: &mut C) -> Result<()> {
        let out = self.encode()?;
        let response = channel.transact(&out)?;

        let offset = self.header_len() + self.write_data.len();
        let end = offset + self.read_buf.len();
        self.read_buf.copy_from_slice(&response[offset..end]);
        Ok(())
    }
}
