//! Standard JEDEC SPI flash opcodes
//!
//! Only the single-I/O, 3-byte-address subset that the bridge can carry is
//! listed here.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any write/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL bit in status register
pub const WRDI: u8 = 0x04;

// ============================================================================
// Status register
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer, memory type, capacity)
pub const RDID: u8 = 0x9F;
/// Read Unique ID (64/128-bit factory serial)
pub const RDUID: u8 = 0x4B;
/// Dummy bytes clocked between RDUID and the unique ID
pub const RDUID_DUMMY_BYTES: u8 = 4;
/// Length of the unique ID in bytes
pub const UID_LEN: usize = 16;

// ============================================================================
// Read / program
// ============================================================================

/// Read Data (normal read, no dummy cycles)
pub const READ: u8 = 0x03;
/// Page Program
pub const PP: u8 = 0x02;

// ============================================================================
// Erase
// ============================================================================

/// Sector Erase 4 KiB
pub const SE_20: u8 = 0x20;
/// Block Erase 32 KiB
pub const BE_52: u8 = 0x52;
/// Block Erase 64 KiB
pub const BE_D8: u8 = 0xD8;
/// Chip Erase
pub const CE_60: u8 = 0x60;

// ============================================================================
// Status register bits
// ============================================================================

/// Status Register 1: Write In Progress
pub const SR1_WIP: u8 = 1 << 0;
/// Status Register 1: Write Enable Latch
pub const SR1_WEL: u8 = 1 << 1;
