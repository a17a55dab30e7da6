//! Identifier and geometry types

use core::fmt;

use crate::address::UnitKind;

/// Page size shared by every supported part
pub const PAGE_SIZE: u32 = 256;
/// Sector (smallest erase unit) size
pub const SECTOR_SIZE: u32 = 4 * 1024;
/// 32 KiB block size
pub const BLOCK32_SIZE: u32 = 32 * 1024;
/// 64 KiB block size
pub const BLOCK64_SIZE: u32 = 64 * 1024;

/// The three bytes returned by RDID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JedecId {
    /// JEDEC manufacturer code
    pub manufacturer: u8,
    /// Vendor-specific memory type
    pub memory_type: u8,
    /// Capacity code (log2 of the size for most vendors)
    pub capacity: u8,
}

impl JedecId {
    /// Identifier reported in no-hardware mode (W25Q128)
    pub const MOCK: JedecId = JedecId::new(0xEF, 0x40, 0x18);

    /// Create an identifier from its three bytes
    pub const fn new(manufacturer: u8, memory_type: u8, capacity: u8) -> Self {
        Self {
            manufacturer,
            memory_type,
            capacity,
        }
    }

    /// Decode the RDID response
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }
}

impl fmt::Display for JedecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x} {:02x} {:02x}",
            self.manufacturer, self.memory_type, self.capacity
        )
    }
}

/// 128-bit factory unique ID returned by RDUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UniqueId(pub [u8; 16]);

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Everything the device reports about itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId {
    /// JEDEC identifier
    pub jedec: JedecId,
    /// Factory unique ID
    pub uid: UniqueId,
}

/// Identifier field that failed to match the device table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdField {
    /// Manufacturer code
    Manufacturer,
    /// Memory type code
    MemoryType,
    /// Capacity code
    Capacity,
}

impl fmt::Display for IdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manufacturer => write!(f, "manufacturer"),
            Self::MemoryType => write!(f, "memory type"),
            Self::Capacity => write!(f, "capacity"),
        }
    }
}

/// Program/erase geometry of a flash chip
///
/// Created once per session from the decoded identifier and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashGeometry {
    /// Page program unit
    pub page_size: u32,
    /// Smallest erase unit
    pub sector_size: u32,
    /// 32 KiB block erase unit
    pub block32_size: u32,
    /// 64 KiB block erase unit
    pub block64_size: u32,
    /// Total size in bytes
    pub chip_size: u32,
}

impl FlashGeometry {
    /// Standard geometry for a chip of `chip_size` bytes
    pub const fn with_chip_size(chip_size: u32) -> Self {
        Self {
            page_size: PAGE_SIZE,
            sector_size: SECTOR_SIZE,
            block32_size: BLOCK32_SIZE,
            block64_size: BLOCK64_SIZE,
            chip_size,
        }
    }

    /// Size in bytes of one unit of `kind`
    pub const fn unit_size(&self, kind: UnitKind) -> u32 {
        match kind {
            UnitKind::Chip => self.chip_size,
            UnitKind::Byte => 1,
            UnitKind::Page => self.page_size,
            UnitKind::Sector => self.sector_size,
            UnitKind::Block32 => self.block32_size,
            UnitKind::Block64 => self.block64_size,
        }
    }
}
