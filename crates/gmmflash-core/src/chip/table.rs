//! Table of supported parts
//!
//! Parts are rows keyed by the full JEDEC triple. Supporting a new part
//! means adding a row here or in a RON device file.

use crate::error::{Error, Result};

use super::types::{FlashGeometry, IdField, JedecId};

const MIB: u32 = 1024 * 1024;

/// One supported part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry<S = &'static str> {
    /// Vendor name
    pub vendor: S,
    /// Part name
    pub name: S,
    /// JEDEC identifier
    pub id: JedecId,
    /// Total size in bytes
    pub chip_size: u32,
}

impl<S> DeviceEntry<S> {
    /// Geometry of this part
    pub fn geometry(&self) -> FlashGeometry {
        FlashGeometry::with_chip_size(self.chip_size)
    }
}

const fn row(
    vendor: &'static str,
    name: &'static str,
    id: (u8, u8, u8),
    chip_size: u32,
) -> DeviceEntry {
    DeviceEntry {
        vendor,
        name,
        id: JedecId::new(id.0, id.1, id.2),
        chip_size,
    }
}

/// Parts known without a device file
pub const BUILTIN_DEVICES: &[DeviceEntry] = &[
    row("Winbond", "W25Q16", (0xEF, 0x40, 0x15), 2 * MIB),
    row("Winbond", "W25Q32", (0xEF, 0x40, 0x16), 4 * MIB),
    row("Winbond", "W25Q64", (0xEF, 0x40, 0x17), 8 * MIB),
    row("Winbond", "W25Q128", (0xEF, 0x40, 0x18), 16 * MIB),
    row("Winbond", "W25Q64 (QPI)", (0xEF, 0x60, 0x17), 8 * MIB),
    row("Winbond", "W25Q128 (QPI)", (0xEF, 0x60, 0x18), 16 * MIB),
    row("Winbond", "W25Q128JV-M", (0xEF, 0x70, 0x18), 16 * MIB),
    row("Macronix", "MX25L3233F", (0xC2, 0x20, 0x16), 4 * MIB),
    row("Macronix", "MX25L12835F", (0xC2, 0x20, 0x18), 16 * MIB),
    row("GigaDevice", "GD25Q32", (0xC8, 0x40, 0x16), 4 * MIB),
    row("GigaDevice", "GD25Q128", (0xC8, 0x40, 0x18), 16 * MIB),
];

/// Find the row matching `id`
///
/// Fields are checked in order manufacturer, memory type, capacity and the
/// first one without a match is reported. Geometry is never guessed.
pub fn identify<S>(entries: &[DeviceEntry<S>], id: JedecId) -> Result<&DeviceEntry<S>> {
    let unsupported = |field| Error::UnsupportedDevice { field, id };

    if !entries.iter().any(|e| e.id.manufacturer == id.manufacturer) {
        return Err(unsupported(IdField::Manufacturer));
    }
    if !entries
        .iter()
        .any(|e| e.id.manufacturer == id.manufacturer && e.id.memory_type == id.memory_type)
    {
        return Err(unsupported(IdField::MemoryType));
    }
    entries
        .iter()
        .find(|e| e.id == id)
        .ok_or_else(|| unsupported(IdField::Capacity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_w25q128() {
        let entry = identify(BUILTIN_DEVICES, JedecId::new(0xEF, 0x40, 0x18)).unwrap();
        assert_eq!(entry.name, "W25Q128");
        let geo = entry.geometry();
        assert_eq!(geo.chip_size, 16 * MIB);
        assert_eq!(geo.page_size, 256);
        assert_eq!(geo.sector_size, 4096);
        assert_eq!(geo.block32_size, 32768);
        assert_eq!(geo.block64_size, 65536);
    }

    #[test]
    fn test_identify_capacity_selects_size() {
        let small = identify(BUILTIN_DEVICES, JedecId::new(0xEF, 0x40, 0x16)).unwrap();
        assert_eq!(small.chip_size, 4 * MIB);
        let large = identify(BUILTIN_DEVICES, JedecId::new(0xC8, 0x40, 0x18)).unwrap();
        assert_eq!(large.chip_size, 16 * MIB);
    }

    #[test]
    fn test_identify_reports_first_unknown_field() {
        let cases = [
            (JedecId::new(0x01, 0x40, 0x18), IdField::Manufacturer),
            (JedecId::new(0xEF, 0x99, 0x18), IdField::MemoryType),
            (JedecId::new(0xEF, 0x40, 0x30), IdField::Capacity),
            // Blank bus
            (JedecId::new(0xFF, 0xFF, 0xFF), IdField::Manufacturer),
        ];
        for (id, field) in cases {
            assert_eq!(
                identify(BUILTIN_DEVICES, id),
                Err(Error::UnsupportedDevice { field, id })
            );
        }
    }

    #[test]
    fn test_builtin_sizes_are_block_aligned_and_addressable() {
        for entry in BUILTIN_DEVICES {
            assert_eq!(entry.chip_size % (64 * 1024), 0, "{}", entry.name);
            assert!(entry.chip_size <= crate::spi::ADDRESS_SPACE, "{}", entry.name);
        }
    }
}
