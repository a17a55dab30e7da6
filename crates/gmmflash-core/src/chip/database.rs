//! Device database for runtime loading and lookup
//!
//! This module provides the `DeviceDatabase` type which starts from the
//! built-in rows and can be extended with RON device files.

use alloc::format;
use alloc::{string::String, string::ToString, vec::Vec};
use std::fs;
use std::io;
use std::path::Path;

use super::table::{identify, DeviceEntry, BUILTIN_DEVICES};
use super::types::{JedecId, BLOCK64_SIZE};
use crate::error::Result;
use crate::spi::ADDRESS_SPACE;

/// Error type for device database operations
#[derive(Debug)]
pub enum DeviceDbError {
    /// I/O error reading files
    Io(io::Error),
    /// RON parsing error
    Parse(ron::error::SpannedError),
    /// Validation error
    Validation(String),
}

impl From<io::Error> for DeviceDbError {
    fn from(e: io::Error) -> Self {
        DeviceDbError::Io(e)
    }
}

impl From<ron::error::SpannedError> for DeviceDbError {
    fn from(e: ron::error::SpannedError) -> Self {
        DeviceDbError::Parse(e)
    }
}

impl std::fmt::Display for DeviceDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceDbError::Io(e) => write!(f, "I/O error: {}", e),
            DeviceDbError::Parse(e) => write!(f, "Parse error: {}", e),
            DeviceDbError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for DeviceDbError {}

// ============================================================================
// RON deserialization types (intermediate format)
// ============================================================================

/// Size specification with human-readable units (for RON parsing)
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub enum Size {
    /// Size in bytes
    B(u32),
    /// Size in kibibytes (1024 bytes)
    KiB(u32),
    /// Size in mebibytes (1024 * 1024 bytes)
    MiB(u32),
}

impl Size {
    /// Convert to bytes, `None` on overflow
    pub fn to_bytes(self) -> Option<u32> {
        match self {
            Size::B(n) => Some(n),
            Size::KiB(n) => n.checked_mul(1024),
            Size::MiB(n) => n.checked_mul(1024 * 1024),
        }
    }
}

/// Single part definition in RON format
#[derive(Debug, Clone, serde::Deserialize)]
struct PartDef {
    name: String,
    memory_type: u8,
    capacity: u8,
    total_size: Size,
}

/// Vendor definition containing multiple parts
#[derive(Debug, Clone, serde::Deserialize)]
struct VendorDef {
    vendor: String,
    manufacturer_id: u8,
    parts: Vec<PartDef>,
}

// ============================================================================
// Device database
// ============================================================================

/// Runtime device database
#[derive(Debug, Clone)]
pub struct DeviceDatabase {
    entries: Vec<DeviceEntry<String>>,
}

impl Default for DeviceDatabase {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl DeviceDatabase {
    /// Create a database holding only the built-in rows
    pub fn with_builtin() -> Self {
        let entries = BUILTIN_DEVICES
            .iter()
            .map(|e| DeviceEntry {
                vendor: e.vendor.to_string(),
                name: e.name.to_string(),
                id: e.id,
                chip_size: e.chip_size,
            })
            .collect();
        Self { entries }
    }

    /// Load part definitions from a single RON file
    pub fn load_file(&mut self, path: &Path) -> core::result::Result<usize, DeviceDbError> {
        let content = fs::read_to_string(path)?;
        self.load_ron(&content)
    }

    /// Load part definitions from a RON string
    ///
    /// A row with the same JEDEC triple as an existing one replaces it.
    pub fn load_ron(&mut self, content: &str) -> core::result::Result<usize, DeviceDbError> {
        let vendor_def: VendorDef = ron::from_str(content)?;
        let count = vendor_def.parts.len();

        for part in vendor_def.parts {
            let chip_size = part.total_size.to_bytes().ok_or_else(|| {
                DeviceDbError::Validation(format!("{}: size overflows", part.name))
            })?;
            if chip_size == 0 || chip_size % BLOCK64_SIZE != 0 {
                return Err(DeviceDbError::Validation(format!(
                    "{}: size {} is not a multiple of 64 KiB",
                    part.name, chip_size
                )));
            }
            if chip_size > ADDRESS_SPACE {
                return Err(DeviceDbError::Validation(format!(
                    "{}: size {} needs 4-byte addressing",
                    part.name, chip_size
                )));
            }

            let entry = DeviceEntry {
                vendor: vendor_def.vendor.clone(),
                name: part.name,
                id: JedecId::new(vendor_def.manufacturer_id, part.memory_type, part.capacity),
                chip_size,
            };
            log::debug!("device db: {} {} ({})", entry.vendor, entry.name, entry.id);

            match self.entries.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => *existing = entry,
                None => self.entries.push(entry),
            }
        }

        Ok(count)
    }

    /// Get all entries in the database
    pub fn entries(&self) -> &[DeviceEntry<String>] {
        &self.entries
    }

    /// Get the number of entries in the database
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the entry for `id`
    pub fn identify(&self, id: JedecId) -> Result<&DeviceEntry<String>> {
        identify(&self.entries, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::IdField;
    use crate::error::Error;

    const ISSI_RON: &str = r#"
    (
        vendor: "ISSI",
        manufacturer_id: 0x9D,
        parts: [
            (name: "IS25LP064", memory_type: 0x60, capacity: 0x17, total_size: MiB(8)),
            (name: "IS25LP128", memory_type: 0x60, capacity: 0x18, total_size: MiB(16)),
        ],
    )
    "#;

    #[test]
    fn test_load_ron_extends_builtin() {
        let mut db = DeviceDatabase::with_builtin();
        let before = db.len();
        assert_eq!(db.load_ron(ISSI_RON).unwrap(), 2);
        assert_eq!(db.len(), before + 2);

        let entry = db.identify(JedecId::new(0x9D, 0x60, 0x18)).unwrap();
        assert_eq!(entry.vendor, "ISSI");
        assert_eq!(entry.name, "IS25LP128");
        assert_eq!(entry.geometry().chip_size, 16 * 1024 * 1024);

        // Builtin rows still resolve
        assert!(db.identify(JedecId::MOCK).is_ok());
    }

    #[test]
    fn test_load_ron_replaces_same_id() {
        let mut db = DeviceDatabase::with_builtin();
        let ron = r#"(vendor: "Winbond", manufacturer_id: 0xEF, parts: [
            (name: "W25Q128JV", memory_type: 0x40, capacity: 0x18, total_size: MiB(16)),
        ])"#;
        let before = db.len();
        db.load_ron(ron).unwrap();
        assert_eq!(db.len(), before);
        assert_eq!(db.identify(JedecId::MOCK).unwrap().name, "W25Q128JV");
    }

    #[test]
    fn test_load_ron_rejects_4byte_parts() {
        let mut db = DeviceDatabase::with_builtin();
        let ron = r#"(vendor: "Winbond", manufacturer_id: 0xEF, parts: [
            (name: "W25Q256", memory_type: 0x40, capacity: 0x19, total_size: MiB(32)),
        ])"#;
        assert!(matches!(
            db.load_ron(ron),
            Err(DeviceDbError::Validation(_))
        ));
    }

    #[test]
    fn test_load_ron_rejects_unaligned_size() {
        let mut db = DeviceDatabase::with_builtin();
        let ron = r#"(vendor: "Odd", manufacturer_id: 0x42, parts: [
            (name: "ODD1", memory_type: 0x01, capacity: 0x01, total_size: KiB(36)),
        ])"#;
        assert!(matches!(
            db.load_ron(ron),
            Err(DeviceDbError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_id_still_rejected() {
        let db = DeviceDatabase::with_builtin();
        let id = JedecId::new(0x9D, 0x60, 0x18);
        assert_eq!(
            db.identify(id).unwrap_err(),
            Error::UnsupportedDevice {
                field: IdField::Manufacturer,
                id
            }
        );
    }

    #[test]
    fn test_size_conversion() {
        assert_eq!(Size::B(256).to_bytes(), Some(256));
        assert_eq!(Size::KiB(4).to_bytes(), Some(4096));
        assert_eq!(Size::MiB(16).to_bytes(), Some(16777216));
        assert_eq!(Size::MiB(8192).to_bytes(), None);
    }
}
