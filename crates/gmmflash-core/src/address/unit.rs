//! Address unit kinds

use core::fmt;

use bitflags::bitflags;

/// Granularity a selector is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// The whole chip, no selector
    Chip,
    /// Byte address
    Byte,
    /// Program page
    Page,
    /// 4 KiB sector
    Sector,
    /// 32 KiB block
    Block32,
    /// 64 KiB block
    Block64,
}

impl UnitKind {
    /// Every kind, in the order they are reported
    pub const ALL: [UnitKind; 6] = [
        UnitKind::Chip,
        UnitKind::Byte,
        UnitKind::Page,
        UnitKind::Sector,
        UnitKind::Block32,
        UnitKind::Block64,
    ];

    /// Name used on the command line
    pub const fn name(self) -> &'static str {
        match self {
            UnitKind::Chip => "chip",
            UnitKind::Byte => "addr",
            UnitKind::Page => "page",
            UnitKind::Sector => "sector",
            UnitKind::Block32 => "block32",
            UnitKind::Block64 => "block64",
        }
    }

    /// The matching flag in a [`UnitKinds`] set
    pub const fn flag(self) -> UnitKinds {
        match self {
            UnitKind::Chip => UnitKinds::CHIP,
            UnitKind::Byte => UnitKinds::BYTE,
            UnitKind::Page => UnitKinds::PAGE,
            UnitKind::Sector => UnitKinds::SECTOR,
            UnitKind::Block32 => UnitKinds::BLOCK32,
            UnitKind::Block64 => UnitKinds::BLOCK64,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Set of unit kinds supplied in one invocation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UnitKinds: u8 {
        /// Whole chip
        const CHIP    = 1 << 0;
        /// Byte address
        const BYTE    = 1 << 1;
        /// Page
        const PAGE    = 1 << 2;
        /// Sector
        const SECTOR  = 1 << 3;
        /// 32 KiB block
        const BLOCK32 = 1 << 4;
        /// 64 KiB block
        const BLOCK64 = 1 << 5;
    }
}

impl fmt::Display for UnitKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for kind in UnitKind::ALL {
            if self.contains(kind.flag()) {
                if !first {
                    f.write_str(", ")?;
                }
                f.write_str(kind.name())?;
                first = false;
            }
        }
        Ok(())
    }
}
