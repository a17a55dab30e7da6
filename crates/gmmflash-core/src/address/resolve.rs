//! Operation-specific address resolution

use super::range::ByteRange;
use super::selector::UnitSelector;
use super::unit::{UnitKind, UnitKinds};
use crate::chip::FlashGeometry;
use crate::error::{Error, Result};

/// Address units supplied on the command line
///
/// Each field corresponds to one unit kind; at most one may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressSelection {
    /// Whole chip
    pub chip: bool,
    /// Byte address selector
    pub addr: Option<UnitSelector>,
    /// Page selector
    pub page: Option<UnitSelector>,
    /// Sector selector
    pub sector: Option<UnitSelector>,
    /// 32 KiB block selector
    pub block32: Option<UnitSelector>,
    /// 64 KiB block selector
    pub block64: Option<UnitSelector>,
}

/// A selection resolved against the chip geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// Unit kind the user chose
    pub kind: UnitKind,
    /// Byte range, already validated against the chip size
    pub range: ByteRange,
    /// Whether the user gave an explicit end (`N,M`, `N,+K` or the chip)
    pub explicit_end: bool,
}

/// What to do when an explicit write range is shorter than the data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FitPolicy {
    /// Grow the range to the data length and report it
    #[default]
    Widen,
    /// Refuse with [`Error::RangeTooSmall`]
    Strict,
}

/// Range a write will cover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRange {
    /// Exactly the bytes that will be programmed
    pub range: ByteRange,
    /// True if the user's range had to grow to fit the data
    pub widened: bool,
}

/// What an erase will touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseTarget {
    /// Chip Erase opcode, no range logic
    Chip,
    /// Sector/block erases over a byte range
    Range(ByteRange),
}

impl AddressSelection {
    /// Selection of the whole chip
    pub fn whole_chip() -> Self {
        Self {
            chip: true,
            ..Self::default()
        }
    }

    /// Selection of a single unit kind
    pub fn of(kind: UnitKind, selector: UnitSelector) -> Self {
        let mut sel = Self::default();
        match kind {
            UnitKind::Chip => sel.chip = true,
            UnitKind::Byte => sel.addr = Some(selector),
            UnitKind::Page => sel.page = Some(selector),
            UnitKind::Sector => sel.sector = Some(selector),
            UnitKind::Block32 => sel.block32 = Some(selector),
            UnitKind::Block64 => sel.block64 = Some(selector),
        }
        sel
    }

    fn selectors(&self) -> [(UnitKind, Option<UnitSelector>); 5] {
        [
            (UnitKind::Byte, self.addr),
            (UnitKind::Page, self.page),
            (UnitKind::Sector, self.sector),
            (UnitKind::Block32, self.block32),
            (UnitKind::Block64, self.block64),
        ]
    }

    /// Unit kinds that were supplied
    pub fn kinds(&self) -> UnitKinds {
        let mut kinds = UnitKinds::empty();
        if self.chip {
            kinds |= UnitKinds::CHIP;
        }
        for (kind, selector) in self.selectors() {
            if selector.is_some() {
                kinds |= kind.flag();
            }
        }
        kinds
    }

    /// Resolve the selection, `None` if nothing was supplied
    ///
    /// Every supplied selector is resolved and checked against the chip
    /// first, so a bad range is reported even alongside a second unit kind.
    /// Only then is the one-kind rule enforced.
    pub fn resolve(&self, geometry: &FlashGeometry) -> Result<Option<Resolved>> {
        let mut found = None;

        if self.chip {
            found = Some(Resolved {
                kind: UnitKind::Chip,
                range: ByteRange::new(0, geometry.chip_size - 1),
                explicit_end: true,
            });
        }

        for (kind, selector) in self.selectors() {
            let Some(selector) = selector else {
                continue;
            };
            let range = selector.resolve(geometry.unit_size(kind), geometry.chip_size)?;
            if found.is_none() {
                found = Some(Resolved {
                    kind,
                    range,
                    explicit_end: selector.has_end(),
                });
            }
        }

        let kinds = self.kinds();
        if kinds.bits().count_ones() > 1 {
            return Err(Error::AmbiguousUnit(kinds));
        }
        Ok(found)
    }
}

/// Range to read
pub fn resolve_read(selection: &AddressSelection, geometry: &FlashGeometry) -> Result<ByteRange> {
    selection
        .resolve(geometry)?
        .map(|r| r.range)
        .ok_or(Error::MissingAddress)
}

/// Range to program with `data_len` bytes
///
/// Without an explicit end the range is derived from the data length. An
/// explicit range longer than the data is trimmed to the data; one shorter
/// than the data is widened or refused according to `policy`.
pub fn resolve_write(
    selection: &AddressSelection,
    geometry: &FlashGeometry,
    data_len: u32,
    policy: FitPolicy,
) -> Result<WriteRange> {
    let resolved = selection.resolve(geometry)?.ok_or(Error::MissingAddress)?;
    let start = resolved.range.start;

    let exact = |len: u32| {
        let end = start as u64 + len as u64 - 1;
        let end = u32::try_from(end).unwrap_or(u32::MAX);
        ByteRange::new(start, end).validate(geometry.chip_size)
    };

    if data_len == 0 {
        return Err(Error::NoData);
    }

    if !resolved.explicit_end {
        return Ok(WriteRange {
            range: exact(data_len)?,
            widened: false,
        });
    }

    let range_len = resolved.range.len();
    if range_len >= data_len {
        if range_len > data_len {
            log::debug!(
                "write covers {} of {} selected bytes",
                data_len,
                range_len
            );
        }
        return Ok(WriteRange {
            range: exact(data_len)?,
            widened: false,
        });
    }

    match policy {
        FitPolicy::Strict => Err(Error::RangeTooSmall {
            range_len,
            data_len,
        }),
        FitPolicy::Widen => {
            let range = exact(data_len)?;
            log::warn!(
                "selected range {} holds {} bytes, widening to {} for {} bytes of data",
                resolved.range,
                range_len,
                range,
                data_len
            );
            Ok(WriteRange {
                range,
                widened: true,
            })
        }
    }
}

/// What to erase
///
/// A selector without an end erases exactly one unit.
pub fn resolve_erase(selection: &AddressSelection, geometry: &FlashGeometry) -> Result<EraseTarget> {
    let resolved = selection.resolve(geometry)?.ok_or(Error::MissingAddress)?;
    Ok(match resolved.kind {
        UnitKind::Chip => EraseTarget::Chip,
        _ => EraseTarget::Range(resolved.range),
    })
}
