//! Selector syntax: `N`, `N,M` or `N,+K`

use core::str::FromStr;

use super::range::ByteRange;
use crate::error::{Error, Result};

/// How a selector ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorEnd {
    /// `N` - exactly one unit
    Single,
    /// `N,M` - through unit `M` (inclusive)
    Through(u32),
    /// `N,+K` - `K` units starting at `N`
    Count(u32),
}

/// A unit index or index range as typed by the user
///
/// Numbers are decimal or `0x`-prefixed hexadecimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSelector {
    /// First unit index
    pub start: u32,
    /// Where the selection ends
    pub end: SelectorEnd,
}

/// Parse a string as a hex or decimal u32
fn parse_number(s: &str) -> Result<u32> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse::<u32>()
    };
    parsed.map_err(|_| Error::InvalidSelector)
}

impl FromStr for UnitSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = match s.split_once(',') {
            None => (parse_number(s)?, SelectorEnd::Single),
            Some((start, rest)) => {
                let start = parse_number(start)?;
                let rest = rest.trim();
                let end = match rest.strip_prefix('+') {
                    Some(count) => match parse_number(count)? {
                        0 => return Err(Error::InvalidSelector),
                        k => SelectorEnd::Count(k),
                    },
                    None => SelectorEnd::Through(parse_number(rest)?),
                };
                (start, end)
            }
        };
        Ok(Self { start, end })
    }
}

impl UnitSelector {
    /// Single unit `index`
    pub const fn single(index: u32) -> Self {
        Self {
            start: index,
            end: SelectorEnd::Single,
        }
    }

    /// True if the user gave an end (`N,M` or `N,+K`)
    pub const fn has_end(&self) -> bool {
        !matches!(self.end, SelectorEnd::Single)
    }

    /// Resolve to bytes for units of `unit_size` and check against the chip
    ///
    /// `[N*unit, (M+1)*unit - 1]`, where `M = N+K-1` for the count form and
    /// `M = N` for a bare index.
    pub fn resolve(&self, unit_size: u32, chip_size: u32) -> Result<ByteRange> {
        let unit = unit_size as u64;
        let last = match self.end {
            SelectorEnd::Single => self.start as u64,
            SelectorEnd::Through(m) => m as u64,
            SelectorEnd::Count(k) => self.start as u64 + k as u64 - 1,
        };

        let start = self.start as u64 * unit;
        let end = (last + 1) * unit - 1;

        let to_addr = |v: u64| {
            u32::try_from(v).map_err(|_| Error::OutOfRange {
                end: u32::MAX,
                chip_size,
            })
        };
        ByteRange::new(to_addr(start)?, to_addr(end)?).validate(chip_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHIP: u32 = 16 * 1024 * 1024;

    fn sel(s: &str) -> UnitSelector {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(sel("7"), UnitSelector::single(7));
        assert_eq!(
            sel("2,5"),
            UnitSelector {
                start: 2,
                end: SelectorEnd::Through(5)
            }
        );
        assert_eq!(
            sel("0, +4"),
            UnitSelector {
                start: 0,
                end: SelectorEnd::Count(4)
            }
        );
        assert_eq!(
            sel("0x100,0x1FF"),
            UnitSelector {
                start: 0x100,
                end: SelectorEnd::Through(0x1FF)
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "x", "1,", ",2", "1,+0", "1,+", "1,2,3", "-1", "0xZZ"] {
            assert_eq!(
                bad.parse::<UnitSelector>(),
                Err(Error::InvalidSelector),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_resolve_page_range() {
        assert_eq!(
            sel("2,5").resolve(256, CHIP).unwrap(),
            ByteRange::new(512, 1535)
        );
    }

    #[test]
    fn test_resolve_sector_count() {
        assert_eq!(
            sel("0,+4").resolve(4096, CHIP).unwrap(),
            ByteRange::new(0, 16383)
        );
    }

    #[test]
    fn test_resolve_single_unit() {
        assert_eq!(
            sel("3").resolve(65536, CHIP).unwrap(),
            ByteRange::new(0x30000, 0x3FFFF)
        );
        assert_eq!(
            sel("0x1234").resolve(1, CHIP).unwrap(),
            ByteRange::new(0x1234, 0x1234)
        );
    }

    #[test]
    fn test_resolve_reversed_is_range_error() {
        assert!(matches!(
            sel("5,2").resolve(256, CHIP),
            Err(Error::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_resolve_past_chip_end() {
        // Block 256 of a 16 MiB chip starts exactly at the chip size
        assert_eq!(
            sel("255,256").resolve(65536, CHIP),
            Err(Error::OutOfRange {
                end: CHIP + 65535,
                chip_size: CHIP
            })
        );
        // Overflows u32 entirely
        assert!(matches!(
            sel("0xFFFFFFFF").resolve(65536, CHIP),
            Err(Error::OutOfRange { .. })
        ));
    }
}
