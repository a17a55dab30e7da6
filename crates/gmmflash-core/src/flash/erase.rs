//! Greedy erase planning

use crate::address::{ByteRange, UnitKind};
use crate::chip::FlashGeometry;
use crate::spi::opcodes;

/// One erase command of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraseStep {
    /// Erase granularity (sector, 32 KiB or 64 KiB block)
    pub kind: UnitKind,
    /// First byte erased
    pub addr: u32,
    /// Bytes erased
    pub size: u32,
}

impl EraseStep {
    /// Opcode that performs this step
    pub fn opcode(&self) -> u8 {
        match self.kind {
            UnitKind::Block64 => opcodes::BE_D8,
            UnitKind::Block32 => opcodes::BE_52,
            _ => opcodes::SE_20,
        }
    }
}

/// Erase commands covering a byte range
///
/// The range is widened to whole sectors. From the cursor the plan takes a
/// 64 KiB block if one is aligned there and fits before the end, else a
/// 32 KiB block under the same rule, else one sector. This is a local
/// greedy choice and the exact command sequence is part of the contract.
#[derive(Debug, Clone)]
pub struct ErasePlan {
    geometry: FlashGeometry,
    start: u32,
    // Exclusive; u64 so a range ending at 16 MiB cannot overflow
    end: u64,
    cursor: u64,
}

impl ErasePlan {
    /// Plan the erase of `range`
    pub fn new(range: ByteRange, geometry: &FlashGeometry) -> Self {
        let sector = geometry.sector_size;
        let start = range.start - range.start % sector;
        let end = (range.end / sector + 1) as u64 * sector as u64;
        Self {
            geometry: *geometry,
            start,
            end,
            cursor: start as u64,
        }
    }

    /// The sector-aligned range this plan erases
    pub fn range(&self) -> ByteRange {
        ByteRange::new(self.start, (self.end - 1) as u32)
    }

    fn fits(&self, size: u32) -> bool {
        let size = size as u64;
        self.cursor % size == 0 && self.cursor + size <= self.end
    }
}

impl Iterator for ErasePlan {
    type Item = EraseStep;

    fn next(&mut self) -> Option<EraseStep> {
        if self.cursor >= self.end {
            return None;
        }

        let geo = &self.geometry;
        let (kind, size) = if self.fits(geo.block64_size) {
            (UnitKind::Block64, geo.block64_size)
        } else if self.fits(geo.block32_size) {
            (UnitKind::Block32, geo.block32_size)
        } else {
            (UnitKind::Sector, geo.sector_size)
        };

        let step = EraseStep {
            kind,
            addr: self.cursor as u32,
            size,
        };
        self.cursor += size as u64;
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    const GEO: FlashGeometry = FlashGeometry::with_chip_size(16 * 1024 * 1024);

    fn plan(start: u32, end: u32) -> Vec<(UnitKind, u32)> {
        ErasePlan::new(ByteRange::new(start, end), &GEO)
            .map(|s| (s.kind, s.addr))
            .collect()
    }

    #[test]
    fn test_one_block64() {
        assert_eq!(plan(0, 65535), [(UnitKind::Block64, 0)]);
    }

    #[test]
    fn test_unaligned_start_descends() {
        let steps = plan(4096, 69631);
        let mut expected: Vec<(UnitKind, u32)> = (1..8)
            .map(|i| (UnitKind::Sector, i * 4096))
            .collect();
        expected.push((UnitKind::Block32, 32768));
        expected.push((UnitKind::Sector, 65536));
        assert_eq!(steps, expected);
    }

    #[test]
    fn test_bounds_rounded_to_sectors() {
        let p = ErasePlan::new(ByteRange::new(5000, 5001), &GEO);
        assert_eq!(p.range(), ByteRange::new(4096, 8191));
        assert_eq!(p.collect::<Vec<_>>().len(), 1);
    }

    #[test]
    fn test_whole_chip_range_uses_block64() {
        let steps = plan(0, GEO.chip_size - 1);
        assert_eq!(steps.len(), 256);
        assert!(steps.iter().all(|(k, _)| *k == UnitKind::Block64));
    }

    #[test]
    fn test_block32_at_tail() {
        assert_eq!(
            plan(0x10000, 0x27FFF),
            [(UnitKind::Block64, 0x10000), (UnitKind::Block32, 0x20000)]
        );
    }

    #[test]
    fn test_steps_are_contiguous() {
        let p = ErasePlan::new(ByteRange::new(0x1234, 0x5_4321), &GEO);
        let range = p.range();
        let mut next = range.start;
        for step in p {
            assert_eq!(step.addr, next);
            assert_eq!(step.addr % step.size, 0);
            next += step.size;
        }
        assert_eq!(next, range.end + 1);
    }

    #[test]
    fn test_step_opcodes() {
        let step = |kind| EraseStep {
            kind,
            addr: 0,
            size: 0,
        };
        assert_eq!(step(UnitKind::Sector).opcode(), 0x20);
        assert_eq!(step(UnitKind::Block32).opcode(), 0x52);
        assert_eq!(step(UnitKind::Block64).opcode(), 0xD8);
    }
}
