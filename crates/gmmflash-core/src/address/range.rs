//! Inclusive byte ranges

use core::fmt;

use crate::error::{Error, Result};

/// Inclusive byte range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte
    pub start: u32,
    /// Last byte (inclusive)
    pub end: u32,
}

impl ByteRange {
    /// Create a range without checking it
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Check ordering and chip bounds
    pub fn validate(self, chip_size: u32) -> Result<Self> {
        if self.end < self.start {
            return Err(Error::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.end >= chip_size {
            return Err(Error::OutOfRange {
                end: self.end,
                chip_size,
            });
        }
        Ok(self)
    }

    /// Number of bytes covered
    pub const fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Always false; a range covers at least one byte
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06X}-0x{:06X}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_last_byte() {
        let range = ByteRange::new(0, 0xFFFF).validate(0x10000).unwrap();
        assert_eq!(range.len(), 0x10000);
    }

    #[test]
    fn test_validate_rejects_end_at_chip_size() {
        let size = 4 * 1024 * 1024;
        assert_eq!(
            ByteRange::new(size - 1, size).validate(size),
            Err(Error::OutOfRange {
                end: size,
                chip_size: size
            })
        );
    }

    #[test]
    fn test_validate_rejects_reversed() {
        assert_eq!(
            ByteRange::new(0x2000, 0x1FFF).validate(0x10000),
            Err(Error::InvalidRange {
                start: 0x2000,
                end: 0x1FFF
            })
        );
    }
}
