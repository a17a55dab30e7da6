//! Address-unit resolution
//!
//! Users pick a region with exactly one unit kind (whole chip, byte address,
//! page, sector, 32 KiB block or 64 KiB block) and a selector `N`, `N,M` or
//! `N,+K`. This module turns that choice into an inclusive byte range that
//! has been checked against the chip size.

mod range;
mod resolve;
mod selector;
mod unit;

pub use range::ByteRange;
pub use resolve::*;
pub use selector::{SelectorEnd, UnitSelector};
pub use unit::{UnitKind, UnitKinds};
