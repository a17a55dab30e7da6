//! Erase command implementation

use std::error::Error;

use gmmflash_core::address::{resolve_erase, AddressSelection, EraseTarget};

use super::progress::IndicatifProgress;
use super::{require_address, Context};

/// Erase the selected units
pub fn run_erase(ctx: &Context, selection: &AddressSelection) -> Result<(), Box<dyn Error>> {
    require_address(selection)?;
    let mut session = ctx.open()?;
    let target = resolve_erase(selection, session.geometry())?;

    let mut progress = IndicatifProgress::new();
    session.erase(target, &mut progress)?;
    match target {
        EraseTarget::Chip => println!("Chip erased"),
        EraseTarget::Range(range) => println!("Erased {}", range),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_util;
    use gmmflash_core::address::{UnitKind, UnitKinds};

    #[test]
    fn test_erase_out_of_range() {
        // The 16 MiB mock part has 4096 sectors
        let sel = AddressSelection::of(UnitKind::Sector, "4095,+2".parse().unwrap());
        let err = run_erase(&test_util::no_hw(), &sel).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<gmmflash_core::Error>(),
            Some(gmmflash_core::Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_erase_ambiguous() {
        let mut sel = AddressSelection::whole_chip();
        sel.block64 = Some("0".parse().unwrap());
        let err = run_erase(&test_util::no_hw(), &sel).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<gmmflash_core::Error>(),
            Some(gmmflash_core::Error::AmbiguousUnit(_))
        ));
    }

    #[test]
    fn test_conflicting_units_rejected_before_opening_port() {
        let mut sel = AddressSelection::whole_chip();
        sel.sector = Some("1".parse().unwrap());
        let err = run_erase(&test_util::unreachable_port(), &sel).unwrap_err();
        assert_eq!(
            err.downcast_ref::<gmmflash_core::Error>(),
            Some(&gmmflash_core::Error::AmbiguousUnit(
                UnitKinds::CHIP | UnitKinds::SECTOR
            ))
        );
        assert_eq!(crate::exit_code(err.as_ref()), 1);
    }

    #[test]
    fn test_missing_address_rejected_before_opening_port() {
        let err = run_erase(&test_util::unreachable_port(), &AddressSelection::default())
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<gmmflash_core::Error>(),
            Some(&gmmflash_core::Error::MissingAddress)
        );
    }

    #[test]
    fn test_erase_chip_without_hardware() {
        run_erase(&test_util::no_hw(), &AddressSelection::whole_chip()).unwrap();
    }
}
