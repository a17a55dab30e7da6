//! Write command implementation

use std::error::Error;
use std::path::Path;

use gmmflash_core::address::{resolve_write, AddressSelection, FitPolicy};
use gmmflash_core::flash::Mode;

use super::progress::IndicatifProgress;
use super::{read_input, require_address, Context};

/// Program `input` at the selected address
///
/// The flash must already be erased; no erase is issued here.
pub fn run_write(
    ctx: &Context,
    input: &Path,
    selection: &AddressSelection,
    strict_range: bool,
    verify: bool,
) -> Result<(), Box<dyn Error>> {
    require_address(selection)?;
    let data = read_input(input)?;

    let mut session = ctx.open()?;
    let policy = if strict_range {
        FitPolicy::Strict
    } else {
        FitPolicy::Widen
    };
    let target = resolve_write(selection, session.geometry(), data.len() as u32, policy)?;
    if target.widened {
        println!("Range widened to {} to fit {} bytes", target.range, data.len());
    }

    let mut progress = IndicatifProgress::new();
    session.write(target.range.start, &data, &mut progress)?;
    println!("Wrote {} bytes ({})", data.len(), target.range);

    if verify {
        if session.options().mode == Mode::Normal {
            session.verify(target.range.start, &data, &mut progress)?;
            println!("Verify OK");
        } else {
            log::info!("verify skipped: nothing was programmed");
        }
    }
    Ok(())
}
