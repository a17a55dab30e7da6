//! Verify command implementation

use std::error::Error;
use std::path::Path;

use gmmflash_core::address::{resolve_write, AddressSelection, FitPolicy};

use super::progress::IndicatifProgress;
use super::{read_input, require_address, Context};

/// Compare flash contents at the selected address with `input`
///
/// The compared range is the one `write` would program for the same file.
pub fn run_verify(
    ctx: &Context,
    input: &Path,
    selection: &AddressSelection,
) -> Result<(), Box<dyn Error>> {
    require_address(selection)?;
    let data = read_input(input)?;

    let mut session = ctx.open()?;
    let target = resolve_write(
        selection,
        session.geometry(),
        data.len() as u32,
        FitPolicy::Widen,
    )?;

    let mut progress = IndicatifProgress::new();
    session.verify(target.range.start, &data, &mut progress)?;
    println!("Verify OK: {} matches {}", target.range, input.display());
    Ok(())
}
