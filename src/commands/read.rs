//! Read command implementation

use std::error::Error;
use std::fs;
use std::path::Path;

use gmmflash_core::address::{resolve_read, AddressSelection};

use super::progress::IndicatifProgress;
use super::{require_address, CliError, Context};

/// Read the selected range into `output`
pub fn run_read(
    ctx: &Context,
    output: &Path,
    selection: &AddressSelection,
) -> Result<(), Box<dyn Error>> {
    require_address(selection)?;
    let mut session = ctx.open()?;
    let range = resolve_read(selection, session.geometry())?;

    let mut data = vec![0u8; range.len() as usize];
    let mut progress = IndicatifProgress::new();
    session.read(range.start, &mut data, &mut progress)?;

    fs::write(output, &data).map_err(|source| CliError::Output {
        path: output.to_path_buf(),
        source,
    })?;
    println!("Read {} bytes ({}) to {}", data.len(), range, output.display());
    Ok(())
}
