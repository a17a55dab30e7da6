//! Bitstream load command

use std::error::Error;
use std::path::Path;

use gmmflash_core::flash::load_bitstream;

use super::progress::IndicatifProgress;
use super::{read_input, Context};

/// Stream `input` to the bridge with chip-select held
///
/// The target is not identified first; it need not be a flash part.
pub fn run_load(ctx: &Context, input: &Path) -> Result<(), Box<dyn Error>> {
    let data = read_input(input)?;
    let mut channel = ctx.channel()?;

    let mut progress = IndicatifProgress::new();
    load_bitstream(&mut channel, ctx.options.mode, &data, &mut progress)?;
    println!("Loaded {} bytes from {}", data.len(), input.display());
    Ok(())
}
