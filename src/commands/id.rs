//! Identification command

use std::error::Error;

use super::Context;

/// Print identifiers and geometry of the attached device
pub fn run_id(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let session = ctx.open()?;
    let device = session.device();
    let geo = &device.geometry;

    println!("JEDEC ID: {}", device.id.jedec);
    println!("UID: {}", device.id.uid);
    println!("Device: {} {}", device.vendor, device.name);
    println!(
        "Size: {} bytes ({} KiB), page {} bytes, sector {} bytes, blocks {}/{} bytes",
        geo.chip_size,
        geo.chip_size / 1024,
        geo.page_size,
        geo.sector_size,
        geo.block32_size,
        geo.block64_size
    );
    Ok(())
}
