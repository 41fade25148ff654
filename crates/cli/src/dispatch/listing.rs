//! Device listing, enumeration, and informational commands

use common::{
    DeviceDriver, DeviceOptions, Enumeration, NvmeDevice, Result, collect_visitor, print_visitor,
};

/// Scan for devices and render the collected listing once
pub fn list(driver: &dyn DeviceDriver, filter: Option<&str>, opts: &DeviceOptions) -> Result<()> {
    let mut listing = Enumeration::with_capacity(100);
    driver.enumerate(filter, opts, &mut |dev| collect_visitor(&mut listing, dev))?;
    println!("{listing}");
    Ok(())
}

/// Scan for devices, rendering each identity as it is visited
pub fn enumerate(
    driver: &dyn DeviceDriver,
    filter: Option<&str>,
    opts: &DeviceOptions,
) -> Result<()> {
    print!("devices:");
    let mut count = 0u32;
    driver.enumerate(filter, opts, &mut |dev| print_visitor(&mut count, dev))?;
    if count == 0 {
        println!(" ~");
    }
    Ok(())
}

/// Print identity and capabilities of one open device
pub fn info(dev: &dyn NvmeDevice) -> Result<()> {
    let caps = dev.caps();
    println!("device:");
    println!("  ident: {{{}}}", dev.ident());
    println!("  caps: {{elpe: {}, nruh: {}}}", caps.elpe, caps.nruh);
    Ok(())
}

/// Print tool and backend information
pub fn library_info() -> Result<()> {
    println!("nvmectl {}", env!("CARGO_PKG_VERSION"));
    println!("backends:");
    for name in crate::backend::backend_names() {
        println!("  - {name}");
    }
    Ok(())
}
