//! Device backends
//!
//! Selects the platform driver implementing the device-access traits. Only
//! the Linux ioctl backend exists today; other platforms get a backend
//! error at open/enumerate time.

#[cfg(target_os = "linux")]
pub mod linux;

use common::{DeviceDriver, DeviceOptions, Error, NvmeDevice, Result};

/// Names of the backends compiled into this binary
pub fn backend_names() -> &'static [&'static str] {
    #[cfg(target_os = "linux")]
    {
        &["linux"]
    }
    #[cfg(not(target_os = "linux"))]
    {
        &[]
    }
}

/// The platform discovery driver
pub fn driver(opts: &DeviceOptions) -> Result<Box<dyn DeviceDriver>> {
    if let Some(name) = opts.backend.as_deref() {
        if !backend_names().contains(&name) {
            return Err(Error::Backend(format!("unknown backend '{name}'")));
        }
    }

    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::LinuxDriver))
    }
    #[cfg(not(target_os = "linux"))]
    {
        Err(Error::Backend(
            "no device backend available on this platform".into(),
        ))
    }
}

/// Open the device addressed by `uri` with the platform driver
pub fn open(uri: &str, opts: &DeviceOptions) -> Result<Box<dyn NvmeDevice>> {
    driver(opts)?.open(uri, opts)
}
