//! Common utilities for nvmectl
//!
//! This crate provides the shared machinery between the CLI and device
//! backends: the device-access traits, transfer-buffer lifecycle, device
//! enumeration collection, error taxonomy, and logging setup.

pub mod buffer;
pub mod device;
pub mod enumerate;
pub mod error;
pub mod logging;
pub mod test_utils;

pub use buffer::{TransferBuffer, read_exact_from};
pub use device::{
    ControllerCaps, DeviceDriver, DeviceIdent, DeviceOptions, NvmeDevice, Visit, open_failed,
    resolve_nsid,
};
pub use enumerate::{Enumeration, collect_visitor, print_visitor};
pub use error::{Error, Result};
pub use logging::setup_logging;
