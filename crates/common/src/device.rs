//! Device-access seam
//!
//! The dispatch layer talks to storage devices exclusively through the
//! [`NvmeDevice`] and [`DeviceDriver`] traits. Backends (Linux ioctl, test
//! mocks) live behind this seam; everything above it is platform-neutral.
//!
//! Submission is blocking and unbounded: a submitted command runs to its own
//! completion or transport error before control returns. Any timeout policy
//! belongs to the backend.

use std::fmt;

use protocol::{CommandDescriptor, CompletionRecord};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Immutable identity snapshot of one discovered device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdent {
    /// Device URI as given by the operator or discovery
    pub uri: String,
    /// Model number string
    pub model: String,
    /// Serial number string
    pub serial: String,
    /// Firmware revision string
    pub firmware: String,
    /// Default namespace id carried by the open handle
    pub nsid: u32,
}

impl fmt::Display for DeviceIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uri: '{}', model: '{}', serial: '{}', fw: '{}', nsid: 0x{:x}",
            self.uri, self.model, self.serial, self.firmware, self.nsid
        )
    }
}

/// Controller capabilities readable from an open handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerCaps {
    /// Error-log-page-entries bound; zero-based, a value of N means N+1
    /// entries are supported.
    pub elpe: u8,
    /// Number of reclaim unit handles
    pub nruh: u16,
}

/// Options applied when opening or enumerating devices
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceOptions {
    /// Backend to use; `None` selects the platform default
    #[serde(default)]
    pub backend: Option<String>,
}

/// Signal returned by an enumeration visitor to the discovery driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Close this device and continue scanning
    CloseDevice,
    /// Leave the device open; the visitor took ownership
    KeepOpen,
}

/// One open storage device
pub trait NvmeDevice {
    /// Identity of the open device
    fn ident(&self) -> &DeviceIdent;

    /// Namespace id implicitly associated with this handle
    fn default_nsid(&self) -> u32 {
        self.ident().nsid
    }

    /// Controller capabilities
    fn caps(&self) -> ControllerCaps;

    /// Allocate device-addressable memory of `nbytes`, zero-filled
    fn buf_alloc(&mut self, nbytes: usize) -> Result<Vec<u8>> {
        Ok(vec![0u8; nbytes])
    }

    /// Submit an admin command, blocking until completion
    ///
    /// Returns the raw transport result (0 on success, typically a negated
    /// errno otherwise) together with the device-reported completion record.
    fn submit_admin(
        &mut self,
        cmd: &CommandDescriptor,
        data: Option<&mut [u8]>,
        meta: Option<&mut [u8]>,
    ) -> (i32, CompletionRecord);

    /// Submit an I/O command, same shape as [`submit_admin`]
    ///
    /// [`submit_admin`]: NvmeDevice::submit_admin
    fn submit_io(
        &mut self,
        cmd: &CommandDescriptor,
        data: Option<&mut [u8]>,
        meta: Option<&mut [u8]>,
    ) -> (i32, CompletionRecord);
}

/// Device discovery and opening
pub trait DeviceDriver {
    /// Open the device addressed by `uri`
    fn open(&self, uri: &str, opts: &DeviceOptions) -> Result<Box<dyn NvmeDevice>>;

    /// Visit every device matched by `filter`, once per device
    ///
    /// The visitor's return value tells the driver whether to close the
    /// device before moving on.
    fn enumerate(
        &self,
        filter: Option<&str>,
        opts: &DeviceOptions,
        visit: &mut dyn FnMut(&mut dyn NvmeDevice) -> Visit,
    ) -> Result<()>;
}

/// Resolve the effective namespace id for a command
///
/// An explicit value is used verbatim, including 0; otherwise the default
/// namespace of the open handle is substituted. Applied once per dispatch,
/// before any descriptor is built.
pub fn resolve_nsid(dev: &dyn NvmeDevice, explicit: Option<u32>) -> u32 {
    explicit.unwrap_or_else(|| dev.default_nsid())
}

/// Open a device, mapping backend failures into the shared taxonomy
pub fn open_failed(uri: &str, detail: impl fmt::Display) -> Error {
    Error::Backend(format!("failed to open '{uri}': {detail}"))
}
