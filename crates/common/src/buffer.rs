//! Transfer-buffer lifecycle
//!
//! One [`TransferBuffer`] is acquired per dispatch, immediately before
//! submission, and released unconditionally afterwards. Zero-size requests
//! never allocate; fill/export on a zero-size buffer are skipped, not errors.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::device::NvmeDevice;
use crate::error::{Error, Result};

/// A device-addressable transfer buffer
///
/// Release is idempotent and also runs on drop, so every exit path of a
/// dispatch gives the memory back.
#[derive(Debug, Default)]
pub struct TransferBuffer {
    data: Option<Vec<u8>>,
}

impl TransferBuffer {
    /// A buffer with no backing allocation
    pub fn empty() -> Self {
        Self { data: None }
    }

    /// Acquire a zero-filled buffer of `nbytes` from the device
    ///
    /// A request of 0 bytes returns an empty buffer without touching the
    /// allocator.
    pub fn acquire(dev: &mut dyn NvmeDevice, nbytes: usize) -> Result<Self> {
        if nbytes == 0 {
            return Ok(Self::empty());
        }
        debug!(nbytes, "allocating transfer buffer");
        let data = dev
            .buf_alloc(nbytes)
            .map_err(|e| Error::Allocation(format!("{nbytes} bytes: {e}")))?;
        Ok(Self { data: Some(data) })
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the contents; empty slice when never allocated
    pub fn as_slice(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// Mutable borrow for submission; `None` when never allocated
    pub fn as_mut_opt(&mut self) -> Option<&mut [u8]> {
        self.data.as_deref_mut()
    }

    /// Copy exactly `len` bytes from `path` into the buffer
    ///
    /// Fails with an IO error if the source holds fewer bytes. No-op on a
    /// zero-size buffer.
    pub fn fill(&mut self, path: &Path) -> Result<()> {
        let Some(data) = self.data.as_deref_mut() else {
            return Ok(());
        };
        let mut file = File::open(path)?;
        file.read_exact(data)?;
        Ok(())
    }

    /// Write exactly `len` bytes verbatim to `path`
    ///
    /// No-op on a zero-size buffer.
    pub fn export(&self, path: &Path) -> Result<()> {
        let Some(data) = self.data.as_deref() else {
            return Ok(());
        };
        let mut file = File::create(path)?;
        file.write_all(data)?;
        Ok(())
    }

    /// Give the memory back; safe to call repeatedly or on an empty buffer
    pub fn release(&mut self) {
        self.data = None;
    }
}

/// Read exactly `nbytes` from `path` into a fresh vector
///
/// Shared by passthrough descriptor loading and payload fills that happen
/// before a device buffer exists.
pub fn read_exact_from(path: &Path, nbytes: usize) -> Result<Vec<u8>> {
    let mut raw = vec![0u8; nbytes];
    let mut file = File::open(path)?;
    file.read_exact(&mut raw)?;
    Ok(raw)
}
