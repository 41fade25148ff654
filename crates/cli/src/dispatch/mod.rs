//! Command dispatch
//!
//! One module per command family. Every dispatch walks the same pipeline:
//! validate arguments, size the result buffer, acquire it, build the
//! descriptor, submit, evaluate the completion, then present and optionally
//! export. Buffers are released on every exit path.

pub mod admin;
pub mod dsm;
pub mod fdp;
pub mod feature;
pub mod identify;
pub mod listing;
pub mod log;
pub mod pass;

use std::path::Path;

use common::{Error, Result, TransferBuffer};
use protocol::CompletionRecord;
use tracing::{error, info};

/// Shared completion evaluation
///
/// Maps a fault into the error taxonomy and dumps the full completion record
/// for operator diagnosis. Success hands the record back so callers can
/// decode result dwords.
pub(crate) fn check(transport: i32, completion: CompletionRecord) -> Result<CompletionRecord> {
    match protocol::evaluate(transport, &completion) {
        Ok(()) => Ok(completion),
        Err(fault) => {
            error!("command failed: {completion}");
            Err(Error::from_fault(fault, completion))
        }
    }
}

/// Export the raw result buffer when an output path was supplied
pub(crate) fn export_if_requested(buf: &TransferBuffer, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        info!("dumping to '{}'", path.display());
        buf.export(path)?;
    }
    Ok(())
}
