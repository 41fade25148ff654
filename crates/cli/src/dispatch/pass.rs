//! Raw passthrough dispatches
//!
//! The descriptor is not built field by field; it is loaded wholesale from a
//! file. This layer only validates sizes, fills the optional data and
//! metadata buffers from their own sources, and selects the admin or I/O
//! submission path.

use std::path::PathBuf;

use clap::Args;
use common::{NvmeDevice, Result, TransferBuffer, read_exact_from};
use protocol::CommandDescriptor;
use tracing::info;

use crate::render;

use super::{check, export_if_requested};

#[derive(Args, Debug, Default)]
pub struct PassArgs {
    /// Read the 64-byte command descriptor from this path
    #[arg(long = "cmd-input")]
    pub cmd_input: PathBuf,

    /// Read the data buffer content from this path
    #[arg(long = "data-input")]
    pub data_input: Option<PathBuf>,

    /// Write the data buffer to this path after completion
    #[arg(long = "data-output")]
    pub data_output: Option<PathBuf>,

    /// Data buffer size in bytes; 0 means no data buffer
    #[arg(long = "data-nbytes", default_value_t = 0)]
    pub data_nbytes: u32,

    /// Read the metadata buffer content from this path
    #[arg(long = "meta-input")]
    pub meta_input: Option<PathBuf>,

    /// Write the metadata buffer to this path after completion
    #[arg(long = "meta-output")]
    pub meta_output: Option<PathBuf>,

    /// Metadata buffer size in bytes; 0 means no metadata buffer
    #[arg(long = "meta-nbytes", default_value_t = 0)]
    pub meta_nbytes: u32,

    /// Print the loaded descriptor before submission
    #[arg(short, long)]
    pub verbose: bool,
}

fn acquire_filled(
    dev: &mut dyn NvmeDevice,
    nbytes: u32,
    input: Option<&PathBuf>,
) -> Result<TransferBuffer> {
    let mut buf = TransferBuffer::acquire(dev, nbytes as usize)?;
    if let Some(path) = input {
        info!("reading buffer content from '{}'", path.display());
        buf.fill(path)?;
    }
    Ok(buf)
}

/// Pass a user-defined command through, admin or I/O
pub fn pass(dev: &mut dyn NvmeDevice, args: &PassArgs, admin: bool) -> Result<()> {
    // a partially loaded descriptor must never be submitted
    let raw = read_exact_from(&args.cmd_input, CommandDescriptor::SIZE)?;
    let cmd = CommandDescriptor::from_bytes(&raw)?;

    let mut data = acquire_filled(dev, args.data_nbytes, args.data_input.as_ref())?;
    let mut meta = acquire_filled(dev, args.meta_nbytes, args.meta_input.as_ref())?;

    if args.verbose {
        render::descriptor(&cmd);
    }

    let (transport, cpl) = if admin {
        dev.submit_admin(&cmd, data.as_mut_opt(), meta.as_mut_opt())
    } else {
        dev.submit_io(&cmd, data.as_mut_opt(), meta.as_mut_opt())
    };
    check(transport, cpl)?;

    export_if_requested(&data, args.data_output.as_deref())?;
    export_if_requested(&meta, args.meta_output.as_deref())?;

    data.release();
    meta.release();
    Ok(())
}
