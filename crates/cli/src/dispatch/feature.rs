//! Get/set-features dispatches
//!
//! Get-features may run with or without a data buffer; the returned feature
//! value always rides in completion dword 0 and is decoded either way.
//! Set-features with an external payload requires an explicit byte count
//! before anything is allocated.

use std::path::PathBuf;

use clap::Args;
use common::{Error, NvmeDevice, Result, TransferBuffer, resolve_nsid};
use protocol::{CommandFields, FeatureValue, decode_fdp_events};
use tracing::info;

use super::{check, export_if_requested};

#[derive(Args, Debug, Default)]
pub struct GetFeatureArgs {
    /// Feature identifier
    #[arg(long)]
    pub fid: u8,

    /// Select which value of the feature to return
    #[arg(long, default_value_t = 0)]
    pub sel: u8,

    /// Namespace identifier; defaults to the device's namespace
    #[arg(long)]
    pub nsid: Option<u32>,

    /// Command dword 11, feature specific
    #[arg(long, default_value_t = 0)]
    pub cdw11: u32,

    /// Data transfer size; 0 means no data buffer
    #[arg(long = "data-nbytes", default_value_t = 0)]
    pub data_nbytes: u32,

    /// Write the raw feature payload to this path
    #[arg(short = 'o', long = "data-output")]
    pub data_output: Option<PathBuf>,
}

/// Execute a get-features command
pub fn get_feature(dev: &mut dyn NvmeDevice, args: &GetFeatureArgs) -> Result<()> {
    let nsid = resolve_nsid(dev, args.nsid);

    // the data buffer is optional for get-features
    let mut buf = TransferBuffer::acquire(dev, args.data_nbytes as usize)?;

    info!(
        "get-features: {{nsid: 0x{:x}, fid: 0x{:x}, sel: 0x{:x}}}",
        nsid, args.fid, args.sel
    );

    let cmd = CommandFields::GetFeatures {
        fid: args.fid,
        sel: args.sel,
        cdw11: args.cdw11,
    }
    .build(nsid);

    let (transport, cpl) = dev.submit_admin(&cmd, buf.as_mut_opt(), None);
    let cpl = check(transport, cpl)?;

    let value = FeatureValue(cpl.cdw0);
    println!("{value}");

    for event in decode_fdp_events(args.fid, value, buf.as_slice()) {
        println!(
            "  - {{event_type: 0x{:02x}, enabled: {}}}",
            event.event_type, event.enabled
        );
    }

    export_if_requested(&buf, args.data_output.as_deref())?;
    buf.release();
    Ok(())
}

#[derive(Args, Debug, Default)]
pub struct SetFeatureArgs {
    /// Feature identifier
    #[arg(long)]
    pub fid: u8,

    /// Feature value (command dword 11)
    #[arg(long)]
    pub feat: u32,

    /// Save the value across power states
    #[arg(long)]
    pub save: bool,

    /// Namespace identifier; defaults to the device's namespace
    #[arg(long)]
    pub nsid: Option<u32>,

    /// Command dword 12, feature specific
    #[arg(long, default_value_t = 0)]
    pub cdw12: u32,

    /// Read the feature payload from this path
    #[arg(long = "data-input")]
    pub data_input: Option<PathBuf>,

    /// Payload size; required whenever --data-input is given
    #[arg(long = "data-nbytes")]
    pub data_nbytes: Option<u32>,
}

/// Execute a set-features command
pub fn set_feature(dev: &mut dyn NvmeDevice, args: &SetFeatureArgs) -> Result<()> {
    let nsid = resolve_nsid(dev, args.nsid);

    let mut buf = if let Some(input) = &args.data_input {
        let nbytes = match args.data_nbytes {
            Some(n) if n > 0 => n as usize,
            _ => {
                return Err(Error::InvalidArgument(
                    "--data-nbytes is required with --data-input".into(),
                ));
            }
        };
        let mut buf = TransferBuffer::acquire(dev, nbytes)?;
        buf.fill(input)?;
        buf
    } else {
        TransferBuffer::empty()
    };

    info!(
        "set-features: {{nsid: 0x{:x}, fid: 0x{:x}, save: {}, feat: 0x{:x}, cdw12: 0x{:x}}}",
        nsid, args.fid, args.save, args.feat, args.cdw12
    );

    let cmd = CommandFields::SetFeatures {
        fid: args.fid,
        value: args.feat,
        save: args.save,
        cdw12: args.cdw12,
    }
    .build(nsid);

    let (transport, cpl) = dev.submit_admin(&cmd, buf.as_mut_opt(), None);
    check(transport, cpl)?;

    buf.release();
    Ok(())
}
