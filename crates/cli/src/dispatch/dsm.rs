//! Dataset-management dispatch
//!
//! Exactly one range descriptor per invocation; the range table is the only
//! data transfer.

use clap::Args;
use common::{NvmeDevice, Result, TransferBuffer, resolve_nsid};
use protocol::{CommandFields, DsmRange};
use tracing::info;

use super::check;

#[derive(Args, Debug, Default)]
pub struct DsmArgs {
    /// Namespace identifier; defaults to the device's namespace
    #[arg(long)]
    pub nsid: Option<u32>,

    /// Starting LBA of the range
    #[arg(long)]
    pub slba: u64,

    /// Number of logical blocks in the range
    #[arg(long)]
    pub nlb: u32,

    /// Attribute: deallocate
    #[arg(long)]
    pub ad: bool,

    /// Attribute: integral dataset for write
    #[arg(long)]
    pub idw: bool,

    /// Attribute: integral dataset for read
    #[arg(long)]
    pub idr: bool,
}

/// Execute a dataset-management command with a single range
pub fn dsm(dev: &mut dyn NvmeDevice, args: &DsmArgs) -> Result<()> {
    // one range per invocation
    let nr: u32 = 1;
    let nsid = resolve_nsid(dev, args.nsid);

    let mut buf = TransferBuffer::acquire(dev, nr as usize * DsmRange::SIZE)?;
    let range = DsmRange {
        cattr: 0,
        nlb: args.nlb,
        slba: args.slba,
    };
    if let Some(table) = buf.as_mut_opt() {
        range.write_to(table)?;
    }

    info!(
        "dsm: {{nsid: 0x{:x}, slba: 0x{:x}, nlb: {}, ad: {}, idw: {}, idr: {}}}",
        nsid, args.slba, args.nlb, args.ad, args.idw, args.idr
    );

    let cmd = CommandFields::DatasetManagement {
        nr,
        ad: args.ad,
        idw: args.idw,
        idr: args.idr,
    }
    .build(nsid);

    let (transport, cpl) = dev.submit_io(&cmd, buf.as_mut_opt(), None);
    check(transport, cpl)?;

    buf.release();
    Ok(())
}
