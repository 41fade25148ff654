//! Format and sanitize dispatches
//!
//! Neither carries a result buffer: validate, build, submit, evaluate.

use clap::Args;
use common::{NvmeDevice, Result, resolve_nsid};
use protocol::CommandFields;
use tracing::info;

use super::check;

#[derive(Args, Debug, Default)]
pub struct FormatArgs {
    /// Namespace identifier; defaults to the device's namespace
    #[arg(long)]
    pub nsid: Option<u32>,

    /// LBA format index
    #[arg(long, default_value_t = 0)]
    pub lbaf: u8,

    /// Zone format
    #[arg(long, default_value_t = 0)]
    pub zf: u8,

    /// Metadata settings
    #[arg(long, default_value_t = 0)]
    pub mset: u8,

    /// Secure erase settings
    #[arg(long, default_value_t = 0)]
    pub ses: u8,

    /// Protection information
    #[arg(long, default_value_t = 0)]
    pub pi: u8,

    /// Protection information location
    #[arg(long, default_value_t = 0)]
    pub pil: u8,
}

/// Format an NVM namespace
pub fn format(dev: &mut dyn NvmeDevice, args: &FormatArgs) -> Result<()> {
    let nsid = resolve_nsid(dev, args.nsid);

    info!(
        "format: {{nsid: 0x{:08x}, lbaf: 0x{:x}, zf: 0x{:x}, mset: 0x{:x}, ses: 0x{:x}, \
         pi: 0x{:x}, pil: 0x{:x}}}",
        nsid, args.lbaf, args.zf, args.mset, args.ses, args.pi, args.pil
    );

    let cmd = CommandFields::Format {
        lbaf: args.lbaf,
        zf: args.zf,
        mset: args.mset,
        ses: args.ses,
        pi: args.pi,
        pil: args.pil,
    }
    .build(nsid);

    let (transport, cpl) = dev.submit_admin(&cmd, None, None);
    check(transport, cpl)?;
    Ok(())
}

#[derive(Args, Debug, Default)]
pub struct SanitizeArgs {
    /// Sanitize action
    #[arg(long = "sanact", default_value_t = 0)]
    pub action: u8,

    /// Allow unrestricted sanitize exit
    #[arg(long)]
    pub ause: bool,

    /// Overwrite pattern
    #[arg(long, default_value_t = 0)]
    pub ovrpat: u32,

    /// Overwrite pass count
    #[arg(long, default_value_t = 0)]
    pub owpass: u8,

    /// Overwrite invert pattern between passes
    #[arg(long)]
    pub oipbp: bool,

    /// No deallocate after sanitize
    #[arg(long)]
    pub nodas: bool,
}

/// Start a sanitize operation
pub fn sanitize(dev: &mut dyn NvmeDevice, args: &SanitizeArgs) -> Result<()> {
    info!(
        "sanitize: {{sanact: 0x{:x}, ause: {}, ovrpat: 0x{:x}, owpass: 0x{:x}, oipbp: {}, \
         nodas: {}}}",
        args.action, args.ause, args.ovrpat, args.owpass, args.oipbp, args.nodas
    );

    let cmd = CommandFields::Sanitize {
        action: args.action,
        ause: args.ause,
        ovrpat: args.ovrpat,
        owpass: args.owpass,
        oipbp: args.oipbp,
        nodas: args.nodas,
    }
    .build(0);

    let (transport, cpl) = dev.submit_admin(&cmd, None, None);
    check(transport, cpl)?;
    Ok(())
}
