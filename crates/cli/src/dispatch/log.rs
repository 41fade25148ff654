//! Log-page dispatches
//!
//! Fixed-shape pages (health, FDP statistics), device-bounded pages (error
//! information), caller-limited pages (reclaim-unit-handle usage, FDP
//! events), and the generic log with an explicit byte count.

use std::path::PathBuf;

use clap::Args;
use common::{NvmeDevice, Result, TransferBuffer, resolve_nsid};
use protocol::sizing::{self, CountedKind, FixedKind};
use protocol::{
    CommandFields, LID_ERROR, LID_FDP_CONFIG, LID_FDP_EVENTS, LID_FDP_RUHU, LID_FDP_STATS,
    LID_HEALTH,
};
use tracing::info;

use crate::render;

use super::{check, export_if_requested};

#[derive(Args, Debug, Default)]
pub struct LogArgs {
    /// Log page identifier
    #[arg(long)]
    pub lid: u8,

    /// Log specific parameter
    #[arg(long, default_value_t = 0)]
    pub lsp: u8,

    /// Log page offset in bytes
    #[arg(long = "lpo-nbytes", default_value_t = 0)]
    pub lpo_nbytes: u64,

    /// Namespace identifier; defaults to the device's namespace
    #[arg(long)]
    pub nsid: Option<u32>,

    /// Retain asynchronous event
    #[arg(long)]
    pub rae: bool,

    /// Transfer size in bytes; required, the page shape is caller-defined
    #[arg(long = "data-nbytes", default_value_t = 0)]
    pub data_nbytes: u32,

    /// Write the raw log page to this path
    #[arg(short = 'o', long = "data-output")]
    pub data_output: Option<PathBuf>,
}

fn get_log(
    dev: &mut dyn NvmeDevice,
    fields: CommandFields,
    nsid: u32,
    nbytes: usize,
    data_output: Option<&std::path::Path>,
    render: impl FnOnce(&[u8]),
) -> Result<()> {
    info!("allocating and clearing buffer of {nbytes} bytes");
    let mut buf = TransferBuffer::acquire(dev, nbytes)?;
    let cmd = fields.build(nsid);

    let (transport, cpl) = dev.submit_admin(&cmd, buf.as_mut_opt(), None);
    check(transport, cpl)?;

    render(buf.as_slice());
    export_if_requested(&buf, data_output)?;
    buf.release();
    Ok(())
}

/// Retrieve a user-defined log page
pub fn log(dev: &mut dyn NvmeDevice, args: &LogArgs) -> Result<()> {
    let nsid = resolve_nsid(dev, args.nsid);
    let sized = sizing::explicit(args.data_nbytes as usize)?;

    info!(
        "get-log: {{lid: 0x{:x}, lsp: 0x{:x}, lpo: {}, nsid: 0x{:x}, rae: {}}}",
        args.lid, args.lsp, args.lpo_nbytes, nsid, args.rae
    );

    get_log(
        dev,
        CommandFields::GetLogPage {
            lid: args.lid,
            lsp: args.lsp,
            rae: args.rae,
            lsi: 0,
            offset: args.lpo_nbytes,
            nbytes: sized.nbytes as u32,
        },
        nsid,
        sized.nbytes,
        args.data_output.as_deref(),
        |raw| {
            // no structured renderer for caller-defined pages
            if args.data_output.is_none() {
                render::hexdump(raw);
            }
        },
    )
}

/// Retrieve the SMART / health information log
pub fn log_health(
    dev: &mut dyn NvmeDevice,
    nsid: Option<u32>,
    data_output: Option<PathBuf>,
) -> Result<()> {
    let nsid = resolve_nsid(dev, nsid);
    let sized = sizing::fixed(FixedKind::HealthLog);

    get_log(
        dev,
        CommandFields::GetLogPage {
            lid: LID_HEALTH,
            lsp: 0,
            rae: false,
            lsi: 0,
            offset: 0,
            nbytes: sized.nbytes as u32,
        },
        nsid,
        sized.nbytes,
        data_output.as_deref(),
        render::health_log,
    )
}

/// Retrieve the error-information log
///
/// With no explicit limit the entry count comes from the controller's
/// zero-based error-log-page-entries bound.
pub fn log_erri(
    dev: &mut dyn NvmeDevice,
    nsid: Option<u32>,
    limit: Option<u32>,
    data_output: Option<PathBuf>,
) -> Result<()> {
    let nsid = resolve_nsid(dev, nsid);
    let sized = sizing::error_log(limit, dev.caps().elpe);

    get_log(
        dev,
        CommandFields::GetLogPage {
            lid: LID_ERROR,
            lsp: 0,
            rae: false,
            lsi: 0,
            offset: 0,
            nbytes: sized.nbytes as u32,
        },
        nsid,
        sized.nbytes,
        data_output.as_deref(),
        |raw| render::error_log(raw, sized.entries),
    )
}

#[derive(Args, Debug, Default)]
pub struct FdpLogArgs {
    /// Namespace identifier; defaults to the device's namespace
    #[arg(long)]
    pub nsid: Option<u32>,

    /// Endurance group identifier (log specific identifier)
    #[arg(long, default_value_t = 0)]
    pub lsi: u16,

    /// Write the raw log page to this path
    #[arg(short = 'o', long = "data-output")]
    pub data_output: Option<PathBuf>,
}

/// Retrieve the FDP configurations log
///
/// The page shape varies per device, so the transfer size is caller-supplied.
pub fn log_fdp_config(dev: &mut dyn NvmeDevice, args: &FdpLogArgs, data_nbytes: u32) -> Result<()> {
    let nsid = resolve_nsid(dev, args.nsid);
    let sized = sizing::explicit(data_nbytes as usize)?;

    get_log(
        dev,
        CommandFields::GetLogPage {
            lid: LID_FDP_CONFIG,
            lsp: 0,
            rae: false,
            lsi: args.lsi,
            offset: 0,
            nbytes: sized.nbytes as u32,
        },
        nsid,
        sized.nbytes,
        args.data_output.as_deref(),
        |_| info!("no renderer for FDP configuration pages; use --data-output to dump"),
    )
}

/// Retrieve the reclaim-unit-handle usage log
pub fn log_ruhu(dev: &mut dyn NvmeDevice, args: &FdpLogArgs, limit: u32) -> Result<()> {
    let nsid = resolve_nsid(dev, args.nsid);
    let sized = sizing::counted(CountedKind::ReclaimUnitHandleUsage, limit)?;

    get_log(
        dev,
        CommandFields::GetLogPage {
            lid: LID_FDP_RUHU,
            lsp: 0,
            rae: false,
            lsi: args.lsi,
            offset: 0,
            nbytes: sized.nbytes as u32,
        },
        nsid,
        sized.nbytes,
        args.data_output.as_deref(),
        |raw| render::ruhu_log(raw, sized.entries),
    )
}

/// Retrieve the FDP statistics log
pub fn log_fdp_stats(dev: &mut dyn NvmeDevice, args: &FdpLogArgs) -> Result<()> {
    let nsid = resolve_nsid(dev, args.nsid);
    let sized = sizing::fixed(FixedKind::FdpStats);

    get_log(
        dev,
        CommandFields::GetLogPage {
            lid: LID_FDP_STATS,
            lsp: 0,
            rae: false,
            lsi: args.lsi,
            offset: 0,
            nbytes: sized.nbytes as u32,
        },
        nsid,
        sized.nbytes,
        args.data_output.as_deref(),
        render::fdp_stats_log,
    )
}

/// Retrieve the FDP events log
pub fn log_fdp_events(
    dev: &mut dyn NvmeDevice,
    args: &FdpLogArgs,
    limit: u32,
    lsp: u8,
) -> Result<()> {
    let nsid = resolve_nsid(dev, args.nsid);
    let sized = sizing::counted(CountedKind::FdpEvents, limit)?;

    get_log(
        dev,
        CommandFields::GetLogPage {
            lid: LID_FDP_EVENTS,
            lsp,
            rae: false,
            lsi: args.lsi,
            offset: 0,
            nbytes: sized.nbytes as u32,
        },
        nsid,
        sized.nbytes,
        args.data_output.as_deref(),
        |raw| render::fdp_events_log(raw, sized.entries),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::test_utils::MockDevice;
    use common::{ControllerCaps, Error};
    use protocol::AdminOpcode;
    use protocol::sizing::{
        ERROR_LOG_ENTRY_SIZE, FDP_EVENT_SIZE, FDP_EVENTS_HEADER_SIZE, HEALTH_LOG_SIZE,
        RUHU_DESC_SIZE, RUHU_HEADER_SIZE,
    };

    #[test]
    fn test_erri_sizes_from_zero_based_bound() {
        let mut dev =
            MockDevice::new("mock:0", 1).with_caps(ControllerCaps { elpe: 63, nruh: 0 });
        log_erri(&mut dev, None, None, None).unwrap();

        let sub = &dev.submissions[0];
        assert_eq!(sub.data_len, 64 * ERROR_LOG_ENTRY_SIZE);
        assert_eq!(sub.descriptor.opcode, AdminOpcode::GetLogPage as u8);
        assert_eq!(sub.descriptor.cdw10 & 0xFF, u32::from(LID_ERROR));
    }

    #[test]
    fn test_erri_explicit_limit_overrides_bound() {
        let mut dev =
            MockDevice::new("mock:0", 1).with_caps(ControllerCaps { elpe: 63, nruh: 0 });
        log_erri(&mut dev, None, Some(2), None).unwrap();
        assert_eq!(dev.submissions[0].data_len, 2 * ERROR_LOG_ENTRY_SIZE);
    }

    #[test]
    fn test_health_log_fixed_size_and_default_nsid() {
        let mut dev = MockDevice::new("mock:0", 5);
        log_health(&mut dev, None, None).unwrap();

        let sub = &dev.submissions[0];
        assert_eq!(sub.data_len, HEALTH_LOG_SIZE);
        assert_eq!(sub.descriptor.nsid, 5);
    }

    #[test]
    fn test_generic_log_requires_byte_count() {
        let mut dev = MockDevice::new("mock:0", 1);
        let err = log(&mut dev, &LogArgs::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        // rejected before any buffer or submission
        assert!(dev.submissions.is_empty());
    }

    #[test]
    fn test_ruhu_header_plus_entries() {
        let mut dev = MockDevice::new("mock:0", 1);
        log_ruhu(&mut dev, &FdpLogArgs::default(), 8).unwrap();
        assert_eq!(
            dev.submissions[0].data_len,
            RUHU_HEADER_SIZE + 8 * RUHU_DESC_SIZE
        );
    }

    #[test]
    fn test_ruhu_zero_limit_rejected_before_submission() {
        let mut dev = MockDevice::new("mock:0", 1);
        let err = log_ruhu(&mut dev, &FdpLogArgs::default(), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(dev.submissions.is_empty());
    }

    #[test]
    fn test_fdp_events_carries_lsi_and_lsp() {
        let mut dev = MockDevice::new("mock:0", 1);
        let args = FdpLogArgs {
            lsi: 0x0003,
            ..Default::default()
        };
        log_fdp_events(&mut dev, &args, 2, 0x1).unwrap();

        let cmd = dev.submissions[0].descriptor;
        assert_eq!(cmd.cdw11 >> 16, 0x0003);
        assert_eq!((cmd.cdw10 >> 8) & 0x7F, 0x1);
        assert_eq!(
            dev.submissions[0].data_len,
            FDP_EVENTS_HEADER_SIZE + 2 * FDP_EVENT_SIZE
        );
    }
}
