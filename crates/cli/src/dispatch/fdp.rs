//! Flexible data placement dispatches
//!
//! Reclaim-unit-handle status retrieval (management receive), handle update
//! (management send), and the all-events feature toggle. The update list
//! count sent to the device is zero-based: list length minus one, the
//! opposite direction of the error-log bound.

use clap::Args;
use common::{NvmeDevice, Result, TransferBuffer, resolve_nsid};
use protocol::sizing::{self, CountedKind, PLACEMENT_ID_SIZE};
use protocol::{CommandFields, FID_FDP_EVENTS, MGMT_RECV_RUHS, MGMT_SEND_RUHU};
use tracing::info;

use crate::render;

use super::check;

/// Event types toggled by `set-fdp-events`
const SET_EVENT_TYPES: [u8; 6] = [0x00, 0x01, 0x02, 0x03, 0x80, 0x81];

/// Retrieve the reclaim-unit-handle status
pub fn ruhs(dev: &mut dyn NvmeDevice, nsid: Option<u32>, limit: u32) -> Result<()> {
    let nsid = resolve_nsid(dev, nsid);
    let sized = sizing::counted(CountedKind::ReclaimUnitHandleStatus, limit)?;

    info!("allocating and clearing buffer of {} bytes", sized.nbytes);
    let mut buf = TransferBuffer::acquire(dev, sized.nbytes)?;

    let cmd = CommandFields::IoMgmtRecv {
        mo: MGMT_RECV_RUHS,
        mos: 0,
        nbytes: sized.nbytes as u32,
    }
    .build(nsid);

    let (transport, cpl) = dev.submit_io(&cmd, buf.as_mut_opt(), None);
    check(transport, cpl)?;

    render::ruhs(buf.as_slice(), sized.entries);
    buf.release();
    Ok(())
}

/// Update the reclaim unit handle for one placement identifier
pub fn ruhu(dev: &mut dyn NvmeDevice, nsid: Option<u32>, pid: u16) -> Result<()> {
    let nsid = resolve_nsid(dev, nsid);

    // one placement identifier per invocation
    let pids = [pid];
    let mut buf = TransferBuffer::acquire(dev, pids.len() * PLACEMENT_ID_SIZE)?;
    if let Some(list) = buf.as_mut_opt() {
        for (slot, pid) in list.chunks_exact_mut(PLACEMENT_ID_SIZE).zip(&pids) {
            slot.copy_from_slice(&pid.to_le_bytes());
        }
    }

    info!("updating reclaim unit handle: {{nsid: 0x{nsid:x}, pid: 0x{pid:x}}}");

    let cmd = CommandFields::IoMgmtSend {
        mo: MGMT_SEND_RUHU,
        // the device takes the list length zero-based
        mos: (pids.len() - 1) as u16,
    }
    .build(nsid);

    let (transport, cpl) = dev.submit_io(&cmd, buf.as_mut_opt(), None);
    check(transport, cpl)?;

    buf.release();
    Ok(())
}

#[derive(Args, Debug)]
pub struct SetFdpEventsArgs {
    /// Feature identifier
    #[arg(long, default_value_t = FID_FDP_EVENTS)]
    pub fid: u8,

    /// Feature value (command dword 11); bit 0 enables, cleared disables
    #[arg(long)]
    pub feat: u32,

    /// Save the value across power states
    #[arg(long)]
    pub save: bool,

    /// Namespace identifier; defaults to the device's namespace
    #[arg(long)]
    pub nsid: Option<u32>,

    /// Placement handle and number of event types (command dword 12)
    #[arg(long)]
    pub cdw12: u32,
}

impl Default for SetFdpEventsArgs {
    fn default() -> Self {
        Self {
            fid: FID_FDP_EVENTS,
            feat: 0,
            save: false,
            nsid: None,
            cdw12: 0,
        }
    }
}

/// Enable or disable all FDP event types
pub fn set_fdp_events(dev: &mut dyn NvmeDevice, args: &SetFdpEventsArgs) -> Result<()> {
    let nsid = resolve_nsid(dev, args.nsid);

    let mut buf = TransferBuffer::acquire(dev, SET_EVENT_TYPES.len())?;
    if let Some(data) = buf.as_mut_opt() {
        data.copy_from_slice(&SET_EVENT_TYPES);
    }

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

#[cfg(test)]
mod tests {
    use super::*;
    use common::Error;
    use common::test_utils::MockDevice;
    use protocol::IoOpcode;
    use protocol::sizing::{RUHS_DESC_SIZE, RUHS_HEADER_SIZE};

    #[test]
    fn test_ruhs_buffer_shape() {
        let mut dev = MockDevice::new("mock:0", 1);
        ruhs(&mut dev, None, 4).unwrap();

        let sub = &dev.submissions[0];
        assert!(!sub.admin);
        assert_eq!(sub.descriptor.opcode, IoOpcode::IoMgmtRecv as u8);
        assert_eq!(sub.data_len, RUHS_HEADER_SIZE + 4 * RUHS_DESC_SIZE);
        assert_eq!(sub.descriptor.cdw10 & 0xFF, u32::from(MGMT_RECV_RUHS));
    }

    #[test]
    fn test_ruhs_zero_limit_rejected() {
        let mut dev = MockDevice::new("mock:0", 1);
        let err = ruhs(&mut dev, None, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(dev.submissions.is_empty());
    }

    #[test]
    fn test_ruhu_count_is_length_minus_one() {
        let mut dev = MockDevice::new("mock:0", 1);
        ruhu(&mut dev, None, 0x0102).unwrap();

        let sub = &dev.submissions[0];
        assert_eq!(sub.descriptor.opcode, IoOpcode::IoMgmtSend as u8);
        // one pid on the wire, count field zero-based
        assert_eq!(sub.descriptor.cdw10 >> 16, 0);
        assert_eq!(sub.data, vec![0x02, 0x01]);
    }

    #[test]
    fn test_set_fdp_events_sends_fixed_type_list() {
        let mut dev = MockDevice::new("mock:0", 1);
        set_fdp_events(
            &mut dev,
            &SetFdpEventsArgs {
                feat: 0x1,
                cdw12: 6,
                ..Default::default()
            },
        )
        .unwrap();

        let sub = &dev.submissions[0];
        assert_eq!(sub.data, SET_EVENT_TYPES.to_vec());
        assert_eq!(sub.descriptor.cdw10 & 0xFF, u32::from(FID_FDP_EVENTS));
        assert_eq!(sub.descriptor.cdw11, 0x1);
        assert_eq!(sub.descriptor.cdw12, 6);
    }
}
