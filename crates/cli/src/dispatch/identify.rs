//! Identify dispatches
//!
//! A user-defined identify plus the fixed-CNS shorthands (namespace,
//! controller, I/O command set). The CNS code both selects the requested
//! structure and, on success, picks the summary renderer; an unrecognized
//! code is informational only and the export path stays available.

use std::path::PathBuf;

use clap::Args;
use common::{NvmeDevice, Result, TransferBuffer, resolve_nsid};
use protocol::sizing::{self, FixedKind};
use protocol::{CNS_CONTROLLER, CNS_IO_COMMAND_SET, CNS_NAMESPACE, CommandFields};
use tracing::info;

use crate::render;

use super::{check, export_if_requested};

#[derive(Args, Debug, Default)]
pub struct IdentifyArgs {
    /// Controller-namespace-selector code
    #[arg(long)]
    pub cns: u8,

    /// Controller identifier
    #[arg(long, default_value_t = 0)]
    pub cntid: u16,

    /// Namespace identifier; defaults to the device's namespace
    #[arg(long)]
    pub nsid: Option<u32>,

    /// NVM set identifier
    #[arg(long = "setid", default_value_t = 0)]
    pub nvmsetid: u16,

    /// UUID index
    #[arg(long, default_value_t = 0)]
    pub uuid: u8,

    /// Write the raw identify structure to this path
    #[arg(short = 'o', long = "data-output")]
    pub data_output: Option<PathBuf>,
}

/// Execute a user-defined identify command
pub fn identify(dev: &mut dyn NvmeDevice, args: &IdentifyArgs) -> Result<()> {
    let nsid = resolve_nsid(dev, args.nsid);
    let sized = sizing::fixed(FixedKind::Identify);

    let mut buf = TransferBuffer::acquire(dev, sized.nbytes)?;
    let cmd = CommandFields::Identify {
        cns: args.cns,
        cntid: args.cntid,
        nvmsetid: args.nvmsetid,
        uuid: args.uuid,
    }
    .build(nsid);

    let (transport, cpl) = dev.submit_admin(&cmd, buf.as_mut_opt(), None);
    check(transport, cpl)?;

    match args.cns {
        CNS_NAMESPACE => render::identify_ns(buf.as_slice()),
        CNS_CONTROLLER => render::identify_ctrlr(buf.as_slice()),
        CNS_IO_COMMAND_SET => render::identify_cs(buf.as_slice()),
        cns => {
            // not an error; the raw structure can still be exported
            info!(
                "no renderer available for cns 0x{:02x}; use --data-output to dump the result",
                cns
            );
        }
    }

    export_if_requested(&buf, args.data_output.as_deref())?;
    buf.release();
    Ok(())
}

/// Identify the given namespace
pub fn identify_ns(
    dev: &mut dyn NvmeDevice,
    nsid: Option<u32>,
    data_output: Option<PathBuf>,
) -> Result<()> {
    identify(
        dev,
        &IdentifyArgs {
            cns: CNS_NAMESPACE,
            nsid,
            data_output,
            ..Default::default()
        },
    )
}

/// Identify the controller
pub fn identify_ctrlr(dev: &mut dyn NvmeDevice, data_output: Option<PathBuf>) -> Result<()> {
    identify(
        dev,
        &IdentifyArgs {
            cns: CNS_CONTROLLER,
            nsid: Some(0),
            data_output,
            ..Default::default()
        },
    )
}

/// Identify the command sets supported by the controller
pub fn identify_cs(dev: &mut dyn NvmeDevice, data_output: Option<PathBuf>) -> Result<()> {
    identify(
        dev,
        &IdentifyArgs {
            cns: CNS_IO_COMMAND_SET,
            cntid: 0xFFFF,
            nsid: Some(0),
            data_output,
            ..Default::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::test_utils::MockDevice;
    use protocol::{AdminOpcode, sizing::IDENTIFY_SIZE};

    #[test]
    fn test_identify_ns_uses_device_default_nsid() {
        let mut dev = MockDevice::new("mock:0", 1);
        identify_ns(&mut dev, None, None).unwrap();

        let sub = &dev.submissions[0];
        assert!(sub.admin);
        assert_eq!(sub.descriptor.opcode, AdminOpcode::Identify as u8);
        assert_eq!(sub.descriptor.nsid, 1);
        assert_eq!(sub.descriptor.cdw10 & 0xFF, u32::from(CNS_NAMESPACE));
        assert_eq!(sub.data_len, IDENTIFY_SIZE);
    }

    #[test]
    fn test_identify_explicit_nsid_wins() {
        let mut dev = MockDevice::new("mock:0", 1);
        identify_ns(&mut dev, Some(9), None).unwrap();
        assert_eq!(dev.submissions[0].descriptor.nsid, 9);
    }

    #[test]
    fn test_identify_cs_targets_all_controllers() {
        let mut dev = MockDevice::new("mock:0", 1);
        identify_cs(&mut dev, None).unwrap();

        let cmd = dev.submissions[0].descriptor;
        assert_eq!(cmd.cdw10 & 0xFF, u32::from(CNS_IO_COMMAND_SET));
        assert_eq!(cmd.cdw10 >> 16, 0xFFFF);
        assert_eq!(cmd.nsid, 0);
    }

    #[test]
    fn test_unknown_cns_still_exports() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("idfy.bin");

        let mut dev = MockDevice::new("mock:0", 1);
        dev.push_ok_with_data(vec![0x42; IDENTIFY_SIZE]);
        identify(
            &mut dev,
            &IdentifyArgs {
                cns: 0x7F,
                data_output: Some(out.clone()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), vec![0x42; IDENTIFY_SIZE]);
    }

    #[test]
    fn test_identify_surfaces_device_rejection() {
        let mut dev = MockDevice::new("mock:0", 1);
        dev.push_reply(common::test_utils::MockReply {
            completion: protocol::CompletionRecord {
                status: 0x02 << 1,
                ..Default::default()
            },
            ..Default::default()
        });
        let err = identify_ctrlr(&mut dev, None).unwrap_err();
        assert!(matches!(err, common::Error::DeviceRejected { .. }));
    }
}
