//! End-to-end scenarios across the protocol and device layers

use common::test_utils::{MockDevice, MockDriver};
use common::{
    ControllerCaps, DeviceDriver, DeviceOptions, Enumeration, Error, NvmeDevice, TransferBuffer,
    collect_visitor, resolve_nsid,
};
use protocol::sizing::{self, ERROR_LOG_ENTRY_SIZE, IDENTIFY_SIZE};
use protocol::{
    AdminOpcode, CNS_NAMESPACE, CommandDescriptor, CommandFields, CompletionRecord, evaluate,
};

#[test]
fn test_identify_uses_device_default_namespace() {
    let dev = MockDevice::new("mock:0", 7);
    let nsid = resolve_nsid(&dev, None);

    let cmd = CommandFields::Identify {
        cns: CNS_NAMESPACE,
        cntid: 0,
        nvmsetid: 0,
        uuid: 0,
    }
    .build(nsid);

    assert_eq!(cmd.opcode, AdminOpcode::Identify as u8);
    assert_eq!(cmd.nsid, 7);
    assert_eq!(cmd.cdw10 & 0xFF, u32::from(CNS_NAMESPACE));
}

#[test]
fn test_explicit_namespace_zero_is_used_verbatim() {
    let dev = MockDevice::new("mock:0", 7);
    assert_eq!(resolve_nsid(&dev, Some(0)), 0);
}

#[test]
fn test_error_log_sizes_from_reported_bound() {
    // a zero-based bound of 63 means 64 entries
    let sized = sizing::error_log(None, 63);
    assert_eq!(sized.entries, 64);
    assert_eq!(sized.nbytes, 64 * ERROR_LOG_ENTRY_SIZE);

    let sized = sizing::error_log(Some(2), 63);
    assert_eq!(sized.entries, 2);
}

#[test]
fn test_buffer_export_then_fill_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.bin");

    let mut dev = MockDevice::new("mock:0", 1);
    dev.push_ok_with_data(vec![0xA5; 512]);

    let mut buf = TransferBuffer::acquire(&mut dev, 512).unwrap();
    let cmd = CommandFields::Identify {
        cns: CNS_NAMESPACE,
        cntid: 0,
        nvmsetid: 0,
        uuid: 0,
    }
    .build(1);
    let (transport, cpl) = dev.submit_admin(&cmd, buf.as_mut_opt(), None);
    evaluate(transport, &cpl).unwrap();

    buf.export(&path).unwrap();

    // feed the exported bytes back in through a fresh buffer
    let mut refill = TransferBuffer::acquire(&mut dev, 512).unwrap();
    refill.fill(&path).unwrap();
    assert_eq!(refill.as_slice(), vec![0xA5; 512].as_slice());

    buf.release();
    refill.release();
}

#[test]
fn test_buffer_release_is_idempotent() {
    let mut dev = MockDevice::new("mock:0", 1);
    let mut buf = TransferBuffer::acquire(&mut dev, IDENTIFY_SIZE).unwrap();
    buf.release();
    buf.release();
    assert!(buf.is_empty());
}

#[test]
fn test_zero_size_buffer_never_allocates() {
    let mut dev = MockDevice::new("mock:0", 1);
    let mut buf = TransferBuffer::acquire(&mut dev, 0).unwrap();
    assert!(buf.is_empty());
    assert!(buf.as_mut_opt().is_none());
}

#[test]
fn test_enumeration_collects_in_discovery_order() {
    let mut driver = MockDriver::default();
    driver.add("mock:0", 1);
    driver.add("mock:1", 2);
    driver.add("mock:2", 3);

    let mut listing = Enumeration::with_capacity(1);
    driver
        .enumerate(None, &DeviceOptions::default(), &mut |dev| {
            collect_visitor(&mut listing, dev)
        })
        .unwrap();

    let uris: Vec<&str> = listing.iter().map(|i| i.uri.as_str()).collect();
    assert_eq!(uris, ["mock:0", "mock:1", "mock:2"]);
}

#[test]
fn test_empty_enumeration_renders_marker() {
    let listing = Enumeration::with_capacity(4);
    assert_eq!(listing.to_string(), "devices: ~");
}

#[test]
fn test_rejected_completion_maps_to_distinct_exit_code() {
    let rejected = CompletionRecord {
        status: 0x4002, // phase bit plus a non-zero code
        ..Default::default()
    };
    let fault = evaluate(0, &rejected).unwrap_err();
    let err = Error::from_fault(fault, rejected);
    assert!(matches!(err, Error::DeviceRejected { .. }));

    let transport = evaluate(-5, &CompletionRecord::default()).unwrap_err();
    let transport = Error::from_fault(transport, CompletionRecord::default());

    assert_ne!(err.exit_code(), transport.exit_code());
    assert_ne!(err.exit_code(), 0);
}

#[test]
fn test_descriptor_survives_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cmd.bin");

    let cmd = CommandFields::GetLogPage {
        lid: 0x02,
        lsp: 0,
        rae: false,
        lsi: 0,
        offset: 0,
        nbytes: 512,
    }
    .build(0xFFFFFFFF);
    std::fs::write(&path, cmd.to_bytes()).unwrap();

    let raw = common::read_exact_from(&path, CommandDescriptor::SIZE).unwrap();
    let loaded = CommandDescriptor::from_bytes(&raw).unwrap();
    assert_eq!(loaded, cmd);
}

#[test]
fn test_mock_submissions_record_buffer_content() {
    let mut dev = MockDevice::new("mock:0", 1).with_caps(ControllerCaps { elpe: 3, nruh: 8 });
    let mut buf = TransferBuffer::acquire(&mut dev, 16).unwrap();
    buf.as_mut_opt().unwrap().copy_from_slice(&[0x11; 16]);

    let cmd = CommandFields::Identify {
        cns: CNS_NAMESPACE,
        cntid: 0,
        nvmsetid: 0,
        uuid: 0,
    }
    .build(1);
    let (transport, cpl) = dev.submit_io(&cmd, buf.as_mut_opt(), None);
    evaluate(transport, &cpl).unwrap();

    let sub = &dev.submissions[0];
    assert!(!sub.admin);
    assert_eq!(sub.data, vec![0x11; 16]);
    assert_eq!(dev.caps().elpe, 3);
}
