//! Test utilities for nvmectl
//!
//! Provides a scripted mock device and discovery driver for testing the
//! dispatch layer without hardware.
//!
//! # Example
//!
//! ```
//! use common::test_utils::MockDevice;
//! use common::NvmeDevice;
//!
//! let dev = MockDevice::new("mock:0", 1);
//! assert_eq!(dev.default_nsid(), 1);
//! ```

use std::collections::VecDeque;

use protocol::{CommandDescriptor, CompletionRecord};

use crate::device::{
    ControllerCaps, DeviceDriver, DeviceIdent, DeviceOptions, NvmeDevice, Visit,
};
use crate::error::{Error, Result};

/// One recorded submission
#[derive(Debug, Clone)]
pub struct Submission {
    pub descriptor: CommandDescriptor,
    /// Snapshot of the outbound data buffer at submission time
    pub data: Vec<u8>,
    pub data_len: usize,
    pub meta_len: usize,
    pub admin: bool,
}

/// Scripted reply for one submission
#[derive(Debug, Clone, Default)]
pub struct MockReply {
    pub transport: i32,
    pub completion: CompletionRecord,
    /// Bytes the "device" writes into the data buffer prefix
    pub data: Vec<u8>,
}

/// Mock device recording every submission and replaying scripted replies
///
/// When the reply queue is empty, submissions succeed with a zeroed
/// completion record.
#[derive(Debug)]
pub struct MockDevice {
    ident: DeviceIdent,
    caps: ControllerCaps,
    replies: VecDeque<MockReply>,
    pub submissions: Vec<Submission>,
}

impl MockDevice {
    /// Create a mock device with the given URI and default namespace id
    pub fn new(uri: &str, nsid: u32) -> Self {
        Self {
            ident: DeviceIdent {
                uri: uri.to_string(),
                model: "Mock NVMe Device".to_string(),
                serial: "MOCK0001".to_string(),
                firmware: "0.1".to_string(),
                nsid,
            },
            caps: ControllerCaps::default(),
            replies: VecDeque::new(),
            submissions: Vec::new(),
        }
    }

    pub fn with_caps(mut self, caps: ControllerCaps) -> Self {
        self.caps = caps;
        self
    }

    /// Queue a scripted reply
    pub fn push_reply(&mut self, reply: MockReply) {
        self.replies.push_back(reply);
    }

    /// Queue a success whose data buffer prefix is overwritten with `data`
    pub fn push_ok_with_data(&mut self, data: Vec<u8>) {
        self.push_reply(MockReply {
            data,
            ..Default::default()
        });
    }

    /// Queue a success carrying `cdw0` in the completion record
    pub fn push_ok_with_cdw0(&mut self, cdw0: u32) {
        self.push_reply(MockReply {
            completion: CompletionRecord {
                cdw0,
                ..Default::default()
            },
            ..Default::default()
        });
    }

    fn submit(
        &mut self,
        cmd: &CommandDescriptor,
        data: Option<&mut [u8]>,
        meta: Option<&mut [u8]>,
        admin: bool,
    ) -> (i32, CompletionRecord) {
        let reply = self.replies.pop_front().unwrap_or_default();

        let data_len = data.as_ref().map_or(0, |d| d.len());
        let meta_len = meta.as_ref().map_or(0, |m| m.len());
        let outbound = data.as_ref().map_or(Vec::new(), |d| d.to_vec());

        if let Some(buf) = data {
            let n = reply.data.len().min(buf.len());
            buf[..n].copy_from_slice(&reply.data[..n]);
        }

        self.submissions.push(Submission {
            descriptor: *cmd,
            data: outbound,
            data_len,
            meta_len,
            admin,
        });

        (reply.transport, reply.completion)
    }
}

impl NvmeDevice for MockDevice {
    fn ident(&self) -> &DeviceIdent {
        &self.ident
    }

    fn caps(&self) -> ControllerCaps {
        self.caps
    }

    fn submit_admin(
        &mut self,
        cmd: &CommandDescriptor,
        data: Option<&mut [u8]>,
        meta: Option<&mut [u8]>,
    ) -> (i32, CompletionRecord) {
        self.submit(cmd, data, meta, true)
    }

    fn submit_io(
        &mut self,
        cmd: &CommandDescriptor,
        data: Option<&mut [u8]>,
        meta: Option<&mut [u8]>,
    ) -> (i32, CompletionRecord) {
        self.submit(cmd, data, meta, false)
    }
}

/// Mock discovery driver backed by a fixed device list
#[derive(Debug, Default)]
pub struct MockDriver {
    devices: Vec<(String, u32)>,
}

impl MockDriver {
    /// Register a device the driver will yield
    pub fn add(&mut self, uri: &str, nsid: u32) {
        self.devices.push((uri.to_string(), nsid));
    }
}

impl DeviceDriver for MockDriver {
    fn open(&self, uri: &str, _opts: &DeviceOptions) -> Result<Box<dyn NvmeDevice>> {
        self.devices
            .iter()
            .find(|(u, _)| u == uri)
            .map(|(u, nsid)| Box::new(MockDevice::new(u, *nsid)) as Box<dyn NvmeDevice>)
            .ok_or_else(|| Error::Backend(format!("no such device: {uri}")))
    }

    fn enumerate(
        &self,
        filter: Option<&str>,
        _opts: &DeviceOptions,
        visit: &mut dyn FnMut(&mut dyn NvmeDevice) -> Visit,
    ) -> Result<()> {
        for (uri, nsid) in &self.devices {
            if let Some(prefix) = filter {
                if !uri.starts_with(prefix) {
                    continue;
                }
            }
            let mut dev = MockDevice::new(uri, *nsid);
            // every visitor in this tool closes and continues
            let _ = visit(&mut dev);
        }
        Ok(())
    }
}
