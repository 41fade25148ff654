//! Linux NVMe ioctl backend
//!
//! Talks to `/dev/nvme*` character and block devices through the kernel
//! passthrough ioctls. Identity and the error-log bound are read once at
//! open time via an identify-controller command.

use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::Path;

use common::{
    ControllerCaps, DeviceDriver, DeviceIdent, DeviceOptions, Error, NvmeDevice, Result, Visit,
    open_failed,
};
use nix::{ioctl_none, ioctl_readwrite};
use protocol::sizing::IDENTIFY_SIZE;
use protocol::{CNS_CONTROLLER, CommandDescriptor, CommandFields, CompletionRecord};
use tracing::{debug, warn};

/// Kernel passthrough command, mirrors `struct nvme_passthru_cmd`
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct PassthruCmd {
    opcode: u8,
    flags: u8,
    rsvd1: u16,
    nsid: u32,
    cdw2: u32,
    cdw3: u32,
    metadata: u64,
    addr: u64,
    metadata_len: u32,
    data_len: u32,
    cdw10: u32,
    cdw11: u32,
    cdw12: u32,
    cdw13: u32,
    cdw14: u32,
    cdw15: u32,
    timeout_ms: u32,
    result: u32,
}

ioctl_none!(nvme_ioctl_id, b'N', 0x40);
ioctl_readwrite!(nvme_ioctl_admin_cmd, b'N', 0x41, PassthruCmd);
ioctl_readwrite!(nvme_ioctl_io_cmd, b'N', 0x43, PassthruCmd);

/// One open `/dev/nvme*` device
pub struct LinuxDevice {
    file: File,
    ident: DeviceIdent,
    caps: ControllerCaps,
}

impl LinuxDevice {
    fn submit(&mut self, cmd: &CommandDescriptor, data: Option<&mut [u8]>, meta: Option<&mut [u8]>, admin: bool) -> (i32, CompletionRecord) {
        let mut pt = PassthruCmd {
            opcode: cmd.opcode,
            flags: cmd.flags,
            nsid: cmd.nsid,
            cdw2: cmd.cdw2,
            cdw3: cmd.cdw3,
            cdw10: cmd.cdw10,
            cdw11: cmd.cdw11,
            cdw12: cmd.cdw12,
            cdw13: cmd.cdw13,
            cdw14: cmd.cdw14,
            cdw15: cmd.cdw15,
            ..Default::default()
        };
        if let Some(data) = data {
            pt.addr = data.as_mut_ptr() as u64;
            pt.data_len = data.len() as u32;
        }
        if let Some(meta) = meta {
            pt.metadata = meta.as_mut_ptr() as u64;
            pt.metadata_len = meta.len() as u32;
        }

        let fd = self.file.as_raw_fd();
        let res = unsafe {
            if admin {
                nvme_ioctl_admin_cmd(fd, &mut pt)
            } else {
                nvme_ioctl_io_cmd(fd, &mut pt)
            }
        };

        match res {
            Ok(status) => {
                // the kernel returns the completion status code; re-shift it
                // around the phase bit so the shared inspector sees the raw
                // layout
                let completion = CompletionRecord {
                    cdw0: pt.result,
                    status: (status as u16) << 1,
                    ..Default::default()
                };
                (0, completion)
            }
            Err(errno) => (-(errno as i32), CompletionRecord::default()),
        }
    }

    fn open_path(uri: &str) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(uri)
            .map_err(|e| open_failed(uri, e))?;

        // namespace block devices answer with their nsid; controller
        // character devices do not have one
        let nsid = match unsafe { nvme_ioctl_id(file.as_raw_fd()) } {
            Ok(nsid) if nsid > 0 => nsid as u32,
            _ => {
                debug!("'{uri}' has no namespace id, defaulting to 1");
                1
            }
        };

        let mut dev = Self {
            file,
            ident: DeviceIdent {
                uri: uri.to_string(),
                model: String::new(),
                serial: String::new(),
                firmware: String::new(),
                nsid,
            },
            caps: ControllerCaps::default(),
        };
        dev.load_controller_info()?;
        Ok(dev)
    }

    /// Read identity strings and the zero-based error-log bound
    fn load_controller_info(&mut self) -> Result<()> {
        let mut buf = vec![0u8; IDENTIFY_SIZE];
        let cmd = CommandFields::Identify {
            cns: CNS_CONTROLLER,
            cntid: 0,
            nvmsetid: 0,
            uuid: 0,
        }
        .build(0);

        let (transport, cpl) = self.submit(&cmd, Some(&mut buf), None, true);
        protocol::evaluate(transport, &cpl).map_err(|_| {
            Error::Backend(format!(
                "identify-controller failed on '{}': {cpl}",
                self.ident.uri
            ))
        })?;

        let field = |range: std::ops::Range<usize>| {
            String::from_utf8_lossy(&buf[range]).trim().to_string()
        };
        self.ident.serial = field(4..24);
        self.ident.model = field(24..64);
        self.ident.firmware = field(64..72);
        self.caps.elpe = buf[262];
        Ok(())
    }
}

impl NvmeDevice for LinuxDevice {
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

/// Discovery over `/sys/class/nvme`
pub struct LinuxDriver;

impl LinuxDriver {
    fn device_uris() -> Vec<String> {
        let mut uris = Vec::new();
        let Ok(controllers) = std::fs::read_dir("/sys/class/nvme") else {
            return uris;
        };
        for entry in controllers.flatten() {
            let ctrl = entry.file_name().to_string_lossy().to_string();
            // namespaces appear as nvme<X>n<Y> below the controller
            if let Ok(children) = std::fs::read_dir(entry.path()) {
                for child in children.flatten() {
                    let name = child.file_name().to_string_lossy().to_string();
                    if name.starts_with(&ctrl)
                        && name[ctrl.len()..].starts_with('n')
                        && Path::new(&format!("/dev/{name}")).exists()
                    {
                        uris.push(format!("/dev/{name}"));
                    }
                }
            }
        }
        uris.sort();
        uris
    }
}

impl DeviceDriver for LinuxDriver {
    fn open(&self, uri: &str, _opts: &DeviceOptions) -> Result<Box<dyn NvmeDevice>> {
        Ok(Box::new(LinuxDevice::open_path(uri)?))
    }

    fn enumerate(
        &self,
        filter: Option<&str>,
        _opts: &DeviceOptions,
        visit: &mut dyn FnMut(&mut dyn NvmeDevice) -> Visit,
    ) -> Result<()> {
        for uri in Self::device_uris() {
            if let Some(prefix) = filter {
                if !uri.starts_with(prefix) {
                    continue;
                }
            }
            match LinuxDevice::open_path(&uri) {
                Ok(mut dev) => {
                    // every visitor in this tool closes and continues; the
                    // device drops when it leaves this scope
                    let _ = visit(&mut dev);
                }
                Err(e) => warn!("skipping '{uri}': {e}"),
            }
        }
        Ok(())
    }
}
