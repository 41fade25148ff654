//! NVMe command descriptor construction
//!
//! This module defines the fixed-size submission descriptor, the per-opcode
//! field groups, and the packing rules that turn validated arguments into
//! command dwords. Construction is pure; no device interaction happens here.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Admin command opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AdminOpcode {
    GetLogPage = 0x02,
    Identify = 0x06,
    SetFeatures = 0x09,
    GetFeatures = 0x0A,
    FormatNvm = 0x80,
    Sanitize = 0x84,
}

/// I/O command opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum IoOpcode {
    DatasetManagement = 0x09,
    IoMgmtRecv = 0x12,
    IoMgmtSend = 0x1D,
}

/// Controller-namespace-selector codes for identify
pub const CNS_NAMESPACE: u8 = 0x00;
pub const CNS_CONTROLLER: u8 = 0x01;
pub const CNS_IO_COMMAND_SET: u8 = 0x1C;

/// Log page identifiers
pub const LID_ERROR: u8 = 0x01;
pub const LID_HEALTH: u8 = 0x02;
pub const LID_FDP_CONFIG: u8 = 0x20;
pub const LID_FDP_RUHU: u8 = 0x21;
pub const LID_FDP_STATS: u8 = 0x22;
pub const LID_FDP_EVENTS: u8 = 0x23;

/// Feature identifier for FDP event enable/disable
pub const FID_FDP_EVENTS: u8 = 0x1E;

/// I/O management operations
pub const MGMT_RECV_RUHS: u8 = 0x01;
pub const MGMT_SEND_RUHU: u8 = 0x01;

/// One NVMe submission descriptor
///
/// Mirrors the 64-byte on-wire submission queue entry. Built fresh per
/// dispatch and owned by the dispatching code for the duration of one
/// command. Passthrough commands load this wholesale via [`from_bytes`].
///
/// [`from_bytes`]: CommandDescriptor::from_bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandDescriptor {
    pub opcode: u8,
    pub flags: u8,
    pub cid: u16,
    pub nsid: u32,
    pub cdw2: u32,
    pub cdw3: u32,
    pub mptr: u64,
    pub prp1: u64,
    pub prp2: u64,
    pub cdw10: u32,
    pub cdw11: u32,
    pub cdw12: u32,
    pub cdw13: u32,
    pub cdw14: u32,
    pub cdw15: u32,
}

impl CommandDescriptor {
    /// Fixed on-wire size of a submission descriptor
    pub const SIZE: usize = 64;

    /// Serialize to the 64-byte little-endian wire layout
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut raw = [0u8; Self::SIZE];
        raw[0] = self.opcode;
        raw[1] = self.flags;
        LittleEndian::write_u16(&mut raw[2..4], self.cid);
        LittleEndian::write_u32(&mut raw[4..8], self.nsid);
        LittleEndian::write_u32(&mut raw[8..12], self.cdw2);
        LittleEndian::write_u32(&mut raw[12..16], self.cdw3);
        LittleEndian::write_u64(&mut raw[16..24], self.mptr);
        LittleEndian::write_u64(&mut raw[24..32], self.prp1);
        LittleEndian::write_u64(&mut raw[32..40], self.prp2);
        LittleEndian::write_u32(&mut raw[40..44], self.cdw10);
        LittleEndian::write_u32(&mut raw[44..48], self.cdw11);
        LittleEndian::write_u32(&mut raw[48..52], self.cdw12);
        LittleEndian::write_u32(&mut raw[52..56], self.cdw13);
        LittleEndian::write_u32(&mut raw[56..60], self.cdw14);
        LittleEndian::write_u32(&mut raw[60..64], self.cdw15);
        raw
    }

    /// Deserialize from exactly 64 bytes
    ///
    /// A shorter or longer slice is rejected; a partially loaded descriptor
    /// must never reach the device.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() != Self::SIZE {
            return Err(ProtocolError::DescriptorSize {
                needed: Self::SIZE,
                available: raw.len(),
            });
        }

        Ok(Self {
            opcode: raw[0],
            flags: raw[1],
            cid: LittleEndian::read_u16(&raw[2..4]),
            nsid: LittleEndian::read_u32(&raw[4..8]),
            cdw2: LittleEndian::read_u32(&raw[8..12]),
            cdw3: LittleEndian::read_u32(&raw[12..16]),
            mptr: LittleEndian::read_u64(&raw[16..24]),
            prp1: LittleEndian::read_u64(&raw[24..32]),
            prp2: LittleEndian::read_u64(&raw[32..40]),
            cdw10: LittleEndian::read_u32(&raw[40..44]),
            cdw11: LittleEndian::read_u32(&raw[44..48]),
            cdw12: LittleEndian::read_u32(&raw[48..52]),
            cdw13: LittleEndian::read_u32(&raw[52..56]),
            cdw14: LittleEndian::read_u32(&raw[56..60]),
            cdw15: LittleEndian::read_u32(&raw[60..64]),
        })
    }
}

/// Command-specific field groups, one variant per opcode family
///
/// Exactly one layout is active per command, selected by the variant. The
/// namespace id is not part of the fields; callers resolve it once (explicit
/// argument or device default) and pass it to [`CommandFields::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFields {
    Identify {
        cns: u8,
        cntid: u16,
        nvmsetid: u16,
        uuid: u8,
    },
    GetLogPage {
        lid: u8,
        lsp: u8,
        rae: bool,
        lsi: u16,
        offset: u64,
        nbytes: u32,
    },
    GetFeatures {
        fid: u8,
        sel: u8,
        cdw11: u32,
    },
    SetFeatures {
        fid: u8,
        value: u32,
        save: bool,
        cdw12: u32,
    },
    Format {
        lbaf: u8,
        zf: u8,
        mset: u8,
        ses: u8,
        pi: u8,
        pil: u8,
    },
    Sanitize {
        action: u8,
        ause: bool,
        ovrpat: u32,
        owpass: u8,
        oipbp: bool,
        nodas: bool,
    },
    DatasetManagement {
        nr: u32,
        ad: bool,
        idw: bool,
        idr: bool,
    },
    IoMgmtRecv {
        mo: u8,
        mos: u16,
        nbytes: u32,
    },
    IoMgmtSend {
        mo: u8,
        mos: u16,
    },
}

impl CommandFields {
    /// The opcode this field group belongs to
    pub fn opcode(&self) -> u8 {
        match self {
            CommandFields::Identify { .. } => AdminOpcode::Identify as u8,
            CommandFields::GetLogPage { .. } => AdminOpcode::GetLogPage as u8,
            CommandFields::GetFeatures { .. } => AdminOpcode::GetFeatures as u8,
            CommandFields::SetFeatures { .. } => AdminOpcode::SetFeatures as u8,
            CommandFields::Format { .. } => AdminOpcode::FormatNvm as u8,
            CommandFields::Sanitize { .. } => AdminOpcode::Sanitize as u8,
            CommandFields::DatasetManagement { .. } => IoOpcode::DatasetManagement as u8,
            CommandFields::IoMgmtRecv { .. } => IoOpcode::IoMgmtRecv as u8,
            CommandFields::IoMgmtSend { .. } => IoOpcode::IoMgmtSend as u8,
        }
    }

    /// Pack the field group into a submission descriptor
    ///
    /// Pure bit packing per the NVMe dword layouts. Transfer sizes expressed
    /// in dwords on the wire (get-log NUMD, io-mgmt-recv) are zero-based and
    /// derived here from the byte count, so size and fields cannot drift.
    pub fn build(&self, nsid: u32) -> CommandDescriptor {
        let mut cmd = CommandDescriptor {
            opcode: self.opcode(),
            nsid,
            ..Default::default()
        };

        match *self {
            CommandFields::Identify {
                cns,
                cntid,
                nvmsetid,
                uuid,
            } => {
                cmd.cdw10 = u32::from(cns) | (u32::from(cntid) << 16);
                cmd.cdw11 = u32::from(nvmsetid);
                cmd.cdw14 = u32::from(uuid & 0x7F);
            }
            CommandFields::GetLogPage {
                lid,
                lsp,
                rae,
                lsi,
                offset,
                nbytes,
            } => {
                // NUMD is a zero-based dword count split across cdw10/cdw11
                let numd = (nbytes / 4).saturating_sub(1);
                cmd.cdw10 = u32::from(lid)
                    | (u32::from(lsp & 0x7F) << 8)
                    | (u32::from(rae) << 15)
                    | ((numd & 0xFFFF) << 16);
                cmd.cdw11 = (numd >> 16) | (u32::from(lsi) << 16);
                cmd.cdw12 = offset as u32;
                cmd.cdw13 = (offset >> 32) as u32;
            }
            CommandFields::GetFeatures { fid, sel, cdw11 } => {
                cmd.cdw10 = u32::from(fid) | (u32::from(sel & 0x07) << 8);
                cmd.cdw11 = cdw11;
            }
            CommandFields::SetFeatures {
                fid,
                value,
                save,
                cdw12,
            } => {
                cmd.cdw10 = u32::from(fid) | (u32::from(save) << 31);
                cmd.cdw11 = value;
                cmd.cdw12 = cdw12;
            }
            CommandFields::Format {
                lbaf,
                zf,
                mset,
                ses,
                pi,
                pil,
            } => {
                cmd.cdw10 = u32::from(lbaf & 0x0F)
                    | (u32::from(mset & 0x01) << 4)
                    | (u32::from(pi & 0x07) << 5)
                    | (u32::from(pil & 0x01) << 8)
                    | (u32::from(ses & 0x07) << 9)
                    | (u32::from(zf & 0x03) << 12);
            }
            CommandFields::Sanitize {
                action,
                ause,
                ovrpat,
                owpass,
                oipbp,
                nodas,
            } => {
                cmd.cdw10 = u32::from(action & 0x07)
                    | (u32::from(ause) << 3)
                    | (u32::from(owpass & 0x0F) << 4)
                    | (u32::from(oipbp) << 8)
                    | (u32::from(nodas) << 9);
                cmd.cdw11 = ovrpat;
            }
            CommandFields::DatasetManagement { nr, ad, idw, idr } => {
                // Number of ranges is zero-based on the wire
                cmd.cdw10 = nr.saturating_sub(1) & 0xFF;
                cmd.cdw11 =
                    u32::from(idr) | (u32::from(idw) << 1) | (u32::from(ad) << 2);
            }
            CommandFields::IoMgmtRecv { mo, mos, nbytes } => {
                cmd.cdw10 = u32::from(mo) | (u32::from(mos) << 16);
                cmd.cdw11 = (nbytes / 4).saturating_sub(1);
            }
            CommandFields::IoMgmtSend { mo, mos } => {
                cmd.cdw10 = u32::from(mo) | (u32::from(mos) << 16);
            }
        }

        cmd
    }
}

/// One dataset-management range descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DsmRange {
    pub cattr: u32,
    pub nlb: u32,
    pub slba: u64,
}

impl DsmRange {
    /// Fixed on-wire size of a range descriptor
    pub const SIZE: usize = 16;

    /// Serialize to the 16-byte little-endian wire layout
    pub fn write_to(&self, raw: &mut [u8]) -> Result<()> {
        if raw.len() < Self::SIZE {
            return Err(ProtocolError::DescriptorSize {
                needed: Self::SIZE,
                available: raw.len(),
            });
        }
        LittleEndian::write_u32(&mut raw[0..4], self.cattr);
        LittleEndian::write_u32(&mut raw[4..8], self.nlb);
        LittleEndian::write_u64(&mut raw[8..16], self.slba);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_round_trip() {
        let cmd = CommandFields::Identify {
            cns: CNS_CONTROLLER,
            cntid: 0xABCD,
            nvmsetid: 0x1234,
            uuid: 0x05,
        }
        .build(7);

        let raw = cmd.to_bytes();
        let back = CommandDescriptor::from_bytes(&raw).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn test_from_bytes_rejects_short_input() {
        let raw = [0u8; 40];
        let err = CommandDescriptor::from_bytes(&raw).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::DescriptorSize {
                needed: 64,
                available: 40
            }
        ));
    }

    #[test]
    fn test_identify_packing() {
        let cmd = CommandFields::Identify {
            cns: CNS_IO_COMMAND_SET,
            cntid: 0xFFFF,
            nvmsetid: 0,
            uuid: 0,
        }
        .build(0);

        assert_eq!(cmd.opcode, AdminOpcode::Identify as u8);
        assert_eq!(cmd.cdw10 & 0xFF, u32::from(CNS_IO_COMMAND_SET));
        assert_eq!(cmd.cdw10 >> 16, 0xFFFF);
    }

    #[test]
    fn test_get_log_numd_is_zero_based() {
        // 4096 bytes = 1024 dwords = NUMD 1023
        let cmd = CommandFields::GetLogPage {
            lid: LID_ERROR,
            lsp: 0,
            rae: false,
            lsi: 0,
            offset: 0,
            nbytes: 4096,
        }
        .build(1);

        let numd = (cmd.cdw10 >> 16) | ((cmd.cdw11 & 0xFFFF) << 16);
        assert_eq!(numd, 1023);
        assert_eq!(cmd.cdw10 & 0xFF, u32::from(LID_ERROR));
    }

    #[test]
    fn test_get_log_offset_split() {
        let cmd = CommandFields::GetLogPage {
            lid: LID_FDP_EVENTS,
            lsp: 0x01,
            rae: true,
            lsi: 0x0002,
            offset: 0x0000_0001_0000_0200,
            nbytes: 64,
        }
        .build(1);

        assert_eq!(cmd.cdw12, 0x200);
        assert_eq!(cmd.cdw13, 0x1);
        assert_eq!((cmd.cdw10 >> 15) & 0x1, 1);
        assert_eq!(cmd.cdw11 >> 16, 0x0002);
    }

    #[test]
    fn test_set_features_save_bit() {
        let cmd = CommandFields::SetFeatures {
            fid: FID_FDP_EVENTS,
            value: 0xDEAD_BEEF,
            save: true,
            cdw12: 0x77,
        }
        .build(1);

        assert_eq!(cmd.cdw10, u32::from(FID_FDP_EVENTS) | (1 << 31));
        assert_eq!(cmd.cdw11, 0xDEAD_BEEF);
        assert_eq!(cmd.cdw12, 0x77);
    }

    #[test]
    fn test_dsm_range_count_is_zero_based() {
        let cmd = CommandFields::DatasetManagement {
            nr: 1,
            ad: true,
            idw: false,
            idr: false,
        }
        .build(1);

        assert_eq!(cmd.cdw10, 0);
        assert_eq!(cmd.cdw11, 0b100);
    }

    #[test]
    fn test_dsm_range_encoding() {
        let range = DsmRange {
            cattr: 0,
            nlb: 8,
            slba: 0x10,
        };
        let mut raw = [0u8; DsmRange::SIZE];
        range.write_to(&mut raw).unwrap();
        assert_eq!(&raw[4..8], &8u32.to_le_bytes());
        assert_eq!(&raw[8..16], &0x10u64.to_le_bytes());
    }

    #[test]
    fn test_mgmt_recv_dword_count() {
        let cmd = CommandFields::IoMgmtRecv {
            mo: MGMT_RECV_RUHS,
            mos: 0,
            nbytes: 48,
        }
        .build(3);

        assert_eq!(cmd.opcode, IoOpcode::IoMgmtRecv as u8);
        assert_eq!(cmd.cdw11, 11);
        assert_eq!(cmd.nsid, 3);
    }
}
