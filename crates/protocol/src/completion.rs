//! Completion records and the shared success/failure rule
//!
//! Every dispatch variant funnels its outcome through [`evaluate`]: a command
//! succeeded only if the transport returned 0 AND the device-reported status
//! is zero. Centralizing the rule keeps the success check from drifting
//! between variants.

use std::fmt;

use crate::command::FID_FDP_EVENTS;

/// Device-reported completion of one submitted command
///
/// Mirrors the 16-byte completion queue entry. The `status` word carries the
/// phase bit in bit 0; [`status_code`] strips it.
///
/// [`status_code`]: CompletionRecord::status_code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionRecord {
    /// Command-specific result (carries the feature value for get-features)
    pub cdw0: u32,
    pub cdw1: u32,
    /// Submission queue head pointer
    pub sqhd: u16,
    /// Submission queue identifier
    pub sqid: u16,
    /// Command identifier
    pub cid: u16,
    /// Raw status word, phase bit included
    pub status: u16,
}

impl CompletionRecord {
    /// Status with the phase bit stripped; zero means success
    pub fn status_code(&self) -> u16 {
        self.status >> 1
    }

    /// Structured view of the status field
    pub fn status_field(&self) -> StatusField {
        StatusField::from_raw(self.status)
    }
}

impl fmt::Display for CompletionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.status_field();
        write!(
            f,
            "completion: {{cdw0: 0x{:08x}, sqhd: 0x{:04x}, sqid: 0x{:04x}, cid: 0x{:04x}, \
             status: {{sc: 0x{:02x}, sct: 0x{:x}, crd: 0x{:x}, more: {}, dnr: {}}}}}",
            self.cdw0, self.sqhd, self.sqid, self.cid, st.sc, st.sct, st.crd, st.more, st.dnr
        )
    }
}

/// Decoded completion status field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusField {
    /// Status code
    pub sc: u8,
    /// Status code type
    pub sct: u8,
    /// Command retry delay
    pub crd: u8,
    /// More information available in the error log
    pub more: bool,
    /// Do not retry
    pub dnr: bool,
}

impl StatusField {
    /// Decode from the raw status word (phase bit in bit 0)
    pub fn from_raw(raw: u16) -> Self {
        Self {
            sc: ((raw >> 1) & 0xFF) as u8,
            sct: ((raw >> 9) & 0x07) as u8,
            crd: ((raw >> 12) & 0x03) as u8,
            more: (raw >> 14) & 0x1 != 0,
            dnr: (raw >> 15) & 0x1 != 0,
        }
    }
}

/// Why a submitted command is considered failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFault {
    /// The submission call itself failed; the raw code keeps its sign
    /// convention (typically a negated errno) untouched.
    Transport { code: i32 },
    /// The transport accepted the command but the device completed it with a
    /// non-zero status.
    DeviceRejected { completion: CompletionRecord },
}

/// Evaluate one submission outcome
///
/// Returns `Ok(())` only when the transport result is exactly 0 and the
/// device-reported status is zero. The full completion record rides along on
/// the device-rejected path for diagnostic rendering.
pub fn evaluate(transport: i32, completion: &CompletionRecord) -> Result<(), CommandFault> {
    if transport != 0 {
        return Err(CommandFault::Transport { code: transport });
    }
    if completion.status_code() != 0 {
        return Err(CommandFault::DeviceRejected {
            completion: *completion,
        });
    }
    Ok(())
}

/// Feature value returned in completion dword 0 of a get-features command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureValue(pub u32);

impl FeatureValue {
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feature value: 0x{:08x}", self.0)
    }
}

/// One FDP event descriptor from a get-features data buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdpEventDescriptor {
    pub event_type: u8,
    pub enabled: bool,
}

/// Decode the FDP-events feature sub-structure from a data buffer
///
/// Only meaningful when the feature selector was [`FID_FDP_EVENTS`] and a
/// data buffer was transferred; the completion dword 0 holds the number of
/// valid descriptors in its upper 16 bits.
pub fn decode_fdp_events(fid: u8, value: FeatureValue, data: &[u8]) -> Vec<FdpEventDescriptor> {
    if fid != FID_FDP_EVENTS || data.is_empty() {
        return Vec::new();
    }

    let count = ((value.raw() >> 16) & 0xFFFF) as usize;
    data.chunks_exact(2)
        .take(count)
        .map(|pair| FdpEventDescriptor {
            event_type: pair[0],
            enabled: pair[1] & 0x1 != 0,
        })
        .collect()
}
