//! Transfer-buffer sizing for variable-length results
//!
//! Entry count and byte size are always computed together by one call, using
//! the exact on-wire entry sizes; a buffer sized here always matches the
//! number of entries consumed afterwards.

use crate::error::{ProtocolError, Result};

/// Fixed identify structure size
pub const IDENTIFY_SIZE: usize = 4096;
/// SMART / health log page size
pub const HEALTH_LOG_SIZE: usize = 512;
/// One error-information log entry
pub const ERROR_LOG_ENTRY_SIZE: usize = 64;
/// Reclaim-unit-handle-usage log header
pub const RUHU_HEADER_SIZE: usize = 8;
/// One reclaim-unit-handle-usage descriptor
pub const RUHU_DESC_SIZE: usize = 8;
/// Reclaim-unit-handle-status header
pub const RUHS_HEADER_SIZE: usize = 16;
/// One reclaim-unit-handle-status descriptor
pub const RUHS_DESC_SIZE: usize = 32;
/// FDP statistics log page size
pub const FDP_STATS_LOG_SIZE: usize = 64;
/// FDP events log header
pub const FDP_EVENTS_HEADER_SIZE: usize = 64;
/// One FDP event
pub const FDP_EVENT_SIZE: usize = 64;
/// One placement identifier in a reclaim-unit-handle update list
pub const PLACEMENT_ID_SIZE: usize = 2;

/// Entry count and total buffer size for one result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizedResult {
    /// Number of fixed-size entries the buffer holds
    pub entries: u32,
    /// Total transfer size in bytes
    pub nbytes: usize,
}

/// Result shapes with a header followed by a caller-limited entry list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountedKind {
    ReclaimUnitHandleUsage,
    ReclaimUnitHandleStatus,
    FdpEvents,
}

impl CountedKind {
    fn header_size(&self) -> usize {
        match self {
            CountedKind::ReclaimUnitHandleUsage => RUHU_HEADER_SIZE,
            CountedKind::ReclaimUnitHandleStatus => RUHS_HEADER_SIZE,
            CountedKind::FdpEvents => FDP_EVENTS_HEADER_SIZE,
        }
    }

    fn entry_size(&self) -> usize {
        match self {
            CountedKind::ReclaimUnitHandleUsage => RUHU_DESC_SIZE,
            CountedKind::ReclaimUnitHandleStatus => RUHS_DESC_SIZE,
            CountedKind::FdpEvents => FDP_EVENT_SIZE,
        }
    }
}

/// Fixed-shape results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedKind {
    Identify,
    HealthLog,
    FdpStats,
}

/// Size an error-information log request
///
/// The device-reported bound is zero-based: a stored value of N means N+1
/// entries. An explicit limit, when given, is used verbatim instead.
pub fn error_log(limit: Option<u32>, reported_bound: u8) -> SizedResult {
    let entries = match limit {
        Some(n) if n > 0 => n,
        _ => u32::from(reported_bound) + 1,
    };
    SizedResult {
        entries,
        nbytes: entries as usize * ERROR_LOG_ENTRY_SIZE,
    }
}

/// Size a header-plus-entries result from an explicit limit
///
/// The limit is required and must be greater than zero; this is checked
/// before any buffer exists.
pub fn counted(kind: CountedKind, limit: u32) -> Result<SizedResult> {
    if limit == 0 {
        return Err(ProtocolError::InvalidArgument(
            "entry limit must be greater than zero".into(),
        ));
    }
    Ok(SizedResult {
        entries: limit,
        nbytes: kind.header_size() + limit as usize * kind.entry_size(),
    })
}

/// Size a fixed-shape result
pub fn fixed(kind: FixedKind) -> SizedResult {
    let nbytes = match kind {
        FixedKind::Identify => IDENTIFY_SIZE,
        FixedKind::HealthLog => HEALTH_LOG_SIZE,
        FixedKind::FdpStats => FDP_STATS_LOG_SIZE,
    };
    SizedResult { entries: 1, nbytes }
}

/// Size a result from an explicit caller-supplied byte count
///
/// Used for generic log pages, FDP configuration pages, and feature payloads
/// whose shape this layer does not know. Zero is rejected up front, distinct
/// from an allocation failure later on.
pub fn explicit(nbytes: usize) -> Result<SizedResult> {
    if nbytes == 0 {
        return Err(ProtocolError::InvalidArgument(
            "data byte count required".into(),
        ));
    }
    Ok(SizedResult { entries: 1, nbytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_error_log_bound_is_zero_based() {
        let sized = error_log(None, 63);
        assert_eq!(sized.entries, 64);
        assert_eq!(sized.nbytes, 64 * ERROR_LOG_ENTRY_SIZE);
    }

    #[test]
    fn test_error_log_explicit_limit_wins() {
        let sized = error_log(Some(4), 63);
        assert_eq!(sized.entries, 4);
        assert_eq!(sized.nbytes, 4 * ERROR_LOG_ENTRY_SIZE);
    }

    #[test]
    fn test_error_log_zero_limit_means_unspecified() {
        let sized = error_log(Some(0), 0);
        assert_eq!(sized.entries, 1);
    }

    #[test]
    fn test_counted_sizes() {
        let sized = counted(CountedKind::ReclaimUnitHandleUsage, 8).unwrap();
        assert_eq!(sized.nbytes, RUHU_HEADER_SIZE + 8 * RUHU_DESC_SIZE);

        let sized = counted(CountedKind::ReclaimUnitHandleStatus, 3).unwrap();
        assert_eq!(sized.nbytes, RUHS_HEADER_SIZE + 3 * RUHS_DESC_SIZE);

        let sized = counted(CountedKind::FdpEvents, 2).unwrap();
        assert_eq!(sized.nbytes, FDP_EVENTS_HEADER_SIZE + 2 * FDP_EVENT_SIZE);
    }

    #[test]
    fn test_counted_rejects_zero_limit() {
        for kind in [
            CountedKind::ReclaimUnitHandleUsage,
            CountedKind::ReclaimUnitHandleStatus,
            CountedKind::FdpEvents,
        ] {
            assert!(counted(kind, 0).is_err());
        }
    }

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(fixed(FixedKind::Identify).nbytes, IDENTIFY_SIZE);
        assert_eq!(fixed(FixedKind::HealthLog).nbytes, HEALTH_LOG_SIZE);
        assert_eq!(fixed(FixedKind::FdpStats).nbytes, FDP_STATS_LOG_SIZE);
        assert_eq!(fixed(FixedKind::Identify).entries, 1);
    }

    #[test]
    fn test_explicit_rejects_zero() {
        assert!(explicit(0).is_err());
        assert_eq!(explicit(512).unwrap().nbytes, 512);
    }

    proptest! {
        #[test]
        fn prop_error_log_default_is_bound_plus_one(bound in 0u8..=u8::MAX) {
            let sized = error_log(None, bound);
            prop_assert_eq!(sized.entries, u32::from(bound) + 1);
            prop_assert_eq!(sized.nbytes, sized.entries as usize * ERROR_LOG_ENTRY_SIZE);
        }

        #[test]
        fn prop_counted_size_tracks_limit(limit in 1u32..4096) {
            let sized = counted(CountedKind::FdpEvents, limit).unwrap();
            prop_assert_eq!(sized.entries, limit);
            prop_assert_eq!(
                sized.nbytes,
                FDP_EVENTS_HEADER_SIZE + limit as usize * FDP_EVENT_SIZE
            );
        }
    }
}
