//! NVMe protocol types for nvmectl
//!
//! This crate defines the pure protocol layer: command descriptors and their
//! per-opcode field packings, completion records with the shared
//! success/failure rule, and the sizing rules for variable-length results.
//! No I/O and no device access happen here.
//!
//! # Example
//!
//! ```
//! use protocol::{CommandFields, CNS_NAMESPACE, evaluate, CompletionRecord};
//!
//! // Build an identify-namespace descriptor for namespace 1
//! let cmd = CommandFields::Identify {
//!     cns: CNS_NAMESPACE,
//!     cntid: 0,
//!     nvmsetid: 0,
//!     uuid: 0,
//! }
//! .build(1);
//! assert_eq!(cmd.nsid, 1);
//!
//! // A zeroed completion with transport result 0 is a success
//! assert!(evaluate(0, &CompletionRecord::default()).is_ok());
//! ```

pub mod command;
pub mod completion;
pub mod error;
pub mod sizing;

pub use command::{
    AdminOpcode, CNS_CONTROLLER, CNS_IO_COMMAND_SET, CNS_NAMESPACE, CommandDescriptor,
    CommandFields, DsmRange, FID_FDP_EVENTS, IoOpcode, LID_ERROR, LID_FDP_CONFIG, LID_FDP_EVENTS,
    LID_FDP_RUHU, LID_FDP_STATS, LID_HEALTH, MGMT_RECV_RUHS, MGMT_SEND_RUHU,
};
pub use completion::{
    CommandFault, CompletionRecord, FdpEventDescriptor, FeatureValue, StatusField,
    decode_fdp_events, evaluate,
};
pub use error::{ProtocolError, Result};
pub use sizing::{CountedKind, FixedKind, SizedResult};
