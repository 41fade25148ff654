//! Shared error taxonomy
//!
//! One variant per failure class in the dispatch pipeline. `InvalidArgument`
//! is the only kind that can occur before any resource has been acquired.

use protocol::{CommandFault, CompletionRecord, ProtocolError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A required size or selector was missing before any device interaction
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A transfer buffer could not be obtained
    #[error("Allocation failed: {0}")]
    Allocation(String),

    /// An external file read or write came up short or failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The submission call itself returned a non-zero result
    #[error("Transport error: {code} ({completion})")]
    Transport { code: i32, completion: CompletionRecord },

    /// The device completed the command with a non-zero status
    #[error("Device rejected command: {completion}")]
    DeviceRejected { completion: CompletionRecord },

    /// Device backend failure (open, enumerate, capability query)
    #[error("Backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Fold a command fault and its completion record into an error
    pub fn from_fault(fault: CommandFault, completion: CompletionRecord) -> Self {
        match fault {
            CommandFault::Transport { code } => Error::Transport { code, completion },
            CommandFault::DeviceRejected { completion } => Error::DeviceRejected { completion },
        }
    }

    /// Process exit code for this error
    ///
    /// The transport code keeps its magnitude so the operator sees the most
    /// specific error the kernel reported.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) => 22,
            Error::Allocation(_) => 12,
            Error::Io(_) => 5,
            Error::Transport { code, .. } => code.unsigned_abs().clamp(1, 125) as i32,
            Error::DeviceRejected { .. } => 125,
            Error::Backend(_) => 19,
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidArgument(msg) => Error::InvalidArgument(msg),
            ProtocolError::DescriptorSize { needed, available } => {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("descriptor needs {needed} bytes, got {available}"),
                ))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
