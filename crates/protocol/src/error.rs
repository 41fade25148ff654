//! Protocol error types

use thiserror::Error;

/// Protocol-level errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A required selector or size was missing or out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Raw descriptor bytes did not match the fixed descriptor size
    #[error("Descriptor size mismatch: needed {needed} bytes, got {available}")]
    DescriptorSize { needed: usize, available: usize },
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;
