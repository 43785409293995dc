//! Error types for Glint.

use thiserror::Error;

/// Main error type for Glint operations.
#[derive(Error, Debug)]
pub enum GlintError {
    #[error("out of memory: failed to allocate {0} bytes")]
    OutOfMemory(usize),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("index {index} out of range (limit {limit})")]
    OutOfRange { index: usize, limit: usize },

    #[error("malformed input at byte {offset}: {reason}")]
    MalformedInput { offset: usize, reason: &'static str },

    #[error("input truncated mid-value")]
    Truncated,

    #[error("length prefix or integer does not fit the target representation")]
    LengthOverflow,

    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Result type alias for Glint operations.
pub type Result<T> = std::result::Result<T, GlintError>;

impl GlintError {
    /// Shorthand for an [`GlintError::InvalidArgument`] with a formatted message.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Shorthand for an [`GlintError::Unsupported`] with a formatted message.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}
