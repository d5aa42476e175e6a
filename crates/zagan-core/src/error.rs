//! Error types for transforms and entropy coders.

use thiserror::Error;

/// Result type alias for all Zagan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Toolkit-wide error type.
///
/// Inside a block, any stage failure aborts the whole block; partial output
/// is discarded by the caller. Nothing is retried and corruption is
/// reported, never silently worked around.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad name, order, range, size or reserved identifier.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed header, bad primary index, decoded length mismatch.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Bit-stream read/write failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Allocation of a large work buffer was refused.
    #[error("resource exhausted: could not allocate {requested_bytes} bytes")]
    ResourceExhausted { requested_bytes: usize },

    /// Unknown transform or codec identifier in the reserved range.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The operation observed a cancellation request between chunks.
    #[error("operation cancelled")]
    Cancelled,

    /// A transform sequence stage failed; carries the slot index.
    #[error("transform stage {index} failed: {source}")]
    Stage {
        index: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Create an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Error::InvalidFormat(message.into())
    }

    /// Create an invalid format error with the byte offset where the
    /// problem was detected.
    pub fn invalid_format_at(message: impl Into<String>, offset: usize) -> Self {
        Error::InvalidFormat(format!("{} at offset {}", message.into(), offset))
    }

    /// Create an unsupported feature error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported(message.into())
    }

    /// Create a resource exhaustion error.
    pub fn resource_exhausted(requested_bytes: usize) -> Self {
        Error::ResourceExhausted { requested_bytes }
    }

    /// Wrap a stage failure with the transform slot index it occurred in.
    pub fn stage(index: usize, source: Error) -> Self {
        Error::Stage {
            index,
            source: Box::new(source),
        }
    }

    /// Get the error kind as a static string, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "invalid_argument",
            Error::InvalidFormat(_) => "invalid_format",
            Error::Io(_) => "io",
            Error::ResourceExhausted { .. } => "resource_exhausted",
            Error::Unsupported(_) => "unsupported",
            Error::Cancelled => "cancelled",
            Error::Stage { .. } => "stage",
        }
    }
}
