//! Error types for queue operations.

use std::io;
use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors that can occur in queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] duraq_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Element encoding or decoding failed.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the codec failure.
        message: String,
    },

    /// The log is corrupted or invalid.
    ///
    /// Raised during replay for anything other than a truncated trailing
    /// entry: unknown entry tags, undecodable record payloads, or a
    /// tombstone with no live record in front of it.
    #[error("log corruption: {message}")]
    LogCorruption {
        /// Description of the corruption.
        message: String,
    },

    /// An entry payload exceeds what the length field can frame.
    #[error("entry payload too large: {len} bytes")]
    PayloadTooLarge {
        /// Size of the rejected payload.
        len: usize,
    },

    /// The compaction threshold is not a positive integer.
    #[error("invalid compaction threshold: {value} (must be at least 1)")]
    InvalidThreshold {
        /// The rejected threshold value.
        value: usize,
    },
}

impl QueueError {
    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates a log corruption error.
    pub fn log_corruption(message: impl Into<String>) -> Self {
        Self::LogCorruption {
            message: message.into(),
        }
    }
}
