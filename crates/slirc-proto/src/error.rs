//! Error types for the IRC protocol library.
//!
//! This module defines error types for line framing failures and
//! message parsing failures.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured text encoding label is not known to encoding_rs.
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Line exceeded maximum allowed length.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    LineTooLong {
        /// Actual line length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// Failed to parse an IRC message.
    #[error("invalid message: {string:?}")]
    InvalidMessage {
        /// The invalid message string.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },
}

/// Errors encountered when parsing IRC messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Message was empty (or only whitespace / line terminators).
    #[error("empty message")]
    EmptyMessage,

    /// Command was missing, or neither a word nor a 3-digit numeric.
    #[error("invalid command at position {position}")]
    InvalidCommand {
        /// Byte offset where the command was expected.
        position: usize,
    },

    /// A `:` prefix token with nothing after it.
    #[error("empty prefix")]
    EmptyPrefix,
}
