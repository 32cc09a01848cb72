//! Unified error handling for slirc-client.
//!
//! Connection-level failures live in [`ConnectionError`]; everything a
//! caller of [`Client`](crate::Client) can see is a [`ClientError`].

use std::time::Duration;

use slirc_proto::ProtocolError;
use thiserror::Error;

use crate::config::ConfigError;

// ============================================================================
// Connection Errors (transport lifecycle)
// ============================================================================

/// Errors raised while opening, using or closing the server connection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectionError {
    #[error("not connected")]
    NotConnected,

    #[error("already connected")]
    AlreadyConnected,

    /// Fatal: handshake, TLS or proxy failure, or socket retries exhausted.
    #[error("could not connect to {address}:{port}: {reason}")]
    CouldNotConnect {
        address: String,
        port: u16,
        reason: String,
    },

    #[error("no reply to keepalive probe within {0:?}")]
    PingTimeout(Duration),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ConnectionError {
    /// Whether a connect attempt that failed with this error may be retried
    /// against the next candidate address.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Protocol(ProtocolError::Io(_)) => true,
            Self::NotConnected
            | Self::AlreadyConnected
            | Self::CouldNotConnect { .. }
            | Self::PingTimeout(_)
            | Self::Protocol(_) => false,
        }
    }

    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::AlreadyConnected => "already_connected",
            Self::CouldNotConnect { .. } => "could_not_connect",
            Self::PingTimeout(_) => "ping_timeout",
            Self::Io(_) => "io_error",
            Self::Protocol(_) => "protocol_error",
        }
    }
}

// ============================================================================
// Client Errors (public API)
// ============================================================================

/// Errors returned by the public [`Client`](crate::Client) API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A list fetch was released because the connection went away.
    #[error("list fetch aborted by disconnect")]
    FetchAborted,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("client must be created inside a tokio runtime")]
    NoRuntime,
}

impl ClientError {
    /// The connection error, if this is one.
    pub fn as_connection(&self) -> Option<&ConnectionError> {
        match self {
            Self::Connection(e) => Some(e),
            _ => None,
        }
    }
}

/// Convenience alias for client results.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_errors_are_retryable() {
        let err = ConnectionError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(err.is_retryable());
        assert_eq!(err.error_code(), "io_error");
    }

    #[test]
    fn test_could_not_connect_is_fatal() {
        let err = ConnectionError::CouldNotConnect {
            address: "irc.example.net".into(),
            port: 6697,
            reason: "tls handshake failed".into(),
        };
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "could not connect to irc.example.net:6697: tls handshake failed"
        );
    }

    #[test]
    fn test_client_error_wraps_connection() {
        let err: ClientError = ConnectionError::NotConnected.into();
        assert!(matches!(err.as_connection(), Some(ConnectionError::NotConnected)));
        assert_eq!(err.to_string(), "not connected");
    }
}
