//! Error handling for Shopfloor
//!
//! Provides error types for the layers of the gateway:
//! - Connection errors (broker and direct-channel transport)
//! - Protocol errors (controller wire protocol, command formatting)
//!
//! All error types use `thiserror` for ergonomic error handling. Nothing in
//! this taxonomy is fatal to the process; every failure is local and
//! recoverable by the caller or by waiting for the next message.

use thiserror::Error;

/// Connection error type
///
/// Represents errors related to communication transports: the MQTT broker
/// link and the direct TCP channel to a single controller.
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    /// The broker transport reports itself disconnected
    #[error("Transport not connected")]
    NotConnected,

    /// Connection attempt timed out
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectTimeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// No reply arrived within the reply window
    #[error("Reply timeout after {timeout_ms}ms")]
    ReplyTimeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Connection lost mid-exchange
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// The reason the connection was lost.
        reason: String,
    },

    /// Failed to reach the peer
    #[error("Failed to connect to {addr}: {reason}")]
    FailedToConnect {
        /// The address that could not be reached.
        addr: String,
        /// The reason the connection failed.
        reason: String,
    },

    /// Publish to the broker failed
    #[error("Publish failed: {reason}")]
    PublishFailed {
        /// The reason the publish failed.
        reason: String,
    },

    /// Generic connection error
    #[error("Connection error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Protocol error type
///
/// Represents errors in the controller wire protocol: command formatting
/// limits and conversations that never reach a defined end.
#[derive(Error, Debug, Clone)]
pub enum ProtocolError {
    /// The peer closed without ever emitting a termination keyword
    #[error("Conversation ended without a termination keyword ({lines_read} lines read)")]
    NoTermination {
        /// Number of lines read before the peer closed.
        lines_read: usize,
    },

    /// A formatted command exceeded the wire limit
    #[error("Command exceeds {limit} bytes, refusing to truncate")]
    CommandTooLong {
        /// The wire limit in bytes.
        limit: usize,
    },

    /// Generic protocol error
    #[error("Protocol error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Main error type for Shopfloor
///
/// A unified error type that can represent any error from the core layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Protocol error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Connection(ConnectionError::ConnectTimeout { .. })
                | Error::Connection(ConnectionError::ReplyTimeout { .. })
        )
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a protocol error
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::from(ConnectionError::NotConnected);
        assert_eq!(err.to_string(), "Transport not connected");

        let err = Error::from(ProtocolError::NoTermination { lines_read: 3 });
        assert_eq!(
            err.to_string(),
            "Conversation ended without a termination keyword (3 lines read)"
        );
    }

    #[test]
    fn test_error_classification() {
        let err = Error::from(ConnectionError::ReplyTimeout { timeout_ms: 5000 });
        assert!(err.is_timeout());
        assert!(err.is_connection_error());
        assert!(!err.is_protocol_error());

        let err = Error::from(ProtocolError::CommandTooLong { limit: 512 });
        assert!(err.is_protocol_error());
        assert!(!err.is_timeout());
    }
}
