//! Chat transport error types.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use crate::connector::SessionState;

/// Errors produced by the chat transport core.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Failed to bind the listener port. Fatal: the listening role
    /// aborts and is not retried.
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Outbound connection did not complete within the timeout.
    #[error("connection timeout to {addr}")]
    ConnectTimeout { addr: SocketAddr },

    /// Could not resolve the peer address.
    #[error("invalid peer address: {0}")]
    InvalidAddress(String),

    /// A second outgoing session was requested while one is open.
    #[error("an outgoing session is already open to {addr}")]
    SessionAlreadyOpen { addr: SocketAddr },

    /// `send` or `disconnect` was called without an open session.
    #[error("no open outgoing session (state: {state})")]
    SessionNotOpen { state: SessionState },

    /// The display name supplied to `connect` was empty.
    #[error("display name must not be empty")]
    EmptyDisplayName,
}

/// Result type for chat transport operations.
pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChatError::ConnectTimeout {
            addr: "10.0.0.1:7341".parse().unwrap(),
        };
        assert_eq!(format!("{}", err), "connection timeout to 10.0.0.1:7341");

        let err = ChatError::SessionNotOpen {
            state: SessionState::Closed,
        };
        assert_eq!(format!("{}", err), "no open outgoing session (state: closed)");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err: ChatError = io_err.into();
        assert!(matches!(err, ChatError::Io(_)));
    }
}
