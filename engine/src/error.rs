//! Error types for the Satchel engine.

use thiserror::Error;

/// Failure modes of the remote persistence boundary.
///
/// Every variant is recovered from inside the engine - a failed quantity
/// write rolls back to the last known-good value and pulses `error`
/// feedback, a failed order write is logged and ignored. None of these
/// escape the engine's public operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never completed (connection refused, timeout, DNS, ...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("server rejected write: status {0}")]
    Status(u16),

    /// The response body could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Result type for remote store operations.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RemoteError::Transport("connection reset".into());
        assert_eq!(err.to_string(), "transport failure: connection reset");

        let err = RemoteError::Status(503);
        assert_eq!(err.to_string(), "server rejected write: status 503");

        let err = RemoteError::MalformedResponse("unexpected EOF".into());
        assert_eq!(err.to_string(), "malformed response: unexpected EOF");
    }
}
