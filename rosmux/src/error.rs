//! Error types for the dispatch layer.

use std::io;
use thiserror::Error;

/// Errors that can occur while dispatching responses.
///
/// The enum is `Clone` so that a single terminal read error can be
/// broadcast to every outstanding request and still be surfaced through
/// the lifecycle handle. I/O errors are kept as strings for that reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The connection was deliberately shut down.
    ///
    /// Sources report this variant when a read fails because the caller
    /// closed the underlying connection on purpose. It is still delivered
    /// to every pending request (they must be unblocked), but it is
    /// suppressed from the lifecycle notification.
    #[error("API connection closed")]
    ConnectionClosed,

    /// I/O failure while reading from the connection.
    #[error("I/O error: {0}")]
    Io(String),

    /// The sentence stream desynchronized and cannot be resumed.
    #[error("protocol desync: {0}")]
    Protocol(String),

    /// A request's own handler rejected a sentence.
    ///
    /// Local to the tag that produced it; the dispatch loop and all other
    /// tags are unaffected.
    #[error("request failed: {0}")]
    Request(String),
}

impl DispatchError {
    /// Whether this error is the expected-closure signature.
    ///
    /// Expected closures terminate the dispatch loop like any other read
    /// failure but are not reported through [`DispatchHandle`].
    ///
    /// [`DispatchHandle`]: crate::DispatchHandle
    pub fn is_closed(&self) -> bool {
        matches!(self, DispatchError::ConnectionClosed)
    }
}

impl From<io::Error> for DispatchError {
    fn from(error: io::Error) -> Self {
        DispatchError::Io(error.to_string())
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_closed_is_expected() {
        assert!(DispatchError::ConnectionClosed.is_closed());
        assert!(!DispatchError::Io("broken pipe".to_string()).is_closed());
        assert!(!DispatchError::Protocol("bad length".to_string()).is_closed());
        assert!(!DispatchError::Request("!trap".to_string()).is_closed());
    }

    #[test]
    fn test_io_error_conversion_keeps_message() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        let err = DispatchError::from(io_err);
        assert_eq!(err, DispatchError::Io("reset by peer".to_string()));
    }

    #[test]
    fn test_clone_preserves_equality() {
        let err = DispatchError::Protocol("short read".to_string());
        assert_eq!(err.clone(), err);
    }
}
