//! Error types for spectrolink.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, protocol-layer, and
//! session-lifecycle errors are all captured here.

/// The error type for all spectrolink operations.
///
/// Parser-internal conditions (bad trailers, noise) are not reported through
/// this type at the publish boundary; they surface as
/// [`Diagnostic`](crate::events::Diagnostic) values instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port open/read failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (frame of the wrong length, malformed layout).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for bytes from the device.
    ///
    /// Spectrometers stream continuously, so a timeout on its own is not a
    /// failure; the reader simply polls again.
    #[error("timeout waiting for data")]
    Timeout,

    /// An invalid parameter was passed to a builder or encoder.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The transport has not been opened, or has been closed.
    #[error("not connected")]
    NotConnected,

    /// The connection to the device was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// `start()` was called on a session that is already acquiring.
    #[error("session already started")]
    AlreadyStarted,

    /// The session has been stopped and cannot be restarted.
    #[error("session closed")]
    SessionClosed,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_transport() {
        let e = Error::Transport("port busy".into());
        assert_eq!(e.to_string(), "transport error: port busy");
    }

    #[test]
    fn error_display_protocol() {
        let e = Error::Protocol("frame is 12 bytes, expected 1050".into());
        assert_eq!(
            e.to_string(),
            "protocol error: frame is 12 bytes, expected 1050"
        );
    }

    #[test]
    fn error_display_lifecycle() {
        assert_eq!(Error::AlreadyStarted.to_string(), "session already started");
        assert_eq!(Error::SessionClosed.to_string(), "session closed");
        assert_eq!(Error::NotConnected.to_string(), "not connected");
        assert_eq!(Error::ConnectionLost.to_string(), "connection lost");
    }

    #[test]
    fn error_display_invalid_parameter() {
        let e = Error::InvalidParameter("read_chunk_size must be non-zero".into());
        assert_eq!(
            e.to_string(),
            "invalid parameter: read_chunk_size must be non-zero"
        );
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
