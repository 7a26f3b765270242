//! Error type for a streaming generation call.

use reqwest::StatusCode;
use thiserror::Error;

/// Boxed underlying cause carried by transport and stream failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Marker cause used when the caller's cancellation token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Errors from a streaming generation call.
///
/// Malformed or blank stream lines are not errors; they are skipped.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StreamError {
    /// The request body could not be encoded. The server was not contacted.
    #[error("failed to encode request: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The connection could not be established, or was aborted before the
    /// response headers arrived.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The server answered with a non-200 status.
    #[error("server returned HTTP {status}: {body}")]
    Server {
        /// Response status.
        status: StatusCode,
        /// Response body, drained for diagnostics. Empty if unreadable.
        body: String,
    },

    /// The body stream failed or was cancelled after decoding had started.
    /// Fragments delivered before the failure remain valid.
    #[error("stream interrupted: {0}")]
    StreamInterrupted(#[source] BoxError),
}

impl StreamError {
    /// Whether this error was caused by the cancellation token.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Transport(source) | Self::StreamInterrupted(source) => source.is::<Cancelled>(),
            _ => false,
        }
    }

    /// HTTP status of a [`StreamError::Server`] error.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn cancelled_before_headers() -> Self {
        Self::Transport(Box::new(Cancelled))
    }

    pub(crate) fn cancelled_mid_stream() -> Self {
        Self::StreamInterrupted(Box::new(Cancelled))
    }
}

/// Map a failure to send the request into a transport error.
pub(crate) fn map_send_error(err: reqwest::Error) -> StreamError {
    StreamError::Transport(Box::new(err))
}

/// Map a body read failure into a stream interruption.
pub(crate) fn map_read_error(err: impl Into<BoxError>) -> StreamError {
    StreamError::StreamInterrupted(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_display_includes_status_and_body() {
        let err = StreamError::Server {
            status: StatusCode::NOT_FOUND,
            body: "model 'foo' not found".into(),
        };
        assert_eq!(
            err.to_string(),
            "server returned HTTP 404 Not Found: model 'foo' not found"
        );
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn cancelled_errors_are_recognised() {
        assert!(StreamError::cancelled_before_headers().is_cancelled());
        assert!(StreamError::cancelled_mid_stream().is_cancelled());
        assert_eq!(
            StreamError::cancelled_mid_stream().to_string(),
            "stream interrupted: operation cancelled"
        );
    }

    #[test]
    fn io_failure_is_not_cancellation() {
        let err = map_read_error(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset by peer",
        ));
        assert!(matches!(err, StreamError::StreamInterrupted(_)));
        assert!(!err.is_cancelled());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn encoding_error_converts_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StreamError = serde_err.into();
        assert!(matches!(err, StreamError::Encoding(_)));
        assert!(err.to_string().starts_with("failed to encode request"));
    }

    #[test]
    fn source_chain_is_preserved() {
        use std::error::Error as _;
        let err = StreamError::cancelled_before_headers();
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "operation cancelled");
    }
}
