//! Errors raised while framing messages off a byte stream.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    /// Underlying transport failure.
    #[error("wire IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream before the first byte of a new message.
    #[error("peer closed the connection")]
    Closed,

    /// The stream ended part way through a message.
    #[error("connection closed after {received} of {expected} bytes")]
    UnexpectedEof { expected: usize, received: usize },

    /// The stream ended before a terminator was seen.
    #[error("connection closed inside an unterminated line after {received} bytes")]
    Unterminated { received: usize },

    /// A header block or chunk-size line grew past the configured limit.
    #[error("header section exceeds {limit} bytes")]
    HeaderTooLarge { limit: usize },

    /// A body grew past the configured limit.
    #[error("body of {length} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { length: usize, limit: usize },

    #[error("invalid Content-Length value {0:?}")]
    InvalidContentLength(String),
}

impl WireError {
    /// True when the peer went away cleanly between messages.
    pub fn is_closed(&self) -> bool {
        matches!(self, WireError::Closed)
    }
}
