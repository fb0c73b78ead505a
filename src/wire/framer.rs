//! Message framing: header blocks and body length detection.

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use super::chunked::decode_chunked_preserving_wire;
use super::reader::{read_exact, read_until};
use super::{HttpMessage, WireError, HEADER_TERMINATOR};

/// Size limits applied while framing a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Limits {
    /// Largest accepted header block (also bounds each chunk-size line).
    pub max_header_bytes: usize,
    /// Largest accepted body, in wire bytes.
    pub max_body_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_header_bytes: 64 * 1024,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Read a header block up to and including the empty line.
///
/// The returned message has no body yet.
pub async fn read_headers<R>(stream: &mut R, limits: &Limits) -> Result<HttpMessage, WireError>
where
    R: AsyncRead + Unpin,
{
    let block = read_until(stream, HEADER_TERMINATOR, limits.max_header_bytes).await?;
    Ok(HttpMessage::from_header_block(&block))
}

/// Declared Content-Length, or 0 when the field is absent.
///
/// An absent field and `Content-Length: 0` are indistinguishable here.
pub fn content_length(message: &HttpMessage) -> Result<usize, WireError> {
    match message.field("Content-Length") {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| WireError::InvalidContentLength(value.to_string())),
        None => Ok(0),
    }
}

/// True when any Transfer-Encoding field mentions `chunked`.
pub fn is_chunked(message: &HttpMessage) -> bool {
    message.fields().any(|(name, value)| {
        name.eq_ignore_ascii_case("Transfer-Encoding")
            && value.to_ascii_lowercase().contains("chunked")
    })
}

/// Read the body announced by the headers.
///
/// Chunked bodies come back in wire form. A zero length yields `None`.
pub async fn read_body<R>(
    stream: &mut R,
    content_length: usize,
    chunked: bool,
    limits: &Limits,
) -> Result<Option<Vec<u8>>, WireError>
where
    R: AsyncRead + Unpin,
{
    if chunked {
        return decode_chunked_preserving_wire(stream, limits).await.map(Some);
    }

    if content_length == 0 {
        return Ok(None);
    }

    if content_length > limits.max_body_bytes {
        return Err(WireError::BodyTooLarge {
            length: content_length,
            limit: limits.max_body_bytes,
        });
    }

    read_exact(stream, content_length).await.map(Some)
}
