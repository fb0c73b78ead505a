//! Chunked transfer-encoding, kept byte-for-byte.
//!
//! The relay never re-chunks a body. Every chunk-size line, payload and
//! terminator is copied into the output exactly as received so the body can
//! be retransmitted verbatim.

use tokio::io::AsyncRead;

use super::framer::Limits;
use super::message::decode_latin1;
use super::reader::{read_exact, read_until};
use super::{WireError, CRLF};

/// Outcome of parsing one chunk-size line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkSize {
    Parsed(usize),
    /// The line held no usable hexadecimal size. Framing continues with
    /// [`ChunkSize::SUBSTITUTE`], which ends the body.
    Invalid { line: String },
}

impl ChunkSize {
    /// Size used in place of an unparseable one.
    pub const SUBSTITUTE: usize = 0;

    pub fn size(&self) -> usize {
        match self {
            ChunkSize::Parsed(size) => *size,
            ChunkSize::Invalid { .. } => Self::SUBSTITUTE,
        }
    }
}

/// Parse the hexadecimal size at the start of a chunk-size line.
///
/// Chunk extensions after `;` are ignored.
pub fn parse_chunk_size(line: &[u8]) -> ChunkSize {
    let text = decode_latin1(line);
    let size_text = text
        .split("\r\n")
        .next()
        .unwrap_or("")
        .split(';')
        .next()
        .unwrap_or("")
        .trim();

    match usize::from_str_radix(size_text, 16) {
        Ok(size) => ChunkSize::Parsed(size),
        Err(_) => ChunkSize::Invalid {
            line: text.trim_end().to_string(),
        },
    }
}

/// Read a complete chunked body and return it in wire form.
///
/// For each chunk the size line is copied, then `size + 2` bytes (payload and
/// its CRLF). The zero-size chunk is followed by exactly two more bytes and
/// ends the body; trailer fields are not interpreted.
pub async fn decode_chunked_preserving_wire<R>(
    stream: &mut R,
    limits: &Limits,
) -> Result<Vec<u8>, WireError>
where
    R: AsyncRead + Unpin,
{
    let mut wire = Vec::new();

    loop {
        let line = match read_until(stream, CRLF, limits.max_header_bytes).await {
            Err(WireError::Closed) => {
                return Err(WireError::UnexpectedEof {
                    expected: CRLF.len(),
                    received: 0,
                })
            }
            other => other?,
        };

        let parsed = parse_chunk_size(&line);
        if let ChunkSize::Invalid { line } = &parsed {
            tracing::warn!(
                chunk_line = %line,
                substitute = ChunkSize::SUBSTITUTE,
                "Unparseable chunk size, treating as final chunk"
            );
        }
        wire.extend_from_slice(&line);

        let size = parsed.size();
        let remaining = size
            .checked_add(CRLF.len())
            .ok_or(WireError::BodyTooLarge {
                length: usize::MAX,
                limit: limits.max_body_bytes,
            })?;
        let total = wire.len().saturating_add(remaining);
        if total > limits.max_body_bytes {
            return Err(WireError::BodyTooLarge {
                length: total,
                limit: limits.max_body_bytes,
            });
        }

        let tail = read_exact(stream, remaining).await?;
        wire.extend_from_slice(&tail);

        if size == 0 {
            return Ok(wire);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn decode(input: &[u8]) -> Result<Vec<u8>, WireError> {
        let mut stream = input;
        decode_chunked_preserving_wire(&mut stream, &Limits::default()).await
    }

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_chunk_size(b"4\r\n"), ChunkSize::Parsed(4));
        assert_eq!(parse_chunk_size(b"1A\r\n"), ChunkSize::Parsed(26));
        assert_eq!(parse_chunk_size(b"ff\r\n"), ChunkSize::Parsed(255));
        assert_eq!(parse_chunk_size(b"0\r\n"), ChunkSize::Parsed(0));
        assert_eq!(parse_chunk_size(b"10;name=value\r\n"), ChunkSize::Parsed(16));
    }

    #[test]
    fn invalid_size_is_explicit() {
        let parsed = parse_chunk_size(b"zz\r\n");
        assert_eq!(
            parsed,
            ChunkSize::Invalid {
                line: "zz".to_string()
            }
        );
        assert_eq!(parsed.size(), ChunkSize::SUBSTITUTE);
        assert!(matches!(parse_chunk_size(b"\r\n"), ChunkSize::Invalid { .. }));
    }

    #[tokio::test]
    async fn preserves_single_chunk_body() {
        let input = b"4\r\nabcd\r\n0\r\n\r\n";
        assert_eq!(decode(input).await.unwrap(), input);
    }

    #[tokio::test]
    async fn preserves_multi_chunk_body_with_extensions() {
        let input = b"5;ext=1\r\nhello\r\n1\r\n \r\nB\r\nworld, here\r\n0\r\n\r\n";
        assert_eq!(decode(input).await.unwrap(), input);
    }

    #[tokio::test]
    async fn payload_may_contain_crlf() {
        let input = b"6\r\na\r\nb\r\n\r\n0\r\n\r\n";
        assert_eq!(decode(input).await.unwrap(), input);
    }

    #[tokio::test]
    async fn stops_after_final_terminator() {
        let mut stream: &[u8] = b"3\r\nabc\r\n0\r\n\r\nHTTP/1.1 200 OK\r\n";
        let wire = decode_chunked_preserving_wire(&mut stream, &Limits::default())
            .await
            .unwrap();
        assert_eq!(wire, b"3\r\nabc\r\n0\r\n\r\n");
        assert_eq!(stream, b"HTTP/1.1 200 OK\r\n");
    }

    #[tokio::test]
    async fn unparseable_size_ends_body_softly() {
        let mut stream: &[u8] = b"xyz\r\n\r\nrest";
        let wire = decode_chunked_preserving_wire(&mut stream, &Limits::default())
            .await
            .unwrap();
        assert_eq!(wire, b"xyz\r\n\r\n");
        assert_eq!(stream, b"rest");
    }

    #[tokio::test]
    async fn truncated_chunk_is_an_error() {
        let err = decode(b"a\r\nshort").await.unwrap_err();
        assert!(matches!(err, WireError::UnexpectedEof { expected: 12, received: 5 }));

        let err = decode(b"").await.unwrap_err();
        assert!(matches!(err, WireError::UnexpectedEof { .. }));
    }

    #[tokio::test]
    async fn enforces_body_limit() {
        let mut stream: &[u8] = b"100\r\n";
        let limits = Limits {
            max_header_bytes: 64,
            max_body_bytes: 32,
        };
        let err = decode_chunked_preserving_wire(&mut stream, &limits)
            .await
            .unwrap_err();
        assert!(matches!(err, WireError::BodyTooLarge { limit: 32, .. }));
    }
}
