//! Forward-only byte stream reading.
//!
//! Both readers consume exactly what they return: callers never need to push
//! bytes back, and the next read starts where the previous one stopped.

use tokio::io::{AsyncRead, AsyncReadExt};

use super::WireError;

/// Read exactly `n` bytes, accumulating across short reads.
pub async fn read_exact<R>(stream: &mut R, n: usize) -> Result<Vec<u8>, WireError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; n];
    let mut filled = 0;

    while filled < n {
        let read = stream.read(&mut buffer[filled..]).await?;
        if read == 0 {
            return Err(WireError::UnexpectedEof {
                expected: n,
                received: filled,
            });
        }
        filled += read;
    }

    Ok(buffer)
}

/// Read one byte at a time until the accumulated bytes end with `terminator`.
///
/// The returned buffer includes the terminator. A stream that closes before
/// yielding any byte reports [`WireError::Closed`]; one that closes later
/// reports [`WireError::Unterminated`]. More than `limit` bytes without a
/// terminator is [`WireError::HeaderTooLarge`].
pub async fn read_until<R>(
    stream: &mut R,
    terminator: &[u8],
    limit: usize,
) -> Result<Vec<u8>, WireError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    let mut byte = [0u8; 1];

    while !buffer.ends_with(terminator) {
        if buffer.len() >= limit {
            return Err(WireError::HeaderTooLarge { limit });
        }
        let read = stream.read(&mut byte).await?;
        if read == 0 {
            if buffer.is_empty() {
                return Err(WireError::Closed);
            }
            return Err(WireError::Unterminated {
                received: buffer.len(),
            });
        }
        buffer.push(byte[0]);
    }

    Ok(buffer)
}
