//! Wire-level HTTP/1.x framing subsystem.
//!
//! # Data Flow
//! ```text
//! Socket bytes
//!     → reader.rs (read_exact / read_until, forward-only)
//!     → framer.rs (header block, Content-Length, chunked detection)
//!     → chunked.rs (chunked bodies kept in wire form)
//!     → message.rs (HttpMessage: header lines + optional body)
//! ```
//!
//! # Design Decisions
//! - Nothing consumed from a stream is ever pushed back
//! - Messages are relayed as bytes, never re-encoded
//! - Header text is ISO-8859-1 so every octet round-trips

pub mod chunked;
pub mod error;
pub mod framer;
pub mod message;
pub mod reader;

pub use chunked::{decode_chunked_preserving_wire, parse_chunk_size, ChunkSize};
pub use error::WireError;
pub use framer::{content_length, is_chunked, read_body, read_headers, Limits};
pub use message::HttpMessage;
pub use reader::{read_exact, read_until};

/// Line terminator used by HTTP/1.x.
pub const CRLF: &[u8] = b"\r\n";

/// Empty line closing a header block.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
