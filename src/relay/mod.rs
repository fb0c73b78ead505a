//! Request/response relay subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted client connection
//!     → handler.rs (RelayHandler, one Session per connection)
//!     → session.rs (read request → normalize → forward → read response → reply)
//!     → normalize.rs (absolute-URI request line → origin-form)
//!     → router.rs (Unbound / Bound(host) upstream state)
//!     → upstream.rs (resolve host, connect)
//! ```
//!
//! # Design Decisions
//! - Strict request/response alternation, no pipelining
//! - One upstream connection per client connection, replaced on Host change
//! - Failed writes are counted, not fatal, until the client side fails

pub mod error;
pub mod handler;
pub mod normalize;
pub mod router;
pub mod session;
pub mod upstream;

pub use error::RelayError;
pub use handler::RelayHandler;
pub use normalize::{normalize_request_target, rewrite_request_line};
pub use router::UpstreamRouter;
pub use session::{send_message, SendReport, Session};
pub use upstream::{DnsConnector, UpstreamConnector};
