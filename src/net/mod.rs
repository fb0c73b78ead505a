//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, optional connection limit)
//!     → connection.rs (id assignment, active count)
//!     → ConnectionHandler (one spawned task per connection)
//! ```
//!
//! # Design Decisions
//! - Unbounded by default; a limit applies backpressure on accept
//! - Handlers share nothing mutable across connections
//! - Every connection runs inside its own tracing span

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{Acceptor, ConnectionHandler, ListenerError};
