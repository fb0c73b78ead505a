//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT (Ctrl-C) → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Trigger → acceptor stops accepting → process exits
//! ```
//!
//! # Design Decisions
//! - In-flight sessions are not drained; nothing in the relay path has a deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
