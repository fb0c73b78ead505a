//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit tracing events
//!     → connection span (id, peer) set by the acceptor
//!     → logging.rs subscriber (EnvFilter, pretty or JSON)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - Exchange summaries at info, full header dumps at debug
//! - `RUST_LOG` overrides the configured level

pub mod logging;

pub use logging::init_logging;
