//! Forwarding HTTP/1.x relay library.

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod relay;
pub mod wire;

pub use config::RelayConfig;
pub use lifecycle::Shutdown;
pub use net::{Acceptor, ConnectionHandler};
pub use relay::{DnsConnector, RelayHandler};
