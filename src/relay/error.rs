use std::net::SocketAddr;

use thiserror::Error;

use crate::wire::WireError;

/// Failures that end a relay session.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("request has no Host header")]
    MissingHost,

    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no addresses found for {host}")]
    NoAddress { host: String },

    #[error("failed to connect to {host} ({addr}): {source}")]
    Connect {
        host: String,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("upstream {host} closed the connection before responding")]
    UpstreamClosed { host: String },
}
