//! Per-connection upstream routing.
//!
//! # States
//! - Unbound: no upstream connection yet
//! - Bound(host): one open connection to `host`
//!
//! # State Transitions
//! ```text
//! Unbound       → Bound(h): first request, connect to h
//! Bound(h)      → Bound(h): same Host, reuse the connection
//! Bound(h)      → Bound(g): Host changed, connect to g, close h
//! ```

use std::sync::Arc;

use tokio::io::AsyncWriteExt;

use super::{RelayError, UpstreamConnector};

struct BoundUpstream<S> {
    host: String,
    stream: S,
}

/// Tracks the single upstream connection owned by one client connection.
pub struct UpstreamRouter<C: UpstreamConnector> {
    connector: Arc<C>,
    bound: Option<BoundUpstream<C::Stream>>,
    opened: usize,
}

impl<C: UpstreamConnector> UpstreamRouter<C> {
    pub fn new(connector: Arc<C>) -> Self {
        Self {
            connector,
            bound: None,
            opened: 0,
        }
    }

    /// Return the connection for `host`, opening a new one if the bound host
    /// differs. A superseded connection is shut down before it is dropped.
    pub async fn route(&mut self, host: &str) -> Result<&mut C::Stream, RelayError> {
        match self.bound.take() {
            Some(current) if current.host == host => Ok(&mut self.bound.insert(current).stream),
            previous => {
                let stream = self.connector.connect(host).await?;
                self.opened += 1;

                if let Some(mut superseded) = previous {
                    tracing::debug!(from = %superseded.host, to = %host, "Host changed, replacing upstream");
                    if let Err(e) = superseded.stream.shutdown().await {
                        tracing::debug!(host = %superseded.host, error = %e, "Upstream shutdown failed");
                    }
                }

                let bound = self.bound.insert(BoundUpstream {
                    host: host.to_string(),
                    stream,
                });
                Ok(&mut bound.stream)
            }
        }
    }

    /// Host of the current upstream connection, if any.
    pub fn bound_host(&self) -> Option<&str> {
        self.bound.as_ref().map(|bound| bound.host.as_str())
    }

    /// Number of upstream connections opened so far.
    pub fn connections_opened(&self) -> usize {
        self.opened
    }
}
