//! TCP acceptor that hands connections to a handler.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections until shutdown
//! - Optionally enforce `max_connections` via a semaphore
//! - Spawn one task per connection, inside a connection span

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, OwnedSemaphorePermit, Semaphore};
use tracing::Instrument;

use super::ConnectionTracker;
use crate::config::ListenerConfig;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind: {0}")]
    Bind(std::io::Error),
    #[error("failed to accept: {0}")]
    Accept(std::io::Error),
    #[error("connection limiter closed")]
    LimiterClosed,
}

/// Handles one accepted connection from start to finish.
pub trait ConnectionHandler: Send + Sync + 'static {
    fn handle(&self, stream: TcpStream, peer: SocketAddr) -> impl Future<Output = ()> + Send;
}

/// Listening socket plus the optional connection limit.
pub struct Acceptor {
    inner: TcpListener,
    connection_limit: Option<Arc<Semaphore>>,
    tracker: ConnectionTracker,
}

impl Acceptor {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
            ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            max_connections = ?config.max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: config
                .max_connections
                .map(|limit| Arc::new(Semaphore::new(limit))),
            tracker: ConnectionTracker::new(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Tracker counting connections still being handled.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Accept one connection, waiting for a free slot first when limited.
    ///
    /// The permit, if any, must be held for the connection's lifetime.
    pub async fn accept(
        &self,
    ) -> Result<(TcpStream, SocketAddr, Option<OwnedSemaphorePermit>), ListenerError> {
        let permit = match &self.connection_limit {
            Some(limit) => Some(
                Arc::clone(limit)
                    .acquire_owned()
                    .await
                    .map_err(|_| ListenerError::LimiterClosed)?,
            ),
            None => None,
        };

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            active_connections = self.tracker.active_count(),
            "Connection accepted"
        );

        Ok((stream, addr, permit))
    }

    /// Accept connections until `shutdown` fires, handing each to `handler`
    /// on its own task.
    ///
    /// Accept failures are logged and the loop keeps going.
    pub async fn run<H: ConnectionHandler>(
        self,
        handler: Arc<H>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!(
                        active_connections = self.tracker.active_count(),
                        "Acceptor stopping"
                    );
                    return Ok(());
                }
                accepted = self.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        let guard = self.tracker.track();
                        let span = tracing::info_span!("connection", id = %guard.id(), peer = %peer);
                        let handler = Arc::clone(&handler);
                        tokio::spawn(
                            async move {
                                let _permit = permit;
                                let _guard = guard;
                                handler.handle(stream, peer).await;
                            }
                            .instrument(span),
                        );
                    }
                    Err(ListenerError::LimiterClosed) => return Err(ListenerError::LimiterClosed),
                    Err(e) => tracing::error!(error = %e, "Accept failed"),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    fn local_config(max_connections: Option<usize>) -> ListenerConfig {
        ListenerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            max_connections,
        }
    }

    /// Echoes one line back and counts connections.
    #[derive(Default)]
    struct EchoHandler {
        handled: AtomicUsize,
    }

    impl ConnectionHandler for EchoHandler {
        async fn handle(&self, mut stream: TcpStream, _peer: SocketAddr) {
            self.handled.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 4];
            if stream.read_exact(&mut buf).await.is_ok() {
                let _ = stream.write_all(&buf).await;
            }
        }
    }

    #[tokio::test]
    async fn rejects_invalid_bind_address() {
        let config = ListenerConfig {
            bind_address: "not-an-address".to_string(),
            max_connections: None,
        };
        assert!(matches!(Acceptor::bind(&config).await, Err(ListenerError::Bind(_))));
    }

    #[tokio::test]
    async fn hands_each_connection_to_handler() {
        let acceptor = Acceptor::bind(&local_config(None)).await.unwrap();
        let addr = acceptor.local_addr().unwrap();
        let handler = Arc::new(EchoHandler::default());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let server = tokio::spawn(acceptor.run(Arc::clone(&handler), shutdown_rx));

        for _ in 0..3 {
            let mut client = TcpStream::connect(addr).await.unwrap();
            client.write_all(b"ping").await.unwrap();
            let mut reply = [0u8; 4];
            client.read_exact(&mut reply).await.unwrap();
            assert_eq!(&reply, b"ping");
        }
        assert_eq!(handler.handled.load(Ordering::SeqCst), 3);

        shutdown_tx.send(()).unwrap();
        assert!(server.await.unwrap().is_ok());
    }

    /// Poll `condition` every 10ms for up to two seconds.
    async fn eventually(condition: impl Fn() -> bool) -> bool {
        for _ in 0..200 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn connection_limit_applies_backpressure() {
        let acceptor = Acceptor::bind(&local_config(Some(1))).await.unwrap();
        let addr = acceptor.local_addr().unwrap();
        let tracker = acceptor.tracker();
        let handler = Arc::new(EchoHandler::default());
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(acceptor.run(Arc::clone(&handler), shutdown_rx));

        let mut first = TcpStream::connect(addr).await.unwrap();
        let _second = TcpStream::connect(addr).await.unwrap();

        assert!(eventually(|| handler.handled.load(Ordering::SeqCst) >= 1).await);
        // The only permit belongs to the first connection until it finishes.
        assert_eq!(tracker.active_count(), 1);
        assert_eq!(handler.handled.load(Ordering::SeqCst), 1);

        first.write_all(b"done").await.unwrap();
        let mut reply = [0u8; 4];
        first.read_exact(&mut reply).await.unwrap();
        drop(first);

        assert!(eventually(|| handler.handled.load(Ordering::SeqCst) == 2).await);
        assert_eq!(tracker.active_count(), 1);
    }
}
