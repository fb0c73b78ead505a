//! Connection handler that runs a relay session.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::BufReader;
use tokio::net::TcpStream;

use super::{Session, UpstreamConnector};
use crate::net::ConnectionHandler;
use crate::wire::Limits;

/// Runs one [`Session`] per accepted client connection.
pub struct RelayHandler<C> {
    connector: Arc<C>,
    limits: Limits,
}

impl<C: UpstreamConnector> RelayHandler<C> {
    pub fn new(connector: C, limits: Limits) -> Self {
        Self {
            connector: Arc::new(connector),
            limits,
        }
    }
}

impl<C: UpstreamConnector> ConnectionHandler for RelayHandler<C> {
    async fn handle(&self, stream: TcpStream, peer: SocketAddr) {
        let mut session = Session::new(
            BufReader::new(stream),
            Arc::clone(&self.connector),
            self.limits,
        );

        match session.run().await {
            Ok(()) => tracing::debug!(
                peer = %peer,
                exchanges = session.exchanges(),
                upstream_connections = session.router().connections_opened(),
                "Session finished"
            ),
            Err(e) => tracing::warn!(
                peer = %peer,
                exchanges = session.exchanges(),
                error = %e,
                "Session aborted"
            ),
        }
    }
}
