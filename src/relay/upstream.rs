//! Opening upstream connections.

use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpStream;

use super::RelayError;

/// Opens a connection to the origin named by a Host value.
///
/// The router only depends on this trait, so tests can substitute in-memory
/// streams and observe which hosts were dialled.
pub trait UpstreamConnector: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    fn connect(&self, host: &str) -> impl Future<Output = Result<Self::Stream, RelayError>> + Send;
}

/// Resolves the host through the system resolver and connects over TCP.
///
/// The first resolved address is used. Hosts without an explicit port are
/// dialled on `default_port` (80 unless configured). Unlike a port-80-only
/// relay, an explicit `host:port` Host value is dialled on that port; no other
/// port negotiation takes place.
#[derive(Debug, Clone)]
pub struct DnsConnector {
    default_port: u16,
}

impl DnsConnector {
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }
}

impl Default for DnsConnector {
    fn default() -> Self {
        Self::new(80)
    }
}

impl UpstreamConnector for DnsConnector {
    type Stream = BufReader<TcpStream>;

    async fn connect(&self, host: &str) -> Result<Self::Stream, RelayError> {
        let (name, port) = split_host_port(host);
        let port = port.unwrap_or(self.default_port);

        let addr = tokio::net::lookup_host((name, port))
            .await
            .map_err(|source| RelayError::Resolve {
                host: host.to_string(),
                source,
            })?
            .next()
            .ok_or_else(|| RelayError::NoAddress {
                host: host.to_string(),
            })?;

        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| RelayError::Connect {
                host: host.to_string(),
                addr,
                source,
            })?;

        tracing::debug!(host = %host, address = %addr, "Upstream connected");
        Ok(BufReader::new(stream))
    }
}

/// Split a Host value into name and optional port.
///
/// Bracketed IPv6 literals (`[::1]:8080`) are unwrapped. A suffix that is not
/// a valid port is left as part of the name.
pub fn split_host_port(host: &str) -> (&str, Option<u16>) {
    if let Some(rest) = host.strip_prefix('[') {
        if let Some((name, after)) = rest.split_once(']') {
            let port = after.strip_prefix(':').and_then(|port| port.parse().ok());
            return (name, port);
        }
    }

    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') => match port.parse() {
            Ok(port) => (name, Some(port)),
            Err(_) => (host, None),
        },
        _ => (host, None),
    }
}
