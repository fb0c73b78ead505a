//! Forwarding HTTP/1.x relay.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client                              RELAY                                Origin
//!   ─────────▶ net::Acceptor ─▶ relay::Session ─▶ relay::UpstreamRouter ─────────▶
//!                                   │   ▲                  (Unbound / Bound(host))
//!                                   ▼   │
//!                            wire (read_until / read_exact,
//!                                  headers, Content-Length, chunked)
//!   ◀──────────────────────────── response relayed byte-for-byte ◀───────────────
//! ```
//!
//! Usage: `http-relay [ip] [port] [--config relay.toml]`

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use http_relay::config::{load_config, validate_config, ConfigError, RelayConfig};
use http_relay::lifecycle::{shutdown_signal, Shutdown};
use http_relay::net::Acceptor;
use http_relay::observability::init_logging;
use http_relay::relay::{DnsConnector, RelayHandler};

#[derive(Debug, Parser)]
#[command(name = "http-relay")]
#[command(about = "Forwarding HTTP/1.x relay", long_about = None)]
#[command(after_help = "Example: http-relay 127.0.0.1 45500")]
struct Cli {
    /// IP address to listen on
    #[arg(requires = "port")]
    ip: Option<IpAddr>,

    /// Port to listen on
    port: Option<u16>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    init_logging(&config.observability)?;
    tracing::info!("http-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = ?config.listener.max_connections,
        upstream_default_port = config.upstream.default_port,
        max_header_bytes = config.limits.max_header_bytes,
        max_body_bytes = config.limits.max_body_bytes,
        "Configuration loaded"
    );

    let acceptor = Acceptor::bind(&config.listener).await?;
    tracing::info!(address = %acceptor.local_addr()?, "Listening for connections");

    let handler = Arc::new(RelayHandler::new(
        DnsConnector::new(config.upstream.default_port),
        config.limits,
    ));

    let shutdown = Shutdown::new();
    let acceptor_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    acceptor.run(handler, acceptor_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Config file (or defaults), with the listen ip/port arguments applied.
fn resolve_config(cli: &Cli) -> Result<RelayConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    if let (Some(ip), Some(port)) = (cli.ip, cli.port) {
        config.listener.bind_address = SocketAddr::new(ip, port).to_string();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn ip_and_port_override_bind_address() {
        let cli = Cli::try_parse_from(["http-relay", "10.0.0.5", "45500"]).unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.listener.bind_address, "10.0.0.5:45500");
    }

    #[test]
    fn ipv6_listen_address() {
        let cli = Cli::try_parse_from(["http-relay", "::1", "8080"]).unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.listener.bind_address, "[::1]:8080");
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["http-relay", "not-an-ip", "8080"]).is_err());
        assert!(Cli::try_parse_from(["http-relay", "127.0.0.1", "port"]).is_err());
        assert!(Cli::try_parse_from(["http-relay", "127.0.0.1", "70000"]).is_err());
        assert!(Cli::try_parse_from(["http-relay", "127.0.0.1"]).is_err());
        assert!(Cli::try_parse_from(["http-relay", "127.0.0.1", "1", "2"]).is_err());
    }

    #[test]
    fn no_arguments_uses_defaults() {
        let cli = Cli::try_parse_from(["http-relay"]).unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config, RelayConfig::default());
    }
}
