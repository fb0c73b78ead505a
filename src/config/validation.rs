//! Configuration validation.
//!
//! Pure function over a parsed config: `RelayConfig → Result<(), Vec<ValidationError>>`.

use std::net::SocketAddr;

use thiserror::Error;

use super::schema::RelayConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not an ip:port pair")]
    InvalidBindAddress(String),
    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,
    #[error("upstream.default_port must be greater than zero")]
    ZeroUpstreamPort,
    #[error("limits.max_header_bytes must be at least 4")]
    HeaderLimitTooSmall,
    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,
    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
}

/// Check every semantic rule, collecting all violations.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_connections == Some(0) {
        errors.push(ValidationError::ZeroMaxConnections);
    }
    if config.upstream.default_port == 0 {
        errors.push(ValidationError::ZeroUpstreamPort);
    }
    if config.limits.max_header_bytes < 4 {
        errors.push(ValidationError::HeaderLimitTooSmall);
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
