//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → command-line overrides (listen ip/port)
//!     → RelayConfig (immutable for the process lifetime)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults, so no file is needed at all
//! - Validation reports every problem, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig, UpstreamConfig};
pub use validation::{validate_config, ValidationError};
