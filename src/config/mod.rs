//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → loader.rs (ALGOD_API override, re-validate)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to handlers
//!
//! Per request:
//!     secrets.rs (SecretSource) → mnemonic, recipient, database credentials
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Secrets never live in GatewayConfig

pub mod loader;
pub mod schema;
pub mod secrets;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    CertificateConfig, GatewayConfig, LedgerConfig, ListenerConfig, ObservabilityConfig,
    SecretsConfig, SecurityConfig, StorageConfig, TimeoutConfig,
};
pub use secrets::{EnvSecrets, SecretSource, StaticSecrets};
