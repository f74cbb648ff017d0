//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::secrets::SecretSource;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply startup-time environment overrides, then re-validate.
///
/// Only the ledger endpoint is overridable this way; everything secret is
/// read per request instead.
pub fn apply_env_overrides(
    mut config: GatewayConfig,
    source: &dyn SecretSource,
) -> Result<GatewayConfig, ConfigError> {
    if let Some(url) = source.get(&config.secrets.algod_url_var) {
        tracing::info!(algod_url = %url, "Ledger endpoint overridden from environment");
        config.ledger.algod_url = url;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
