//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! Secrets (mnemonic, database key) are never part of this schema; they are
//! read per request through [`crate::config::secrets::SecretSource`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the donation gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Ledger node settings.
    pub ledger: LedgerConfig,

    /// Commemorative certificate asset parameters.
    pub certificate: CertificateConfig,

    /// Hosted table settings.
    pub storage: StorageConfig,

    /// Names of the environment variables holding secrets.
    pub secrets: SecretsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// HTTP hardening.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one request/response in seconds.
    ///
    /// Must leave room for the confirmation wait.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Ledger node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// algod REST endpoint. Overridden by the `ALGOD_API` variable at startup.
    pub algod_url: String,

    /// Optional `X-Algo-API-Token` value. Public endpoints need none.
    pub algod_token: String,

    /// Per-call timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Rounds to wait for confirmation before giving up.
    pub confirmation_rounds: u64,

    /// Wall-clock bound on the confirmation wait in seconds.
    pub confirmation_timeout_secs: u64,

    /// Validity window of a transaction, in rounds.
    pub validity_rounds: u64,
}

impl LedgerConfig {
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            algod_url: "https://testnet-api.algonode.cloud".to_string(),
            algod_token: String::new(),
            rpc_timeout_secs: 10,
            confirmation_rounds: 4,
            confirmation_timeout_secs: 25,
            validity_rounds: 1000,
        }
    }
}

/// Parameters of the minted certificate asset.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CertificateConfig {
    pub asset_name: String,
    pub unit_name: String,
    /// Asset URL prefix; the donor's user id is appended.
    pub url_base: String,
    pub certificate_type: String,
    pub issued_by: String,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            asset_name: "UsheGuard Certificate".to_string(),
            unit_name: "UGC".to_string(),
            url_base: "https://usheguard.app/certificate".to_string(),
            certificate_type: "UsheGuard Donation Certificate".to_string(),
            issued_by: "UsheGuard Platform".to_string(),
        }
    }
}

/// Hosted database table configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub donations_table: String,
    pub certificates_table: String,
    /// Timeout for a single insert in seconds.
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            donations_table: "user_donations".to_string(),
            certificates_table: "donation_certificates".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Environment variable names for secrets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub mnemonic_var: String,
    pub recipient_var: String,
    pub algod_url_var: String,
    pub database_url_var: String,
    pub database_key_var: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            mnemonic_var: "SENDER_MNEMONIC".to_string(),
            recipient_var: "CHARITY_ADDRESS".to_string(),
            algod_url_var: "ALGOD_API".to_string(),
            database_url_var: "SUPABASE_URL".to_string(),
            database_key_var: "SUPABASE_SERVICE_ROLE_KEY".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    pub log_level: String,

    /// `pretty` or `json`.
    pub log_format: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// HTTP hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// Value of `Access-Control-Allow-Origin`.
    pub allowed_origin: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
            allowed_origin: "*".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [ledger]
            confirmation_rounds = 8

            [certificate]
            unit_name = "CERT"
            "#,
        )
        .unwrap();

        assert_eq!(config.ledger.confirmation_rounds, 8);
        assert_eq!(config.ledger.validity_rounds, 1000);
        assert_eq!(config.certificate.unit_name, "CERT");
        assert_eq!(config.certificate.asset_name, "UsheGuard Certificate");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_default_secret_names() {
        let secrets = SecretsConfig::default();
        assert_eq!(secrets.mnemonic_var, "SENDER_MNEMONIC");
        assert_eq!(secrets.database_key_var, "SUPABASE_SERVICE_ROLE_KEY");
    }
}
