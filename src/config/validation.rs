//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, round windows within ledger limits)
//! - Check asset parameters against ledger field limits
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// Ledger-imposed upper bound on `last_valid - first_valid`.
pub const MAX_VALIDITY_ROUNDS: u64 = 1000;
/// Ledger limits on asset parameter lengths, in bytes.
pub const MAX_ASSET_NAME_LEN: usize = 32;
pub const MAX_UNIT_NAME_LEN: usize = 8;
pub const MAX_ASSET_URL_LEN: usize = 96;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    match url::Url::parse(&config.ledger.algod_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "ledger.algod_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "ledger.algod_url",
            format!("invalid URL: {}", e),
        )),
    }

    if config.ledger.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.rpc_timeout_secs", "must be > 0"));
    }

    if config.ledger.confirmation_rounds == 0
        || config.ledger.confirmation_rounds > MAX_VALIDITY_ROUNDS
    {
        errors.push(ValidationError::new(
            "ledger.confirmation_rounds",
            format!("must be within 1..={}", MAX_VALIDITY_ROUNDS),
        ));
    }

    if config.ledger.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "ledger.confirmation_timeout_secs",
            "must be > 0",
        ));
    }

    if config.ledger.validity_rounds == 0 || config.ledger.validity_rounds > MAX_VALIDITY_ROUNDS {
        errors.push(ValidationError::new(
            "ledger.validity_rounds",
            format!("must be within 1..={}", MAX_VALIDITY_ROUNDS),
        ));
    }

    let cert = &config.certificate;
    if cert.asset_name.is_empty() || cert.asset_name.len() > MAX_ASSET_NAME_LEN {
        errors.push(ValidationError::new(
            "certificate.asset_name",
            format!("must be 1..={} bytes", MAX_ASSET_NAME_LEN),
        ));
    }
    if cert.unit_name.is_empty() || cert.unit_name.len() > MAX_UNIT_NAME_LEN {
        errors.push(ValidationError::new(
            "certificate.unit_name",
            format!("must be 1..={} bytes", MAX_UNIT_NAME_LEN),
        ));
    }
    // Leave room for "/<userId>".
    if cert.url_base.len() >= MAX_ASSET_URL_LEN {
        errors.push(ValidationError::new(
            "certificate.url_base",
            format!("must be shorter than {} bytes", MAX_ASSET_URL_LEN),
        ));
    }

    if config.storage.donations_table.is_empty() {
        errors.push(ValidationError::new("storage.donations_table", "must not be empty"));
    }
    if config.storage.certificates_table.is_empty() {
        errors.push(ValidationError::new("storage.certificates_table", "must not be empty"));
    }
    if config.storage.timeout_secs == 0 {
        errors.push(ValidationError::new("storage.timeout_secs", "must be > 0"));
    }

    // Params fetch, submit, bounded confirmation wait, then the record write.
    let budget = config
        .ledger
        .rpc_timeout_secs
        .saturating_mul(2)
        .saturating_add(config.ledger.confirmation_timeout_secs)
        .saturating_add(config.storage.timeout_secs);
    if config.timeouts.request_secs != 0 && config.timeouts.request_secs <= budget {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must exceed the {}s a function may spend on the ledger and storage",
                budget
            ),
        ));
    }

    let obs = &config.observability;
    if obs.log_format != "pretty" && obs.log_format != "json" {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("expected 'pretty' or 'json', got '{}'", obs.log_format),
        ));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.ledger.validity_rounds = 5000;
        config.certificate.unit_name = "TOOLONGUNIT".into();
        config.observability.log_format = "xml".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "ledger.validity_rounds",
                "certificate.unit_name",
                "observability.log_format",
            ]
        );
    }

    #[test]
    fn test_confirmation_rounds_bounded() {
        for rounds in [0, MAX_VALIDITY_ROUNDS + 1, u64::MAX] {
            let mut config = GatewayConfig::default();
            config.ledger.confirmation_rounds = rounds;
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors.len(), 1, "rounds: {}", rounds);
            assert_eq!(errors[0].field, "ledger.confirmation_rounds");
        }

        let mut config = GatewayConfig::default();
        config.ledger.confirmation_rounds = MAX_VALIDITY_ROUNDS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_request_timeout_covers_function_work() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 3;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");
        assert!(errors[0].message.contains("55s"));

        // 2 * rpc + confirmation + storage == request is still too tight.
        config.timeouts.request_secs = 55;
        assert!(validate_config(&config).is_err());

        config.timeouts.request_secs = 56;
        assert!(validate_config(&config).is_ok());

        config.ledger.confirmation_timeout_secs = u64::MAX;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "timeouts.request_secs");
    }

    #[test]
    fn test_rejects_non_http_ledger_url() {
        let mut config = GatewayConfig::default();
        config.ledger.algod_url = "ftp://node.example".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("unsupported scheme"));
    }
}
