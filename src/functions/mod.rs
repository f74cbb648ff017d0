//! Gateway functions: donation transfer and certificate minting.
//!
//! # Data Flow
//! ```text
//! raw body
//!     → parse_object (JSON object or InvalidInput)
//!     → request validation (before any external call)
//!     → secrets (mnemonic, recipient, database credentials)
//!     → TxBuilder (params → build → sign → submit → confirm)
//!     → Recorder (best effort; failure becomes a warning)
//!     → receipt
//! ```
//!
//! # Design Decisions
//! - No state is retained between calls; credentials are re-read each time
//! - Nothing is retried here beyond the bounded confirmation wait

pub mod certificate;
pub mod donation;

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::blockchain::{BlockchainError, Ledger, RejectionKind};
use crate::config::{GatewayConfig, SecretSource};
use crate::http::response::ApiError;
use crate::records::Recorder;

pub use certificate::{CertificateReceipt, CertificateRequest, CertificateService};
pub use donation::{DonationReceipt, DonationRequest, DonationService};

/// Longest accepted user id, in bytes.
pub const MAX_USER_ID_LEN: usize = 256;

pub(crate) const INVALID_JSON: &str = "Invalid JSON body. Please provide valid JSON data.";
const NETWORK_UNAVAILABLE: &str = "Failed to connect to Algorand network. Please try again later.";
const INVALID_ADDRESS: &str = "Invalid wallet address configuration. Please contact support.";
const ACCOUNT_MISSING: &str = "Project wallet account not found. Please contact support.";

/// Collaborators shared by both functions.
#[derive(Clone)]
pub struct FunctionContext {
    pub config: Arc<GatewayConfig>,
    pub ledger: Arc<dyn Ledger>,
    pub recorder: Arc<dyn Recorder>,
    pub secrets: Arc<dyn SecretSource>,
}

impl FunctionContext {
    pub fn new(
        config: Arc<GatewayConfig>,
        ledger: Arc<dyn Ledger>,
        recorder: Arc<dyn Recorder>,
        secrets: Arc<dyn SecretSource>,
    ) -> Self {
        Self {
            config,
            ledger,
            recorder,
            secrets,
        }
    }
}

/// Parse a body that must be a JSON object.
pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ApiError::InvalidInput(INVALID_JSON.to_string())),
    }
}

/// A string field that is non-empty after trimming and within length limits.
pub(crate) fn user_id_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    let value = map.get(key)?.as_str()?;
    if value.trim().is_empty() || value.len() > MAX_USER_ID_LEN {
        return None;
    }
    Some(value.to_string())
}

/// A finite, strictly positive JSON number.
pub(crate) fn positive_number(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key)?
        .as_f64()
        .filter(|n| n.is_finite() && *n > 0.0)
}

/// Map a failed parameter fetch or broadcast to the caller-visible error.
///
/// `insufficient_funds` and `generic` carry the function-specific wording.
pub(crate) fn submission_error(
    err: BlockchainError,
    insufficient_funds: &str,
    generic: &str,
) -> ApiError {
    match err {
        BlockchainError::Rejected { kind, message } => {
            tracing::warn!(kind = %kind, node_message = %message, "Submission rejected");
            let text = match kind {
                RejectionKind::InsufficientFunds => insufficient_funds,
                RejectionKind::InvalidAddress => INVALID_ADDRESS,
                RejectionKind::AccountMissing => ACCOUNT_MISSING,
                RejectionKind::Other => generic,
            };
            ApiError::Rejected {
                kind,
                message: text.to_string(),
            }
        }
        other => {
            tracing::error!(error = %other, "Submission failed");
            ApiError::Internal(generic.to_string())
        }
    }
}

pub(crate) fn network_error(err: BlockchainError) -> ApiError {
    tracing::error!(error = %err, "Failed to fetch suggested params");
    ApiError::Network(NETWORK_UNAVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object_rejects_non_objects() {
        assert!(parse_object(br#"{"a":1}"#).is_ok());
        let bodies: [&[u8]; 4] = [b"not json", b"[1,2]", b"\"text\"", b""];
        for body in bodies {
            let err = parse_object(body).unwrap_err();
            assert_eq!(err.to_string(), INVALID_JSON);
        }
    }

    #[test]
    fn test_field_helpers() {
        let map = json!({
            "userId": "  u1 ",
            "blank": "   ",
            "number": 3,
            "amount": 1.5,
            "zero": 0,
            "negative": -2,
            "text": "5"
        });
        let map = map.as_object().unwrap();

        assert_eq!(user_id_field(map, "userId").as_deref(), Some("  u1 "));
        assert_eq!(user_id_field(map, "blank"), None);
        assert_eq!(user_id_field(map, "number"), None);
        assert_eq!(user_id_field(map, "missing"), None);

        assert_eq!(positive_number(map, "amount"), Some(1.5));
        assert_eq!(positive_number(map, "number"), Some(3.0));
        assert_eq!(positive_number(map, "zero"), None);
        assert_eq!(positive_number(map, "negative"), None);
        assert_eq!(positive_number(map, "text"), None);
    }

    #[test]
    fn test_user_id_length_limit() {
        let long = "x".repeat(MAX_USER_ID_LEN + 1);
        let map = json!({ "userId": long });
        assert_eq!(user_id_field(map.as_object().unwrap(), "userId"), None);
    }

    #[test]
    fn test_submission_error_mapping() {
        let err = submission_error(
            BlockchainError::Rejected {
                kind: RejectionKind::AccountMissing,
                message: "account does not exist".into(),
            },
            "no funds",
            "generic",
        );
        assert_eq!(err.to_string(), ACCOUNT_MISSING);

        let err = submission_error(BlockchainError::Timeout(10), "no funds", "generic");
        assert!(matches!(err, ApiError::Internal(ref m) if m == "generic"));
    }
}
