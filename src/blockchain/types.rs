//! Ledger-specific types and error definitions.

use std::fmt;
use std::str::FromStr;

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha512_256};
use thiserror::Error;

// Re-export LedgerConfig from config module to avoid duplication
pub use crate::config::schema::LedgerConfig;

const ADDRESS_LEN: usize = 58;
const CHECKSUM_LEN: usize = 4;

/// Account address: an Ed25519 public key.
///
/// The textual form is base32 (no padding) of the key followed by the last
/// four bytes of its SHA-512/256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub fn from_public_key(key: [u8; 32]) -> Self {
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let digest = Sha512_256::digest(self.0);
        let mut out = [0u8; CHECKSUM_LEN];
        out.copy_from_slice(&digest[32 - CHECKSUM_LEN..]);
        out
    }
}

impl FromStr for Address {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ADDRESS_LEN {
            return Err(BlockchainError::Address(format!(
                "expected {} characters, got {}",
                ADDRESS_LEN,
                s.len()
            )));
        }

        let decoded = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|e| BlockchainError::Address(format!("not base32: {}", e)))?;
        if decoded.len() != 32 + CHECKSUM_LEN {
            return Err(BlockchainError::Address("wrong decoded length".to_string()));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&decoded[..32]);
        let address = Address(key);

        if address.checksum() != decoded[32..] {
            return Err(BlockchainError::Address("checksum mismatch".to_string()));
        }
        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = Vec::with_capacity(32 + CHECKSUM_LEN);
        raw.extend_from_slice(&self.0);
        raw.extend_from_slice(&self.checksum());
        f.write_str(&BASE32_NOPAD.encode(&raw))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// Addresses travel as raw 32-byte `bin` values inside transactions.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

/// Amount in base units (1 ALGO = 1_000_000 microAlgos).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MicroAlgos(pub u64);

impl MicroAlgos {
    pub const PER_ALGO: u64 = 1_000_000;

    /// Convert a decimal ALGO amount, rounding to the nearest base unit.
    ///
    /// Returns `None` for negative, non-finite, or out-of-range input.
    pub fn from_algos(algos: f64) -> Option<Self> {
        if !algos.is_finite() || algos < 0.0 {
            return None;
        }
        let units = (algos * Self::PER_ALGO as f64).round();
        if units > u64::MAX as f64 {
            return None;
        }
        Some(Self(units as u64))
    }

    /// Six-decimal ALGO string, e.g. `1.500000`.
    pub fn format_algos(self) -> String {
        format!("{}.{:06}", self.0 / Self::PER_ALGO, self.0 % Self::PER_ALGO)
    }
}

impl fmt::Display for MicroAlgos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} microAlgos", self.0)
    }
}

/// Network parameters needed to build a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedParams {
    /// Fee per byte; zero outside congestion.
    pub fee_per_byte: u64,
    pub min_fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
}

/// State of a submitted transaction as reported by the node's pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PendingTransaction {
    /// Present and non-zero once the transaction is in a block.
    pub confirmed_round: Option<u64>,
    /// Id of the asset created by an `acfg` transaction.
    pub asset_index: Option<u64>,
    /// Non-empty when the pool evicted the transaction.
    pub pool_error: String,
}

/// Node status snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NodeStatus {
    pub last_round: u64,
}

/// Account balance information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AccountInfo {
    pub address: String,
    pub amount: u64,
    pub min_balance: u64,
    pub status: String,
}

/// A transaction that made it into a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_id: String,
    pub confirmed_round: u64,
    pub asset_index: Option<u64>,
}

/// Category of a node-side transaction rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    InsufficientFunds,
    InvalidAddress,
    AccountMissing,
    Other,
}

impl RejectionKind {
    /// Classify the node's rejection message.
    ///
    /// The node only reports free text, so this is the single place that
    /// inspects it.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("insufficient funds") || lower.contains("overspend") {
            Self::InsufficientFunds
        } else if lower.contains("invalid address") {
            Self::InvalidAddress
        } else if lower.contains("account does not exist") {
            Self::AccountMissing
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InsufficientFunds => "insufficient funds",
            Self::InvalidAddress => "invalid address",
            Self::AccountMissing => "account missing",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Node unreachable or returned an unexpected response.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Node call timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Node refused the submitted transaction.
    #[error("Transaction rejected ({kind}): {message}")]
    Rejected { kind: RejectionKind, message: String },

    /// Transaction was not confirmed within the wait window.
    #[error("Transaction {tx_id} not confirmed after {rounds} rounds")]
    ConfirmationTimeout { tx_id: String, rounds: u64 },

    /// Transaction was dropped from the pool after submission.
    #[error("Transaction {tx_id} rejected by pool: {reason}")]
    PoolRejected { tx_id: String, reason: String },

    /// Invalid mnemonic or key material.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Malformed address string.
    #[error("Invalid address: {0}")]
    Address(String),

    /// Transaction could not be encoded.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type for ledger operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_address_encoding() {
        assert_eq!(
            Address::ZERO.to_string(),
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ"
        );
    }

    #[test]
    fn test_address_round_trip() {
        let text = "AOQQPP7TZYIL4HLQ3UMOOS6ATFT6JVRQTOSQ2XY53SDGIESVGG4MPFYUMQ";
        let address: Address = text.parse().unwrap();
        assert_eq!(address.as_bytes()[0], 0x03);
        assert_eq!(address.to_string(), text);
    }

    #[test]
    fn test_address_checksum_mismatch() {
        // Last character altered.
        let err = "AOQQPP7TZYIL4HLQ3UMOOS6ATFT6JVRQTOSQ2XY53SDGIESVGG4MPFYUMA"
            .parse::<Address>()
            .unwrap_err();
        assert!(matches!(err, BlockchainError::Address(_)));
    }

    #[test]
    fn test_address_wrong_length() {
        let err = "CHARITYADDRESSHERE123456789012345678901234567890"
            .parse::<Address>()
            .unwrap_err();
        assert!(err.to_string().contains("expected 58 characters"));
    }

    #[test]
    fn test_micro_algos_conversion() {
        assert_eq!(MicroAlgos::from_algos(1.5), Some(MicroAlgos(1_500_000)));
        assert_eq!(MicroAlgos::from_algos(0.001), Some(MicroAlgos(1_000)));
        assert_eq!(MicroAlgos::from_algos(0.1 + 0.2), Some(MicroAlgos(300_000)));
        assert_eq!(MicroAlgos::from_algos(-1.0), None);
        assert_eq!(MicroAlgos::from_algos(f64::NAN), None);
        assert_eq!(MicroAlgos(1_500_000).format_algos(), "1.500000");
        assert_eq!(MicroAlgos(42).format_algos(), "0.000042");
    }

    #[test]
    fn test_rejection_classification() {
        assert_eq!(
            RejectionKind::classify("TransactionPool.Remember: transaction ABC: overspend (account X, data {...})"),
            RejectionKind::InsufficientFunds
        );
        assert_eq!(
            RejectionKind::classify("insufficient funds for fee"),
            RejectionKind::InsufficientFunds
        );
        assert_eq!(RejectionKind::classify("Invalid address"), RejectionKind::InvalidAddress);
        assert_eq!(
            RejectionKind::classify("account does not exist"),
            RejectionKind::AccountMissing
        );
        assert_eq!(RejectionKind::classify("txn dead"), RejectionKind::Other);
    }

    #[test]
    fn test_pending_transaction_from_node_json() {
        let pending: PendingTransaction = serde_json::from_str(
            r#"{"confirmed-round": 123, "asset-index": 77, "pool-error": "", "txn": {}}"#,
        )
        .unwrap();
        assert_eq!(pending.confirmed_round, Some(123));
        assert_eq!(pending.asset_index, Some(77));

        let pending: PendingTransaction = serde_json::from_str(r#"{"pool-error": ""}"#).unwrap();
        assert_eq!(pending.confirmed_round, None);
    }

    #[test]
    fn test_error_display() {
        let err = BlockchainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = BlockchainError::ConfirmationTimeout {
            tx_id: "TX1".into(),
            rounds: 4,
        };
        assert_eq!(err.to_string(), "Transaction TX1 not confirmed after 4 rounds");
    }
}
