//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Secret source (mnemonic, recipient) + config (node URL)
//!     → wallet.rs (mnemonic decoding, signing)
//!     → client.rs (node REST calls with timeouts)
//!     → transaction.rs (build, sign, broadcast, confirm)
//! ```
//!
//! # Security Constraints
//! - The mnemonic is ONLY read from the secret source
//! - Never log key material or sensitive data
//! - All node calls have configurable timeouts
//! - Node rejections are classified in exactly one place

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{AlgodClient, Ledger};
pub use transaction::{AssetParams, SignedTransaction, Transaction, TxBuilder};
pub use types::{
    AccountInfo, Address, BlockchainError, BlockchainResult, Confirmation, MicroAlgos,
    NodeStatus, PendingTransaction, RejectionKind, SuggestedParams,
};
pub use wallet::Wallet;
