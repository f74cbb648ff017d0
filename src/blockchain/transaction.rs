//! Transaction building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Build payment and asset-creation transactions with fee estimation
//! - Encode them canonically (sorted keys, zero values omitted)
//! - Sign and broadcast transactions
//! - Monitor confirmation over a bounded number of rounds and a deadline

use std::sync::Arc;
use std::time::Duration;

use data_encoding::BASE32_NOPAD;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha512_256};
use tokio::time::timeout;

use crate::blockchain::client::Ledger;
use crate::blockchain::types::{
    Address, BlockchainError, BlockchainResult, Confirmation, MicroAlgos, SuggestedParams,
};
use crate::blockchain::wallet::Wallet;

/// Domain separation prefix for transaction signing and ids.
const TX_PREFIX: &[u8] = b"TX";

/// Bytes a signature adds to the encoded transaction.
const SIGNATURE_OVERHEAD: usize = 75;

/// Upper bound on the note field.
pub const MAX_NOTE_LEN: usize = 1024;

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Transaction type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Payment,
    AssetConfig,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Payment => "pay",
            Self::AssetConfig => "acfg",
        }
    }
}

impl Serialize for TransactionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Parameters of an asset being created.
///
/// Field order follows the encoded key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetParams {
    #[serde(rename = "am", with = "serde_bytes", skip_serializing_if = "Vec::is_empty")]
    pub metadata_hash: Vec<u8>,
    #[serde(rename = "an", skip_serializing_if = "String::is_empty")]
    pub asset_name: String,
    #[serde(rename = "au", skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(rename = "c", skip_serializing_if = "Option::is_none")]
    pub clawback: Option<Address>,
    #[serde(rename = "dc", skip_serializing_if = "is_default")]
    pub decimals: u32,
    #[serde(rename = "df", skip_serializing_if = "is_default")]
    pub default_frozen: bool,
    #[serde(rename = "f", skip_serializing_if = "Option::is_none")]
    pub freeze: Option<Address>,
    #[serde(rename = "m", skip_serializing_if = "Option::is_none")]
    pub manager: Option<Address>,
    #[serde(rename = "r", skip_serializing_if = "Option::is_none")]
    pub reserve: Option<Address>,
    #[serde(rename = "t", skip_serializing_if = "is_default")]
    pub total: u64,
    #[serde(rename = "un", skip_serializing_if = "String::is_empty")]
    pub unit_name: String,
}

/// An unsigned transaction.
///
/// Field order follows the encoded key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    #[serde(rename = "amt", skip_serializing_if = "is_default")]
    pub amount: u64,
    #[serde(rename = "apar", skip_serializing_if = "Option::is_none")]
    pub asset_params: Option<AssetParams>,
    #[serde(rename = "fee", skip_serializing_if = "is_default")]
    pub fee: u64,
    #[serde(rename = "fv", skip_serializing_if = "is_default")]
    pub first_valid: u64,
    #[serde(rename = "gen", skip_serializing_if = "String::is_empty")]
    pub genesis_id: String,
    #[serde(rename = "gh", with = "serde_bytes")]
    pub genesis_hash: Vec<u8>,
    #[serde(rename = "lv", skip_serializing_if = "is_default")]
    pub last_valid: u64,
    #[serde(rename = "note", with = "serde_bytes", skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<u8>,
    #[serde(rename = "rcv", skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Address>,
    #[serde(rename = "snd")]
    pub sender: Address,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

#[derive(Serialize)]
struct SignedEnvelope<'a> {
    #[serde(with = "serde_bytes")]
    sig: Vec<u8>,
    txn: &'a Transaction,
}

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx_id: String,
    pub bytes: Vec<u8>,
}

impl Transaction {
    fn base(
        kind: TransactionType,
        sender: Address,
        note: Vec<u8>,
        params: &SuggestedParams,
    ) -> BlockchainResult<Self> {
        if note.len() > MAX_NOTE_LEN {
            return Err(BlockchainError::Encoding(format!(
                "note is {} bytes, limit is {}",
                note.len(),
                MAX_NOTE_LEN
            )));
        }
        Ok(Self {
            amount: 0,
            asset_params: None,
            fee: 0,
            first_valid: params.first_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash.to_vec(),
            last_valid: params.last_valid,
            note,
            receiver: None,
            sender,
            kind,
        })
    }

    /// Value transfer from `sender` to `receiver`.
    pub fn payment(
        sender: Address,
        receiver: Address,
        amount: MicroAlgos,
        note: Vec<u8>,
        params: &SuggestedParams,
    ) -> BlockchainResult<Self> {
        let mut txn = Self::base(TransactionType::Payment, sender, note, params)?;
        txn.amount = amount.0;
        txn.receiver = Some(receiver);
        txn.apply_fee(params)?;
        Ok(txn)
    }

    /// Creation of a new asset owned by `sender`.
    pub fn asset_create(
        sender: Address,
        asset: AssetParams,
        note: Vec<u8>,
        params: &SuggestedParams,
    ) -> BlockchainResult<Self> {
        let mut txn = Self::base(TransactionType::AssetConfig, sender, note, params)?;
        txn.asset_params = Some(asset);
        txn.apply_fee(params)?;
        Ok(txn)
    }

    fn apply_fee(&mut self, params: &SuggestedParams) -> BlockchainResult<()> {
        let size = self.estimate_size()? as u64;
        self.fee = params.fee_per_byte.saturating_mul(size).max(params.min_fee);
        Ok(())
    }

    /// Canonical MessagePack encoding.
    pub fn encode(&self) -> BlockchainResult<Vec<u8>> {
        rmp_serde::to_vec_named(self).map_err(|e| BlockchainError::Encoding(e.to_string()))
    }

    /// Size of the transaction once signed.
    pub fn estimate_size(&self) -> BlockchainResult<usize> {
        Ok(self.encode()?.len() + SIGNATURE_OVERHEAD)
    }

    fn bytes_to_sign(&self) -> BlockchainResult<Vec<u8>> {
        let encoded = self.encode()?;
        let mut bytes = Vec::with_capacity(TX_PREFIX.len() + encoded.len());
        bytes.extend_from_slice(TX_PREFIX);
        bytes.extend_from_slice(&encoded);
        Ok(bytes)
    }

    /// Transaction id: base32 of the SHA-512/256 digest of the signing bytes.
    pub fn id(&self) -> BlockchainResult<String> {
        let digest = Sha512_256::digest(self.bytes_to_sign()?);
        Ok(BASE32_NOPAD.encode(&digest))
    }

    /// Sign with `wallet`, which must be the sender.
    pub fn sign(&self, wallet: &Wallet) -> BlockchainResult<SignedTransaction> {
        if wallet.address() != self.sender {
            return Err(BlockchainError::Wallet(
                "Signing wallet is not the transaction sender".to_string(),
            ));
        }
        let message = self.bytes_to_sign()?;
        let signature = wallet.sign(&message);
        let bytes = rmp_serde::to_vec_named(&SignedEnvelope {
            sig: signature.to_vec(),
            txn: self,
        })
        .map_err(|e| BlockchainError::Encoding(e.to_string()))?;

        Ok(SignedTransaction {
            tx_id: self.id()?,
            bytes,
        })
    }
}

/// Transaction builder bound to one ledger and one signing wallet.
pub struct TxBuilder {
    ledger: Arc<dyn Ledger>,
    wallet: Wallet,
}

impl TxBuilder {
    /// Create a new transaction builder.
    pub fn new(ledger: Arc<dyn Ledger>, wallet: Wallet) -> Self {
        Self { ledger, wallet }
    }

    /// Fetch current network parameters.
    pub async fn suggested_params(&self) -> BlockchainResult<SuggestedParams> {
        self.ledger.suggested_params().await
    }

    /// Sign `txn` and broadcast it. Returns the transaction id.
    pub async fn submit(&self, txn: &Transaction) -> BlockchainResult<String> {
        let signed = txn.sign(&self.wallet)?;
        let tx_id = self.ledger.submit(&signed.bytes).await?;

        if tx_id != signed.tx_id {
            tracing::warn!(
                local = %signed.tx_id,
                node = %tx_id,
                "Node reported a different transaction id"
            );
        }
        tracing::info!(tx_id = %tx_id, kind = txn.kind.as_str(), "Transaction submitted");
        Ok(tx_id)
    }

    /// Wait for a transaction to be confirmed.
    ///
    /// # Arguments
    /// * `tx_id` - Transaction id to monitor
    /// * `rounds` - Number of rounds to wait before giving up
    /// * `deadline` - Wall-clock bound on the whole wait
    pub async fn wait_for_confirmation(
        &self,
        tx_id: &str,
        rounds: u64,
        deadline: Duration,
    ) -> BlockchainResult<Confirmation> {
        match timeout(deadline, self.poll_confirmation(tx_id, rounds)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    tx_id = %tx_id,
                    deadline_secs = deadline.as_secs_f64(),
                    "Confirmation wait exceeded its deadline"
                );
                Err(BlockchainError::ConfirmationTimeout {
                    tx_id: tx_id.to_string(),
                    rounds,
                })
            }
        }
    }

    async fn poll_confirmation(&self, tx_id: &str, rounds: u64) -> BlockchainResult<Confirmation> {
        let start = self.ledger.status().await?.last_round;
        let end = start.saturating_add(rounds);
        let mut current = start;

        while current < end {
            let pending = self.ledger.pending_transaction(tx_id).await?;

            if let Some(round) = pending.confirmed_round.filter(|r| *r > 0) {
                tracing::info!(tx_id = %tx_id, confirmed_round = round, "Transaction confirmed");
                return Ok(Confirmation {
                    tx_id: tx_id.to_string(),
                    confirmed_round: round,
                    asset_index: pending.asset_index,
                });
            }

            if !pending.pool_error.is_empty() {
                return Err(BlockchainError::PoolRejected {
                    tx_id: tx_id.to_string(),
                    reason: pending.pool_error,
                });
            }

            tracing::debug!(tx_id = %tx_id, round = current, "Transaction pending");
            self.ledger.wait_for_block_after(current).await?;
            current += 1;
        }

        Err(BlockchainError::ConfirmationTimeout {
            tx_id: tx_id.to_string(),
            rounds,
        })
    }

    /// Get the wallet address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}
