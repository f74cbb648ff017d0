//! `sendDonation`: transfer from the project account to the charity account.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::blockchain::{Address, MicroAlgos, Transaction, TxBuilder, Wallet};
use crate::config::SecretSource;
use crate::functions::{
    network_error, parse_object, positive_number, submission_error, user_id_field,
    FunctionContext,
};
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::records::{DatabaseCredentials, DonationRecord};

/// Smallest accepted donation, in ALGO.
pub const MIN_DONATION_ALGO: f64 = 0.001;

const INVALID_USER_ID: &str = "Invalid or missing userId. Please provide a valid user ID.";
const INVALID_AMOUNT: &str = "Invalid amount. Amount must be a positive number.";
const BELOW_MINIMUM: &str = "Minimum donation amount is 0.001 ALGO.";
const INSUFFICIENT_FUNDS: &str = "Insufficient funds in project wallet. Please contact support.";
const SUBMIT_FAILED: &str = "Failed to submit transaction to blockchain. Please try again.";
const UNCONFIRMED: &str =
    "Transaction submitted but confirmation failed. Please check transaction status manually.";
const SUCCESS: &str = "Thank you for your generous donation! Your contribution has been successfully sent to the charity wallet.";
const RECORDED: &str = " Your donation has been recorded in our database.";
const RECORD_WARNING: &str = "Donation was processed successfully but database recording failed. Transaction is confirmed on blockchain.";

/// Validated donation input.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationRequest {
    pub user_id: String,
    /// Amount in ALGO.
    pub amount: f64,
}

impl DonationRequest {
    /// Parse and validate a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let map = parse_object(body)?;

        let user_id = user_id_field(&map, "userId")
            .ok_or_else(|| ApiError::InvalidInput(INVALID_USER_ID.to_string()))?;
        let amount = positive_number(&map, "amount")
            .ok_or_else(|| ApiError::InvalidInput(INVALID_AMOUNT.to_string()))?;
        if amount < MIN_DONATION_ALGO {
            return Err(ApiError::InvalidInput(BELOW_MINIMUM.to_string()));
        }

        Ok(Self { user_id, amount })
    }

    /// Amount in base units.
    pub fn micro_algos(&self) -> Result<MicroAlgos, ApiError> {
        MicroAlgos::from_algos(self.amount)
            .ok_or_else(|| ApiError::InvalidInput(INVALID_AMOUNT.to_string()))
    }

    /// Note attached to the transfer.
    pub fn note(&self) -> String {
        format!("Donation from user: {}", self.user_id)
    }
}

/// Successful donation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationReceipt {
    pub success: bool,
    pub tx_hash: String,
    pub confirmed_round: u64,
    pub amount: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Executes `sendDonation`.
#[derive(Clone)]
pub struct DonationService {
    ctx: FunctionContext,
}

struct DonationSecrets {
    wallet: Wallet,
    recipient: Address,
    database: DatabaseCredentials,
}

impl DonationService {
    pub fn new(ctx: FunctionContext) -> Self {
        Self { ctx }
    }

    /// Validate, transfer, confirm, record.
    pub async fn send(&self, body: &[u8]) -> Result<DonationReceipt, ApiError> {
        let request = DonationRequest::parse(body)?;
        let amount = request.micro_algos()?;
        let secrets = self.load_secrets()?;

        tracing::info!(
            user_id = %request.user_id,
            amount = %amount,
            sender = %secrets.wallet.address(),
            recipient = %secrets.recipient,
            "Processing donation"
        );

        let builder = TxBuilder::new(self.ctx.ledger.clone(), secrets.wallet);
        let params = builder.suggested_params().await.map_err(network_error)?;

        let txn = Transaction::payment(
            builder.address(),
            secrets.recipient,
            amount,
            request.note().into_bytes(),
            &params,
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build payment");
            ApiError::Internal(SUBMIT_FAILED.to_string())
        })?;

        let tx_id = builder
            .submit(&txn)
            .await
            .map_err(|e| submission_error(e, INSUFFICIENT_FUNDS, SUBMIT_FAILED))?;

        let confirmation = builder
            .wait_for_confirmation(
                &tx_id,
                self.ctx.config.ledger.confirmation_rounds,
                self.ctx.config.ledger.confirmation_timeout(),
            )
            .await
            .map_err(|e| {
                tracing::error!(tx_id = %tx_id, error = %e, "Confirmation failed");
                ApiError::Unconfirmed {
                    message: UNCONFIRMED.to_string(),
                    tx_id: tx_id.clone(),
                }
            })?;

        let record = DonationRecord {
            user_id: request.user_id.clone(),
            amount: request.amount,
            tx_hash: tx_id.clone(),
            timestamp: Utc::now(),
        };

        let mut receipt = DonationReceipt {
            success: true,
            tx_hash: tx_id,
            confirmed_round: confirmation.confirmed_round,
            amount: request.amount,
            message: SUCCESS.to_string(),
            warning: None,
        };

        match self
            .ctx
            .recorder
            .insert_donation(&secrets.database, &record)
            .await
        {
            Ok(()) => receipt.message.push_str(RECORDED),
            Err(e) => {
                tracing::error!(tx_id = %receipt.tx_hash, error = %e, "Failed to record donation");
                metrics::record_record_failure(&self.ctx.config.storage.donations_table);
                receipt.warning = Some(RECORD_WARNING.to_string());
            }
        }

        Ok(receipt)
    }

    fn load_secrets(&self) -> Result<DonationSecrets, ApiError> {
        let names = &self.ctx.config.secrets;
        let source = self.ctx.secrets.as_ref();

        let phrase = source.get(&names.mnemonic_var).ok_or_else(|| {
            ApiError::Configuration(format!(
                "Server configuration error: Missing {}. Please configure your wallet mnemonic.",
                names.mnemonic_var
            ))
        })?;
        let database_url = require(source, &names.database_url_var)?;
        let service_key = require(source, &names.database_key_var)?;

        let wallet = Wallet::from_mnemonic(&phrase).map_err(|e| {
            tracing::error!(error = %e, "Mnemonic rejected");
            ApiError::Configuration(format!(
                "Server configuration error: Invalid {} format. Please check your 25-word mnemonic phrase.",
                names.mnemonic_var
            ))
        })?;

        let recipient = require(source, &names.recipient_var)?
            .parse::<Address>()
            .map_err(|e| {
                tracing::error!(error = %e, "Recipient address rejected");
                ApiError::Configuration(format!(
                    "Server configuration error: Invalid {} format.",
                    names.recipient_var
                ))
            })?;

        Ok(DonationSecrets {
            wallet,
            recipient,
            database: DatabaseCredentials {
                url: database_url,
                service_key,
            },
        })
    }
}

fn require(source: &dyn SecretSource, name: &str) -> Result<String, ApiError> {
    source
        .get(name)
        .ok_or_else(|| ApiError::Configuration(format!("Server configuration error: Missing {}", name)))
}
