//! `mintCertificate`: one-of-one commemorative asset for a donor.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};

use crate::blockchain::{AssetParams, Transaction, TxBuilder, Wallet};
use crate::config::{validation::MAX_ASSET_URL_LEN, CertificateConfig};
use crate::functions::{
    network_error, parse_object, positive_number, submission_error, user_id_field,
    FunctionContext,
};
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::records::{CertificateRecord, DatabaseCredentials, RecordError};

const MISSING_FIELDS: &str = "Missing required fields: userId and donationAmount";
const MISSING_WALLET: &str = "Server configuration error: Missing wallet credentials";
const USER_ID_TOO_LONG: &str = "userId is too long to appear in a certificate URL.";
const INSUFFICIENT_FUNDS: &str =
    "Insufficient funds in project wallet for certificate minting. Please contact support.";
const MINT_FAILED: &str = "Certificate minting failed. Please try again.";
const UNCONFIRMED: &str = "Certificate transaction submitted but confirmation failed. Please check transaction status manually.";
const NO_ASSET_ID: &str = "Failed to retrieve asset ID from transaction";
const SUCCESS: &str = "Certificate minted successfully! Your unique donation certificate has been created on the Algorand blockchain.";
const RECORD_WARNING: &str = "Certificate minted successfully but database recording failed.";

/// Validated certificate input.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateRequest {
    pub user_id: String,
    /// Donated amount in ALGO.
    pub donation_amount: f64,
}

impl CertificateRequest {
    /// Parse and validate a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let map = parse_object(body)?;
        match (
            user_id_field(&map, "userId"),
            positive_number(&map, "donationAmount"),
        ) {
            (Some(user_id), Some(donation_amount)) => Ok(Self {
                user_id,
                donation_amount,
            }),
            _ => Err(ApiError::InvalidInput(MISSING_FIELDS.to_string())),
        }
    }
}

/// Document describing a certificate, embedded in the creating transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateMetadata {
    pub user_id: String,
    pub donation_amount: f64,
    pub certificate_type: String,
    pub issued_by: String,
    pub issue_date: String,
    pub description: String,
}

impl CertificateMetadata {
    pub fn new(request: &CertificateRequest, config: &CertificateConfig, now: DateTime<Utc>) -> Self {
        Self {
            user_id: request.user_id.clone(),
            donation_amount: request.donation_amount,
            certificate_type: config.certificate_type.clone(),
            issued_by: config.issued_by.clone(),
            issue_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            description: format!(
                "Certificate of donation for {} ALGO to charity",
                request.donation_amount
            ),
        }
    }

    pub fn to_json(&self) -> Result<String, ApiError> {
        serde_json::to_string(self).map_err(|e| ApiError::Internal(e.to_string()))
    }

    /// 32-byte commitment stored in the asset's metadata hash.
    pub fn digest(json: &str) -> Vec<u8> {
        Sha512_256::digest(json.as_bytes()).to_vec()
    }
}

/// Successful mint response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateReceipt {
    pub success: bool,
    pub asa_id: u64,
    pub tx_hash: String,
    pub asset_name: String,
    pub unit_name: String,
    /// Metadata document as a JSON string.
    pub metadata: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Executes `mintCertificate`.
#[derive(Clone)]
pub struct CertificateService {
    ctx: FunctionContext,
}

impl CertificateService {
    pub fn new(ctx: FunctionContext) -> Self {
        Self { ctx }
    }

    /// Validate, create the asset, confirm, record.
    pub async fn mint(&self, body: &[u8]) -> Result<CertificateReceipt, ApiError> {
        let request = CertificateRequest::parse(body)?;
        let cert = &self.ctx.config.certificate;

        let url = format!("{}/{}", cert.url_base.trim_end_matches('/'), request.user_id);
        if url.len() > MAX_ASSET_URL_LEN {
            return Err(ApiError::InvalidInput(USER_ID_TOO_LONG.to_string()));
        }

        let wallet = self.load_wallet()?;
        let database = DatabaseCredentials::from_secrets(
            self.ctx.secrets.as_ref(),
            &self.ctx.config.secrets,
        );

        let metadata = CertificateMetadata::new(&request, cert, Utc::now());
        let metadata_json = metadata.to_json()?;

        tracing::info!(
            user_id = %request.user_id,
            donation_amount = request.donation_amount,
            creator = %wallet.address(),
            "Minting certificate"
        );

        let builder = TxBuilder::new(self.ctx.ledger.clone(), wallet);
        let creator = builder.address();
        let params = builder.suggested_params().await.map_err(network_error)?;

        let asset = AssetParams {
            metadata_hash: CertificateMetadata::digest(&metadata_json),
            asset_name: cert.asset_name.clone(),
            url,
            clawback: Some(creator),
            decimals: 0,
            default_frozen: false,
            freeze: Some(creator),
            manager: Some(creator),
            reserve: Some(creator),
            total: 1,
            unit_name: cert.unit_name.clone(),
        };

        let txn = Transaction::asset_create(
            creator,
            asset,
            metadata_json.clone().into_bytes(),
            &params,
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build asset creation");
            ApiError::Internal(MINT_FAILED.to_string())
        })?;

        let tx_id = builder
            .submit(&txn)
            .await
            .map_err(|e| submission_error(e, INSUFFICIENT_FUNDS, MINT_FAILED))?;

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

        let asa_id = confirmation
            .asset_index
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                tracing::error!(tx_id = %tx_id, "Confirmed asset creation has no asset index");
                ApiError::Unconfirmed {
                    message: NO_ASSET_ID.to_string(),
                    tx_id: tx_id.clone(),
                }
            })?;

        tracing::info!(tx_id = %tx_id, asa_id, "Certificate minted");

        let mut receipt = CertificateReceipt {
            success: true,
            asa_id,
            tx_hash: tx_id,
            asset_name: cert.asset_name.clone(),
            unit_name: cert.unit_name.clone(),
            metadata: metadata_json,
            message: SUCCESS.to_string(),
            warning: None,
        };

        let record = CertificateRecord {
            user_id: request.user_id.clone(),
            asa_id: asa_id.to_string(),
            issue_date: Utc::now(),
            tx_hash: receipt.tx_hash.clone(),
        };
        let recorded: Result<(), RecordError> = match database {
            Some(credentials) => {
                self.ctx
                    .recorder
                    .insert_certificate(&credentials, &record)
                    .await
            }
            None => Err(RecordError::MissingCredentials),
        };

        if let Err(e) = recorded {
            tracing::error!(tx_id = %receipt.tx_hash, error = %e, "Failed to record certificate");
            metrics::record_record_failure(&self.ctx.config.storage.certificates_table);
            receipt.warning = Some(RECORD_WARNING.to_string());
        }

        Ok(receipt)
    }

    fn load_wallet(&self) -> Result<Wallet, ApiError> {
        let names = &self.ctx.config.secrets;
        let phrase = self
            .ctx
            .secrets
            .get(&names.mnemonic_var)
            .ok_or_else(|| ApiError::Configuration(MISSING_WALLET.to_string()))?;

        Wallet::from_mnemonic(&phrase).map_err(|e| {
            tracing::error!(error = %e, "Mnemonic rejected");
            ApiError::Configuration(format!(
                "Server configuration error: Invalid {} format. Please check your 25-word mnemonic phrase.",
                names.mnemonic_var
            ))
        })
    }
}
