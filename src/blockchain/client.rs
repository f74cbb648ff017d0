//! Ledger node client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the algod v2 REST endpoint
//! - Query chain state (params, status, pending transactions, accounts)
//! - Broadcast signed transactions and classify rejections
//! - Handle timeouts and network errors gracefully
//! - Provide health check for ledger connectivity

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::time::timeout;

use crate::blockchain::types::{
    AccountInfo, Address, BlockchainError, BlockchainResult, LedgerConfig, NodeStatus,
    PendingTransaction, RejectionKind, SuggestedParams,
};
use crate::observability::metrics;

/// Header carrying the node API token.
pub const ALGOD_TOKEN_HEADER: &str = "X-Algo-API-Token";

/// Capabilities the gateway needs from a ledger node.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current network parameters for building a transaction.
    async fn suggested_params(&self) -> BlockchainResult<SuggestedParams>;

    /// Broadcast a signed transaction. Returns the transaction id.
    async fn submit(&self, signed: &[u8]) -> BlockchainResult<String>;

    /// Pool state of a submitted transaction.
    async fn pending_transaction(&self, tx_id: &str) -> BlockchainResult<PendingTransaction>;

    /// Latest round known to the node.
    async fn status(&self) -> BlockchainResult<NodeStatus>;

    /// Block until the node has seen the round after `round`.
    async fn wait_for_block_after(&self, round: u64) -> BlockchainResult<NodeStatus>;

    /// Balance information for an account.
    async fn account_info(&self, address: &Address) -> BlockchainResult<AccountInfo>;

    /// Check if the node is reachable.
    ///
    /// Returns true if we can query the node status.
    async fn is_healthy(&self) -> bool {
        let healthy = self.status().await.is_ok();
        metrics::record_ledger_health(healthy);
        healthy
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ParamsResponse {
    #[serde(default)]
    fee: u64,
    min_fee: u64,
    last_round: u64,
    genesis_id: String,
    genesis_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    tx_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct NodeErrorBody {
    #[serde(default)]
    message: String,
}

/// HTTP client for an algod node.
#[derive(Clone)]
pub struct AlgodClient {
    http: reqwest::Client,
    base_url: String,
    config: LedgerConfig,
    timeout_duration: Duration,
}

impl AlgodClient {
    /// Create a new node client.
    ///
    /// # Arguments
    /// * `config` - Ledger configuration
    ///
    /// # Returns
    /// A new client or error if the endpoint URL is invalid
    pub fn new(config: LedgerConfig) -> BlockchainResult<Self> {
        url::Url::parse(&config.algod_url).map_err(|e| {
            BlockchainError::Rpc(format!("Invalid node URL '{}': {}", config.algod_url, e))
        })?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| BlockchainError::Rpc(e.to_string()))?;

        tracing::info!(
            algod_url = %config.algod_url,
            timeout_secs = config.rpc_timeout_secs,
            "Ledger client initialized"
        );

        Ok(Self {
            http,
            base_url: config.algod_url.trim_end_matches('/').to_string(),
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            config,
        })
    }

    /// Replace the underlying HTTP client (proxy or TLS settings).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if self.config.algod_token.is_empty() {
            builder
        } else {
            builder.header(ALGOD_TOKEN_HEADER, &self.config.algod_token)
        }
    }

    /// Send with the configured timeout and return status plus body.
    async fn send(&self, builder: reqwest::RequestBuilder) -> BlockchainResult<(u16, String)> {
        let fut = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(BlockchainError::Rpc(e.to_string())),
            Err(_) => Err(BlockchainError::Timeout(self.config.rpc_timeout_secs)),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> BlockchainResult<T> {
        let (status, body) = self.send(self.request(reqwest::Method::GET, path)).await?;
        if !(200..300).contains(&status) {
            return Err(BlockchainError::Rpc(format!(
                "{} returned {}: {}",
                path,
                status,
                node_message(&body)
            )));
        }
        serde_json::from_str(&body)
            .map_err(|e| BlockchainError::Rpc(format!("Malformed response from {}: {}", path, e)))
    }
}

fn node_message(body: &str) -> String {
    serde_json::from_str::<NodeErrorBody>(body)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl Ledger for AlgodClient {
    async fn suggested_params(&self) -> BlockchainResult<SuggestedParams> {
        let params: ParamsResponse = self.get_json("/v2/transactions/params").await?;

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&params.genesis_hash)
            .map_err(|e| BlockchainError::Rpc(format!("Malformed genesis hash: {}", e)))?;
        let genesis_hash: [u8; 32] = decoded
            .try_into()
            .map_err(|_| BlockchainError::Rpc("Genesis hash is not 32 bytes".to_string()))?;

        Ok(SuggestedParams {
            fee_per_byte: params.fee,
            min_fee: params.min_fee,
            first_valid: params.last_round,
            last_valid: params.last_round + self.config.validity_rounds,
            genesis_id: params.genesis_id,
            genesis_hash,
        })
    }

    async fn submit(&self, signed: &[u8]) -> BlockchainResult<String> {
        let builder = self
            .request(reqwest::Method::POST, "/v2/transactions")
            .header(CONTENT_TYPE, "application/x-binary")
            .body(signed.to_vec());
        let (status, body) = self.send(builder).await?;

        if !(200..300).contains(&status) {
            let message = node_message(&body);
            let kind = RejectionKind::classify(&message);
            metrics::record_ledger_submission(false);
            tracing::warn!(status, kind = %kind, message = %message, "Node rejected transaction");
            return Err(BlockchainError::Rejected { kind, message });
        }

        metrics::record_ledger_submission(true);
        let response: SubmitResponse = serde_json::from_str(&body)
            .map_err(|e| BlockchainError::Rpc(format!("Malformed submit response: {}", e)))?;
        Ok(response.tx_id)
    }

    async fn pending_transaction(&self, tx_id: &str) -> BlockchainResult<PendingTransaction> {
        self.get_json(&format!("/v2/transactions/pending/{}", tx_id))
            .await
    }

    async fn status(&self) -> BlockchainResult<NodeStatus> {
        self.get_json("/v2/status").await
    }

    async fn wait_for_block_after(&self, round: u64) -> BlockchainResult<NodeStatus> {
        self.get_json(&format!("/v2/status/wait-for-block-after/{}", round))
            .await
    }

    async fn account_info(&self, address: &Address) -> BlockchainResult<AccountInfo> {
        self.get_json(&format!("/v2/accounts/{}", address)).await
    }
}

impl std::fmt::Debug for AlgodClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgodClient")
            .field("algod_url", &self.config.algod_url)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
