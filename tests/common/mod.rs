//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use data_encoding::BASE32_NOPAD;
use rmpv::Value;
use sha2::{Digest, Sha512_256};
use tokio::net::TcpListener;

use donation_gateway::blockchain::{
    AccountInfo, Address, BlockchainError, BlockchainResult, Ledger, NodeStatus,
    PendingTransaction, RejectionKind, SuggestedParams,
};
use donation_gateway::config::{GatewayConfig, StaticSecrets};
use donation_gateway::records::MemoryRecorder;
use donation_gateway::{FunctionContext, HttpServer, Shutdown};
use donation_sdk::DonationClient;

/// Seed 0x00..0x1f. Publicly known test key.
pub const TEST_MNEMONIC: &str = "cactus amount account expect army achieve embark anxiety lift crouch mandate abstract captain setup party bench tissue gate arrive random deal mansion wedding abandon curtain";
pub const SENDER_ADDRESS: &str = "AOQQPP7TZYIL4HLQ3UMOOS6ATFT6JVRQTOSQ2XY53SDGIESVGG4MPFYUMQ";
/// Address of seed [7; 32].
pub const CHARITY_ADDRESS: &str = "5JFGYY7CTRJAVPXVKB5RGLWF7GKUO5VOX27HXESCD3VGSFCG2IWAKDM5YU";

pub const FIRST_ASSET_ID: u64 = 700_000;
const START_ROUND: u64 = 1_000;

/// Every secret both functions need.
pub fn full_secrets() -> StaticSecrets {
    StaticSecrets::new([
        ("SENDER_MNEMONIC", TEST_MNEMONIC),
        ("CHARITY_ADDRESS", CHARITY_ADDRESS),
        ("SUPABASE_URL", "http://127.0.0.1:9"),
        ("SUPABASE_SERVICE_ROLE_KEY", "test-service-key"),
    ])
}

/// In-process ledger with switchable failure modes.
pub struct FakeLedger {
    round: AtomicU64,
    next_asset: AtomicU64,
    pub params_calls: AtomicU64,
    pub submit_calls: AtomicU64,
    pub params_fail: AtomicBool,
    pub never_confirm: AtomicBool,
    pub omit_asset_index: AtomicBool,
    pub unreachable: AtomicBool,
    /// Milliseconds each `wait_for_block_after` takes.
    pub block_delay_ms: AtomicU64,
    pub reject_with: Mutex<Option<String>>,
    pub pool_error: Mutex<String>,
    /// Decoded `txn` maps of every accepted submission.
    pub submitted: Mutex<Vec<Value>>,
    assets: Mutex<HashMap<String, u64>>,
}

impl Default for FakeLedger {
    fn default() -> Self {
        Self {
            round: AtomicU64::new(START_ROUND),
            next_asset: AtomicU64::new(FIRST_ASSET_ID),
            params_calls: AtomicU64::new(0),
            submit_calls: AtomicU64::new(0),
            params_fail: AtomicBool::new(false),
            never_confirm: AtomicBool::new(false),
            omit_asset_index: AtomicBool::new(false),
            unreachable: AtomicBool::new(false),
            block_delay_ms: AtomicU64::new(0),
            reject_with: Mutex::new(None),
            pool_error: Mutex::new(String::new()),
            submitted: Mutex::new(Vec::new()),
            assets: Mutex::new(HashMap::new()),
        }
    }
}

impl FakeLedger {
    /// Total calls that reached the ledger.
    pub fn calls(&self) -> u64 {
        self.params_calls.load(Ordering::SeqCst) + self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn reject(&self, message: &str) {
        *self.reject_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn last_txn(&self) -> Value {
        self.submitted
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no transaction submitted")
    }
}

/// Look up `key` in a decoded msgpack map.
pub fn field<'a>(map: &'a Value, key: &str) -> Option<&'a Value> {
    map.as_map()?
        .iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

pub fn keys(map: &Value) -> Vec<String> {
    map.as_map()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(k, _)| k.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn suggested_params(&self) -> BlockchainResult<SuggestedParams> {
        self.params_calls.fetch_add(1, Ordering::SeqCst);
        if self.params_fail.load(Ordering::SeqCst) {
            return Err(BlockchainError::Rpc("connection refused".to_string()));
        }
        let round = self.round.load(Ordering::SeqCst);
        Ok(SuggestedParams {
            fee_per_byte: 0,
            min_fee: 1_000,
            first_valid: round,
            last_valid: round + 1_000,
            genesis_id: "testnet-v1.0".to_string(),
            genesis_hash: [7u8; 32],
        })
    }

    async fn submit(&self, signed: &[u8]) -> BlockchainResult<String> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.reject_with.lock().unwrap().clone() {
            return Err(BlockchainError::Rejected {
                kind: RejectionKind::classify(&message),
                message,
            });
        }

        let envelope = rmpv::decode::read_value(&mut &signed[..])
            .map_err(|e| BlockchainError::Encoding(e.to_string()))?;
        let txn = field(&envelope, "txn")
            .cloned()
            .ok_or_else(|| BlockchainError::Encoding("missing txn".to_string()))?;

        let mut encoded = Vec::new();
        rmpv::encode::write_value(&mut encoded, &txn)
            .map_err(|e| BlockchainError::Encoding(e.to_string()))?;
        let mut preimage = b"TX".to_vec();
        preimage.extend_from_slice(&encoded);
        let tx_id = BASE32_NOPAD.encode(&Sha512_256::digest(&preimage));

        if field(&txn, "type").and_then(Value::as_str) == Some("acfg") {
            let asset = self.next_asset.fetch_add(1, Ordering::SeqCst);
            self.assets.lock().unwrap().insert(tx_id.clone(), asset);
        }
        self.submitted.lock().unwrap().push(txn);
        Ok(tx_id)
    }

    async fn pending_transaction(&self, tx_id: &str) -> BlockchainResult<PendingTransaction> {
        let pool_error = self.pool_error.lock().unwrap().clone();
        if !pool_error.is_empty() {
            return Ok(PendingTransaction {
                pool_error,
                ..PendingTransaction::default()
            });
        }
        if self.never_confirm.load(Ordering::SeqCst) {
            return Ok(PendingTransaction::default());
        }

        let asset_index = if self.omit_asset_index.load(Ordering::SeqCst) {
            None
        } else {
            self.assets.lock().unwrap().get(tx_id).copied()
        };
        Ok(PendingTransaction {
            confirmed_round: Some(self.round.load(Ordering::SeqCst) + 1),
            asset_index,
            pool_error: String::new(),
        })
    }

    async fn status(&self) -> BlockchainResult<NodeStatus> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(BlockchainError::Rpc("connection refused".to_string()));
        }
        Ok(NodeStatus {
            last_round: self.round.load(Ordering::SeqCst),
        })
    }

    async fn wait_for_block_after(&self, round: u64) -> BlockchainResult<NodeStatus> {
        let delay = self.block_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let next = self.round.fetch_max(round + 1, Ordering::SeqCst).max(round + 1);
        Ok(NodeStatus { last_round: next })
    }

    async fn account_info(&self, address: &Address) -> BlockchainResult<AccountInfo> {
        Ok(AccountInfo {
            address: address.to_string(),
            amount: 5_000_000,
            min_balance: 100_000,
            status: "Offline".to_string(),
        })
    }
}

/// A gateway running on an ephemeral port.
pub struct TestGateway {
    pub url: String,
    pub ledger: Arc<FakeLedger>,
    pub recorder: MemoryRecorder,
    pub client: DonationClient,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn http(&self) -> reqwest::Client {
        no_proxy_client()
    }
}

pub fn no_proxy_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_gateway(secrets: StaticSecrets) -> TestGateway {
    start_gateway_with(secrets, GatewayConfig::default()).await
}

pub async fn start_gateway_with(secrets: StaticSecrets, mut config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let ledger = Arc::new(FakeLedger::default());
    let recorder = MemoryRecorder::new();
    let ctx = FunctionContext::new(
        Arc::new(config),
        ledger.clone(),
        Arc::new(recorder.clone()),
        Arc::new(secrets),
    );

    let server = HttpServer::new(ctx);
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    let url = format!("http://{}", addr);
    TestGateway {
        client: DonationClient::new(&url).with_http_client(no_proxy_client()),
        url,
        ledger,
        recorder,
        shutdown,
    }
}
