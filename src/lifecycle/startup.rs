//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: an invalid node URL is fatal
//! - Secrets are not touched here; each request reads its own

use std::sync::Arc;

use crate::blockchain::{AlgodClient, BlockchainResult, Ledger};
use crate::config::{EnvSecrets, GatewayConfig};
use crate::functions::FunctionContext;
use crate::records::SupabaseRecorder;

/// Wire the production collaborators for a validated configuration.
pub fn build_context(config: GatewayConfig) -> BlockchainResult<FunctionContext> {
    let ledger: Arc<dyn Ledger> = Arc::new(AlgodClient::new(config.ledger.clone())?);
    let recorder = Arc::new(SupabaseRecorder::new(config.storage.clone()));

    Ok(FunctionContext::new(
        Arc::new(config),
        ledger,
        recorder,
        Arc::new(EnvSecrets),
    ))
}
