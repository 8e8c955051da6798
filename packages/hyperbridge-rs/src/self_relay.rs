//! Self-relay
//!
//! Once Hyperbridge finality covers a request, the relay hands out calldata for
//! the destination handler. Submitting it ourselves speeds delivery up; a third
//! party relayer will deliver it regardless, so failures here are never fatal.

use alloy::primitives::{Address, B256};
use alloy::sol_types::SolInterface;
use async_trait::async_trait;
use eyre::{eyre, Result};
use thiserror::Error;
use tracing::{debug, info};

use crate::evm::client::EvmChain;
use crate::evm::contracts::Handler::{self, handlePostRequestsCall, HandlerCalls};

/// Errors decoding delivery calldata
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalldataError {
    #[error("calldata is not a handler call: {0}")]
    Decode(String),
    #[error("expected handlePostRequests, got selector 0x{}", hex::encode(.0))]
    UnexpectedCall([u8; 4]),
}

/// Recover `handlePostRequests` arguments from raw delivery calldata
pub fn decode_handle_post_requests(calldata: &[u8]) -> Result<handlePostRequestsCall, CalldataError> {
    match HandlerCalls::abi_decode(calldata, true) {
        Ok(HandlerCalls::handlePostRequests(call)) => Ok(call),
        Ok(other) => Err(CalldataError::UnexpectedCall(other.selector())),
        Err(e) => Err(CalldataError::Decode(e.to_string())),
    }
}

/// Submits delivery calls to the destination chain
#[async_trait]
pub trait SelfRelayer: Send + Sync {
    /// Submit `call` and wait for inclusion. Returns the transaction hash.
    async fn submit(&self, call: handlePostRequestsCall) -> Result<B256>;
}

/// Self-relayer that calls the destination chain's handler contract
pub struct EvmSelfRelayer {
    chain: EvmChain,
    handler: Address,
    confirmations: u64,
}

impl EvmSelfRelayer {
    pub fn new(chain: EvmChain, handler: Address, confirmations: u64) -> Self {
        Self {
            chain,
            handler,
            confirmations,
        }
    }
}

#[async_trait]
impl SelfRelayer for EvmSelfRelayer {
    async fn submit(&self, call: handlePostRequestsCall) -> Result<B256> {
        let provider = self.chain.provider();
        let handler = Handler::new(self.handler, &provider);

        debug!(
            chain = %self.chain.name,
            handler = %self.handler,
            host = %call.host,
            requests = call.request.requests.len(),
            "Submitting handlePostRequests"
        );

        let pending_tx = handler
            .handlePostRequests(call.host, call.request)
            .send()
            .await
            .map_err(|e| eyre!("Failed to send self-relay tx: {}", e))?;

        let tx_hash = *pending_tx.tx_hash();
        info!(tx_hash = %tx_hash, chain = %self.chain.name, "Self-relay transaction sent");

        let receipt = pending_tx
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|e| eyre!("Failed to get self-relay receipt: {}", e))?;

        if !receipt.status() {
            return Err(eyre!("Self-relay transaction {} reverted", tx_hash));
        }

        Ok(tx_hash)
    }
}
