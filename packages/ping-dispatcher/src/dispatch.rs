//! Ping dispatch
//!
//! Calls the ping module on the source chain and recovers the ISMP post
//! request its host emitted.

use alloy::primitives::{B256, U256};
use eyre::{eyre, Result, WrapErr};
use hyperbridge_rs::evm::post_request_from_receipt;
use hyperbridge_rs::types::state_machine_bytes;
use hyperbridge_rs::{LinkTarget, PostRequest};
use tracing::info;

use crate::config::Config;
use crate::context::AppContext;
use crate::contracts::{PingMessage, PingModule};

/// A mined ping transaction and the request it dispatched
#[derive(Debug, Clone)]
pub struct DispatchedPing {
    pub tx_hash: B256,
    pub block_number: u64,
    pub request: PostRequest,
}

/// Build the ping module argument for `config`
pub fn ping_message(config: &Config) -> PingMessage {
    PingMessage {
        dest: state_machine_bytes(&config.dest.state_machine),
        module: config.ping_module,
        timeout: config.ping_timeout_secs,
        count: config.ping_count,
        fee: U256::ZERO,
    }
}

/// Send a ping and wait for it to be mined
pub async fn dispatch_ping(ctx: &AppContext) -> Result<DispatchedPing> {
    let provider = ctx.source.provider();
    let ping = PingModule::new(ctx.config.ping_module, &provider);

    let pending_tx = ping
        .ping(ping_message(&ctx.config))
        .send()
        .await
        .map_err(|e| eyre!("Failed to send ping tx: {}", e))?;

    let tx_hash = *pending_tx.tx_hash();
    info!(tx_hash = %tx_hash, "Ping transaction sent");

    let receipt = pending_tx
        .with_required_confirmations(ctx.config.confirmations)
        .get_receipt()
        .await
        .map_err(|e| eyre!("Failed to get ping receipt: {}", e))?;

    if !receipt.status() {
        return Err(eyre!("Ping transaction {} reverted", tx_hash));
    }

    info!(
        url = %ctx.config.explorers.tx_url(LinkTarget::Source, tx_hash),
        "Transaction receipt"
    );

    let request = post_request_from_receipt(&receipt)
        .wrap_err("Ping did not dispatch a post request")?;

    info!(
        block = request.height,
        source = %request.source,
        dest = %request.dest,
        nonce = request.nonce,
        timeout = request.timeout_timestamp,
        "Post request dispatched"
    );

    Ok(DispatchedPing {
        tx_hash,
        block_number: request.height,
        request,
    })
}
