//! Ping Dispatcher
//!
//! Sends an ISMP ping from BSC testnet to Optimism Sepolia through
//! Hyperbridge and follows the request until it is delivered or times out.
//!
//! # Flow
//!
//! 1. Make sure the signer holds fee tokens and has approved the ping module
//! 2. Call `PingModule.ping` and recover the emitted post request
//! 3. Query the current status from Hyperbridge
//! 4. Stream status updates, self-relaying the delivery once it is finalized

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod contracts;
pub mod dispatch;
pub mod monitor;

use eyre::{Result, WrapErr};
use tracing::info;

pub use config::Config;
pub use context::AppContext;
pub use monitor::Outcome;

/// Dispatch one ping and track it to the end
pub async fn run(ctx: &AppContext) -> Result<Outcome> {
    let block = ctx.source.get_block_number().await?;
    info!(block = block, chain = %ctx.source.name, "Latest block");

    let report = bootstrap::ensure_fee_token(ctx).await?;
    info!(
        dripped = report.dripped,
        approved = report.approved,
        "Fee token ready"
    );

    let ping = dispatch::dispatch_ping(ctx).await?;
    info!(
        tx_hash = %ping.tx_hash,
        block = ping.block_number,
        request = %ping.request,
        "Ping dispatched"
    );

    info!("Setting up hyperclient");
    let tracker = ctx.tracker()?;

    let status = tracker
        .query_status(&ping.request)
        .await
        .wrap_err("Failed to query request status")?;
    info!(status = %status, "Current request status");

    let outcome = monitor::follow(
        tracker.subscribe_status(&ping.request),
        &ctx.config.explorers,
        ctx.config.stop_after_self_relay,
    )
    .await?;

    info!(outcome = ?outcome, "Tracking finished");
    Ok(outcome)
}
