//! Fee-token bootstrap
//!
//! The ping module charges relayer fees in an ERC-6160 token. Before
//! dispatching, make sure the account holds some (dripping from the testnet
//! faucet if not) and that the ping module may spend them.

use alloy::primitives::utils::format_ether;
use alloy::primitives::U256;
use eyre::{eyre, Result};
use tracing::info;

use crate::context::AppContext;
use crate::contracts::{FeeToken, TokenFaucet};

/// What the bootstrap had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapReport {
    pub balance: U256,
    pub dripped: bool,
    pub approved: bool,
}

/// Balance and allowance that still need topping up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapPlan {
    pub needs_drip: bool,
    pub needs_approval: bool,
}

impl BootstrapPlan {
    pub fn from_state(balance: U256, allowance: U256) -> Self {
        Self {
            needs_drip: balance.is_zero(),
            needs_approval: allowance.is_zero(),
        }
    }
}

/// Ensure the signer can pay ping fees
pub async fn ensure_fee_token(ctx: &AppContext) -> Result<BootstrapReport> {
    let provider = ctx.source.provider();
    let account = ctx.source.address();
    let fee_token = FeeToken::new(ctx.config.fee_token, &provider);

    let mut balance = fee_token
        .balanceOf(account)
        .call()
        .await
        .map_err(|e| eyre!("Failed to get balance: {}", e))?
        ._0;
    info!(balance = %format_ether(balance), "FeeToken balance");

    let allowance = fee_token
        .allowance(account, ctx.config.ping_module)
        .call()
        .await
        .map_err(|e| eyre!("Failed to get allowance: {}", e))?
        ._0;

    let plan = BootstrapPlan::from_state(balance, allowance);

    if plan.needs_drip {
        let faucet = TokenFaucet::new(ctx.config.faucet, &provider);
        let receipt = faucet
            .drip(ctx.config.fee_token)
            .send()
            .await
            .map_err(|e| eyre!("Failed to send drip tx: {}", e))?
            .with_required_confirmations(ctx.config.confirmations)
            .get_receipt()
            .await
            .map_err(|e| eyre!("Failed to get drip receipt: {}", e))?;
        if !receipt.status() {
            return Err(eyre!("Faucet drip reverted"));
        }

        balance = fee_token
            .balanceOf(account)
            .call()
            .await
            .map_err(|e| eyre!("Failed to get balance: {}", e))?
            ._0;
        info!(balance = %format_ether(balance), "New FeeToken balance");
    }

    if plan.needs_approval {
        info!(spender = %ctx.config.ping_module, "Setting allowance");
        let receipt = fee_token
            .approve(ctx.config.ping_module, U256::MAX)
            .send()
            .await
            .map_err(|e| eyre!("Failed to send approve tx: {}", e))?
            .with_required_confirmations(ctx.config.confirmations)
            .get_receipt()
            .await
            .map_err(|e| eyre!("Failed to get approve receipt: {}", e))?;
        if !receipt.status() {
            return Err(eyre!("FeeToken approve reverted"));
        }
    }

    Ok(BootstrapReport {
        balance,
        dripped: plan.needs_drip,
        approved: plan.needs_approval,
    })
}
