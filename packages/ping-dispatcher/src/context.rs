//! Application context
//!
//! Chain clients and contract addresses are built once at startup from
//! [`Config`] and handed to every step of the flow.

use std::sync::Arc;

use eyre::Result;
use hyperbridge_rs::evm::EvmChain;
use hyperbridge_rs::relay::DEFAULT_REQUEST_TIMEOUT;
use hyperbridge_rs::{
    EvmSelfRelayer, HyperbridgeClient, HyperclientConfig, RetryConfig, StatusTracker,
};
use tracing::info;

use crate::config::Config;

pub struct AppContext {
    pub config: Config,
    /// BSC testnet client
    pub source: EvmChain,
    /// Optimism Sepolia client
    pub dest: EvmChain,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let source = EvmChain::new(
            &config.source.state_machine,
            config.source_chain_id,
            &config.source.rpc_url,
            config.private_key.expose(),
        )?;
        let dest = EvmChain::new(
            &config.dest.state_machine,
            config.dest_chain_id,
            &config.dest.rpc_url,
            config.private_key.expose(),
        )?;

        info!(
            account = %source.address(),
            source = %source.name,
            dest = %dest.name,
            "Application context ready"
        );

        Ok(Self {
            config,
            source,
            dest,
        })
    }

    pub fn hyperclient_config(&self) -> HyperclientConfig {
        HyperclientConfig {
            source: self.config.source.clone(),
            dest: self.config.dest.clone(),
            hyperbridge_url: self.config.hyperbridge_url.clone(),
            indexer_url: self.config.indexer_url.clone(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Status tracker wired to Hyperbridge, self-relaying to the destination
    /// handler when enabled
    pub fn tracker(&self) -> Result<StatusTracker<HyperbridgeClient>> {
        let relay = HyperbridgeClient::new(self.hyperclient_config())?;
        let mut tracker = StatusTracker::new(relay)
            .with_poll_interval(self.config.poll_interval)
            .with_retry(RetryConfig::default());

        if let Some(stage_timeout) = self.config.stage_timeout {
            tracker = tracker.with_stage_timeout(stage_timeout);
        }

        if self.config.self_relay {
            tracker = tracker.with_self_relayer(Arc::new(EvmSelfRelayer::new(
                self.dest.clone(),
                self.config.handler,
                self.config.confirmations,
            )));
        }

        Ok(tracker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_config, BSC_TESTNET_CHAIN_ID, OP_SEPOLIA_CHAIN_ID};

    #[test]
    fn test_context_builds_both_chains() {
        let ctx = AppContext::new(test_config()).unwrap();

        assert_eq!(ctx.source.chain_id, BSC_TESTNET_CHAIN_ID);
        assert_eq!(ctx.dest.chain_id, OP_SEPOLIA_CHAIN_ID);
        // one key signs on both chains
        assert_eq!(ctx.source.address(), ctx.dest.address());
    }

    #[test]
    fn test_hyperclient_config_mirrors_descriptors() {
        let ctx = AppContext::new(test_config()).unwrap();
        let hc = ctx.hyperclient_config();

        assert_eq!(hc.source.consensus_state_id, "BSC0");
        assert_eq!(hc.dest.state_machine, "OPTI");
        assert_eq!(hc.hyperbridge_url, "http://localhost:9944");
    }

    #[test]
    fn test_tracker_builds() {
        let ctx = AppContext::new(test_config()).unwrap();
        assert!(ctx.tracker().is_ok());
    }

    #[test]
    fn test_bad_rpc_url_rejected() {
        let mut config = test_config();
        config.dest.rpc_url = "not a url".to_string();
        assert!(AppContext::new(config).is_err());
    }
}
