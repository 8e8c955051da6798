//! EVM chain client
//!
//! Wraps an RPC endpoint and a signing key for one chain. Providers are built
//! per call with `with_recommended_fillers()` so nonce, gas limit and fees are
//! populated automatically on every transaction.

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::{Client, Http},
};
use eyre::{Result, WrapErr};
use tracing::info;
use url::Url;

/// One EVM chain plus the account that signs for it
#[derive(Clone)]
pub struct EvmChain {
    /// Human-readable name used in logs
    pub name: String,
    /// Native chain ID (e.g. 97 for BSC testnet)
    pub chain_id: u64,
    rpc_url: Url,
    signer: PrivateKeySigner,
}

impl EvmChain {
    /// Create a chain client signing with `private_key`
    pub fn new(name: &str, chain_id: u64, rpc_url: &str, private_key: &str) -> Result<Self> {
        let rpc_url: Url = rpc_url
            .parse()
            .wrap_err_with(|| format!("Invalid RPC URL for {}", name))?;
        let signer: PrivateKeySigner = private_key.parse().wrap_err("Invalid private key")?;

        info!(
            chain = %name,
            chain_id = chain_id,
            address = %signer.address(),
            "Created EVM chain client"
        );

        Ok(Self {
            name: name.to_string(),
            chain_id,
            rpc_url,
            signer,
        })
    }

    /// Provider with wallet and recommended fillers
    pub fn provider(&self) -> impl Provider<Http<Client>> + Clone {
        let wallet = EthereumWallet::from(self.signer.clone());
        ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_http(self.rpc_url.clone())
    }

    /// Signer address
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get the current block number
    pub async fn get_block_number(&self) -> Result<u64> {
        let block = self
            .provider()
            .get_block_number()
            .await
            .wrap_err_with(|| format!("Failed to get {} block number", self.name))?;
        Ok(block)
    }
}

impl std::fmt::Debug for EvmChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmChain")
            .field("name", &self.name)
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url.as_str())
            .field("address", &self.signer.address())
            .finish()
    }
}
