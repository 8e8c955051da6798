//! Dispatcher configuration

use alloy::primitives::Address;
use eyre::{eyre, Result, WrapErr};
use hyperbridge_rs::explorer::{
    DEFAULT_DEST_EXPLORER, DEFAULT_RELAY_EXPLORER, DEFAULT_SOURCE_EXPLORER,
};
use hyperbridge_rs::{ChainDescriptor, ExplorerUrls};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HYPERBRIDGE_URL: &str = "https://hyperbridge-paseo-rpc.blockops.network";
pub const DEFAULT_PING_MODULE: &str = "0x32EBaeF451dD321855B168b5ad96b480066DE060";
pub const DEFAULT_FEE_TOKEN: &str = "0x157Ef95562CACF7F7bDFC606cc4Ce73B65e5E1f2";
pub const DEFAULT_FAUCET: &str = "0x50A60531EF45a62711A812C081CC2C17ac683def";
pub const DEFAULT_HANDLER: &str = "0x761426351F32261a10e2DF5e359f5A0A09e5A1D7";
pub const DEFAULT_BSC_HOST: &str = "0xa3F07C94A7E6cD9367a2E0C0F4247eB2AC467C86";
pub const DEFAULT_OP_HOST: &str = "0x8Ac39DfC1F2616e5e19B93420C6d008a8a8EE65f";

/// BSC testnet chain ID
pub const BSC_TESTNET_CHAIN_ID: u64 = 97;
/// Optimism Sepolia chain ID
pub const OP_SEPOLIA_CHAIN_ID: u64 = 11155420;

/// Private key that never shows up in `Debug` output
#[derive(Clone)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PrivateKey {
    fn from(raw: &str) -> Self {
        PrivateKey(raw.to_string())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Source chain (BSC testnet) descriptor
    pub source: ChainDescriptor,
    /// Destination chain (Optimism Sepolia) descriptor
    pub dest: ChainDescriptor,
    pub source_chain_id: u64,
    pub dest_chain_id: u64,

    /// Signing key used on both chains
    pub private_key: PrivateKey,

    /// Hyperbridge RPC endpoint
    pub hyperbridge_url: String,
    /// Optional indexer endpoint used for status queries instead of the node;
    /// must serve the same JSON-RPC status method
    pub indexer_url: Option<String>,

    /// Ping module on the source chain
    pub ping_module: Address,
    /// ERC-6160 fee token on the source chain
    pub fee_token: Address,
    /// Fee token faucet on the source chain
    pub faucet: Address,
    /// ISMP handler on the destination chain
    pub handler: Address,

    /// Poll interval for status tracking
    pub poll_interval: Duration,
    /// Longest wait for the next status before tracking gives up
    pub stage_timeout: Option<Duration>,
    /// Confirmations to wait for on every transaction
    pub confirmations: u64,
    /// Relative timeout of the ping request in seconds
    pub ping_timeout_secs: u64,
    /// Number of pings the module dispatches
    pub ping_count: u64,

    /// Submit finalized delivery calldata ourselves
    pub self_relay: bool,
    /// Stop tracking once the self-relay completes
    pub stop_after_self_relay: bool,

    pub explorers: ExplorerUrls,
}

impl Config {
    /// Load configuration from environment
    pub fn load() -> Result<Self> {
        // Try to load .env file
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }

        let bsc_url = env::var("BSC_URL").map_err(|_| eyre!("BSC_URL required"))?;
        let op_url = env::var("OP_URL").map_err(|_| eyre!("OP_URL required"))?;

        Ok(Self {
            source: ChainDescriptor {
                state_machine: "BSC".to_string(),
                consensus_state_id: "BSC0".to_string(),
                host_address: address_var("BSC_HOST_ADDRESS", DEFAULT_BSC_HOST)?,
                rpc_url: bsc_url,
            },
            dest: ChainDescriptor {
                state_machine: "OPTI".to_string(),
                consensus_state_id: "ETH0".to_string(),
                host_address: address_var("OP_HOST_ADDRESS", DEFAULT_OP_HOST)?,
                rpc_url: op_url,
            },
            source_chain_id: BSC_TESTNET_CHAIN_ID,
            dest_chain_id: OP_SEPOLIA_CHAIN_ID,

            private_key: PrivateKey(
                env::var("PRIVATE_KEY").map_err(|_| eyre!("PRIVATE_KEY required"))?,
            ),

            hyperbridge_url: env::var("HYPERBRIDGE_URL")
                .unwrap_or_else(|_| DEFAULT_HYPERBRIDGE_URL.to_string()),
            indexer_url: env::var("INDEXER_URL").ok().filter(|s| !s.trim().is_empty()),

            ping_module: address_var("PING_MODULE_ADDRESS", DEFAULT_PING_MODULE)?,
            fee_token: address_var("FEE_TOKEN_ADDRESS", DEFAULT_FEE_TOKEN)?,
            faucet: address_var("FAUCET_ADDRESS", DEFAULT_FAUCET)?,
            handler: address_var("HANDLER_ADDRESS", DEFAULT_HANDLER)?,

            poll_interval: Duration::from_millis(parse_var("POLL_INTERVAL_MS", 5000)?),
            stage_timeout: optional_var::<u64>("STAGE_TIMEOUT_SECS")?.map(Duration::from_secs),
            confirmations: parse_var("CONFIRMATIONS", 1)?,
            ping_timeout_secs: parse_var("PING_TIMEOUT_SECS", 60 * 60)?,
            ping_count: parse_var("PING_COUNT", 1)?,

            self_relay: bool_var("SELF_RELAY", true)?,
            stop_after_self_relay: bool_var("STOP_AFTER_SELF_RELAY", false)?,

            explorers: ExplorerUrls {
                source: env::var("SOURCE_EXPLORER_URL")
                    .unwrap_or_else(|_| DEFAULT_SOURCE_EXPLORER.to_string()),
                relay: env::var("RELAY_EXPLORER_URL")
                    .unwrap_or_else(|_| DEFAULT_RELAY_EXPLORER.to_string()),
                dest: env::var("DEST_EXPLORER_URL")
                    .unwrap_or_else(|_| DEFAULT_DEST_EXPLORER.to_string()),
            },
        })
    }
}

fn address_var(name: &str, default: &str) -> Result<Address> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    Address::from_str(raw.trim()).wrap_err_with(|| format!("Invalid {}", name))
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| eyre!("Invalid {}: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn optional_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| eyre!("Invalid {}: {}", name, raw)),
        _ => Ok(None),
    }
}

fn bool_var(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(raw) => parse_bool(&raw).ok_or_else(|| eyre!("Invalid {}: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

/// Accepts true/false, 1/0, yes/no (case-insensitive)
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Fixed configuration pointing at local nodes
#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        source: ChainDescriptor {
            state_machine: "BSC".to_string(),
            consensus_state_id: "BSC0".to_string(),
            host_address: Address::repeat_byte(0xA3),
            rpc_url: "http://localhost:8545".to_string(),
        },
        dest: ChainDescriptor {
            state_machine: "OPTI".to_string(),
            consensus_state_id: "ETH0".to_string(),
            host_address: Address::repeat_byte(0x8A),
            rpc_url: "http://localhost:8546".to_string(),
        },
        source_chain_id: BSC_TESTNET_CHAIN_ID,
        dest_chain_id: OP_SEPOLIA_CHAIN_ID,
        private_key: PrivateKey::from(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        ),
        hyperbridge_url: "http://localhost:9944".to_string(),
        indexer_url: None,
        ping_module: Address::repeat_byte(0x32),
        fee_token: Address::repeat_byte(0x15),
        faucet: Address::repeat_byte(0x50),
        handler: Address::repeat_byte(0x76),
        poll_interval: Duration::from_millis(100),
        stage_timeout: None,
        confirmations: 1,
        ping_timeout_secs: 3600,
        ping_count: 1,
        self_relay: true,
        stop_after_self_relay: false,
        explorers: ExplorerUrls::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "BSC_URL",
        "OP_URL",
        "PRIVATE_KEY",
        "HYPERBRIDGE_URL",
        "INDEXER_URL",
        "PING_MODULE_ADDRESS",
        "POLL_INTERVAL_MS",
        "STAGE_TIMEOUT_SECS",
        "SELF_RELAY",
        "STOP_AFTER_SELF_RELAY",
        "CONFIRMATIONS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn set_required() {
        env::set_var("BSC_URL", "https://bsc-testnet.example");
        env::set_var("OP_URL", "https://op-sepolia.example");
        env::set_var(
            "PRIVATE_KEY",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        );
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        set_required();

        let config = Config::load().unwrap();

        assert_eq!(config.source.state_machine, "BSC");
        assert_eq!(config.source.consensus_state_id, "BSC0");
        assert_eq!(config.dest.state_machine, "OPTI");
        assert_eq!(config.dest.consensus_state_id, "ETH0");
        assert_eq!(config.hyperbridge_url, DEFAULT_HYPERBRIDGE_URL);
        assert_eq!(
            config.ping_module,
            Address::from_str(DEFAULT_PING_MODULE).unwrap()
        );
        assert_eq!(config.poll_interval, Duration::from_millis(5000));
        assert_eq!(config.ping_timeout_secs, 3600);
        assert_eq!(config.confirmations, 1);
        assert!(config.self_relay);
        assert!(!config.stop_after_self_relay);
        assert!(config.indexer_url.is_none());
        assert!(config.stage_timeout.is_none());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        set_required();
        env::set_var("POLL_INTERVAL_MS", "250");
        env::set_var("SELF_RELAY", "no");
        env::set_var("STOP_AFTER_SELF_RELAY", "1");
        env::set_var("INDEXER_URL", "http://localhost:3000");
        env::set_var("STAGE_TIMEOUT_SECS", "900");

        let config = Config::load().unwrap();

        assert_eq!(config.stage_timeout, Some(Duration::from_secs(900)));

        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert!(!config.self_relay);
        assert!(config.stop_after_self_relay);
        assert_eq!(config.indexer_url.as_deref(), Some("http://localhost:3000"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_required() {
        clear_env();
        env::set_var("BSC_URL", "https://bsc-testnet.example");

        let err = Config::load().unwrap_err();
        assert!(err.to_string().contains("OP_URL"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_rejected() {
        clear_env();
        set_required();
        env::set_var("PING_MODULE_ADDRESS", "0x1234");
        assert!(Config::load().is_err());

        env::remove_var("PING_MODULE_ADDRESS");
        env::set_var("CONFIRMATIONS", "many");
        assert!(Config::load().is_err());

        env::remove_var("CONFIRMATIONS");
        env::set_var("STAGE_TIMEOUT_SECS", "soon");
        assert!(Config::load().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_debug_redacts_key() {
        clear_env();
        set_required();

        let config = Config::load().unwrap();
        let debug = format!("{:?}", config);

        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("ac0974bec39a17e3"));

        clear_env();
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" yes "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
