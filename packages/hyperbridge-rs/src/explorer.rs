//! Block-explorer links
//!
//! `SourceFinalized` and `HyperbridgeDelivered` reference relay-chain
//! extrinsics; `HyperbridgeFinalized` and `DestinationDelivered` reference
//! destination-chain transactions.

use alloy::primitives::B256;

use crate::status::MessageStatus;

pub const DEFAULT_RELAY_EXPLORER: &str = "https://gargantua.statescan.io/#/extrinsics/";
pub const DEFAULT_SOURCE_EXPLORER: &str = "https://testnet.bscscan.com/tx/";
pub const DEFAULT_DEST_EXPLORER: &str = "https://sepolia-optimism.etherscan.io/tx/";

/// Which explorer a transaction lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    Source,
    Relay,
    Destination,
}

/// Explorer base URLs, each ending where the hash is appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerUrls {
    pub source: String,
    pub relay: String,
    pub dest: String,
}

impl Default for ExplorerUrls {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE_EXPLORER.to_string(),
            relay: DEFAULT_RELAY_EXPLORER.to_string(),
            dest: DEFAULT_DEST_EXPLORER.to_string(),
        }
    }
}

impl ExplorerUrls {
    pub fn tx_url(&self, target: LinkTarget, tx_hash: B256) -> String {
        let base = match target {
            LinkTarget::Source => &self.source,
            LinkTarget::Relay => &self.relay,
            LinkTarget::Destination => &self.dest,
        };
        format!("{}{}", base, tx_hash)
    }

    /// Explorer link for the transaction behind `status`, if it has one
    pub fn status_url(&self, status: &MessageStatus) -> Option<String> {
        let target = match status {
            MessageStatus::SourceFinalized { .. } | MessageStatus::HyperbridgeDelivered { .. } => {
                LinkTarget::Relay
            }
            MessageStatus::HyperbridgeFinalized { .. }
            | MessageStatus::DestinationDelivered { .. } => LinkTarget::Destination,
            MessageStatus::Pending | MessageStatus::Timeout => return None,
        };
        status.tx_hash().map(|hash| self.tx_url(target, hash))
    }
}
