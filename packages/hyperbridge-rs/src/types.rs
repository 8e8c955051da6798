//! Common types for request tracking
//!
//! `PostRequest` identifies one in-flight ISMP message; `ChainDescriptor`
//! describes a chain to the relay client.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ISMP post request as emitted by the source chain's host contract.
///
/// Built once from the `PostRequestEvent` log plus the inclusion height and
/// never mutated afterwards. Serialized camelCase for the relay wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    /// Source state machine id (e.g. "BSC")
    pub source: String,
    /// Destination state machine id (e.g. "OPTI")
    pub dest: String,
    /// Sending module on the source chain
    pub from: Bytes,
    /// Receiving module on the destination chain
    pub to: Bytes,
    /// Host-assigned request nonce
    pub nonce: u64,
    /// Unix timestamp after which the request can no longer be delivered (0 = never)
    pub timeout_timestamp: u64,
    /// Opaque application payload
    pub body: Bytes,
    /// Relayer fee paid on the source chain
    pub fee: U256,
    /// Source chain block that included the request
    pub height: u64,
}

impl PostRequest {
    /// Whether the request's timeout has elapsed at `now` (unix seconds)
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.timeout_timestamp != 0 && now >= self.timeout_timestamp
    }
}

impl fmt::Display for PostRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}->{} nonce={} height={}",
            self.source, self.dest, self.nonce, self.height
        )
    }
}

/// Chain parameters the relay client needs to locate a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    /// State machine identifier (e.g. "BSC", "OPTI")
    pub state_machine: String,
    /// Consensus client tracking this chain on Hyperbridge (e.g. "BSC0")
    pub consensus_state_id: String,
    /// ISMP host contract on this chain
    pub host_address: Address,
    /// JSON-RPC endpoint
    pub rpc_url: String,
}

/// Encode a state machine id the way host contracts expect it in `bytes` fields
pub fn state_machine_bytes(state_machine: &str) -> Bytes {
    Bytes::copy_from_slice(state_machine.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> PostRequest {
        PostRequest {
            source: "BSC".to_string(),
            dest: "OPTI".to_string(),
            from: Bytes::from(vec![0x11; 20]),
            to: Bytes::from(vec![0x22; 20]),
            nonce: 7,
            timeout_timestamp: 1_700_003_600,
            body: Bytes::from_static(b"hello"),
            fee: U256::ZERO,
            height: 42,
        }
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let json = serde_json::to_value(sample_request()).unwrap();

        assert_eq!(json["timeoutTimestamp"], 1_700_003_600u64);
        assert_eq!(json["height"], 42);
        assert_eq!(json["body"], "0x68656c6c6f");
    }

    #[test]
    fn test_request_expiry() {
        let request = sample_request();
        assert!(!request.is_expired_at(1_700_000_000));
        assert!(request.is_expired_at(1_700_003_600));

        let no_timeout = PostRequest {
            timeout_timestamp: 0,
            ..sample_request()
        };
        assert!(!no_timeout.is_expired_at(u64::MAX));
    }

    #[test]
    fn test_state_machine_bytes() {
        assert_eq!(state_machine_bytes("OPTI").as_ref(), b"OPTI");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            sample_request().to_string(),
            "BSC->OPTI nonce=7 height=42"
        );
    }
}
