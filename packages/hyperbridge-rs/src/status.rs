//! Message delivery status
//!
//! The relay reports status as loosely typed objects keyed by `kind`. They are
//! decoded here into the closed [`MessageStatus`] enum; anything the tracker
//! does not know about is rejected rather than ignored.

use alloy::primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Delivery status of a post request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageStatus {
    /// Request emitted but not yet finalized on the source chain
    Pending,
    /// Source block containing the request is final (relay-chain tx)
    SourceFinalized { tx_hash: B256 },
    /// Hyperbridge has received and recorded the request (relay-chain tx)
    HyperbridgeDelivered { tx_hash: B256 },
    /// Hyperbridge finality covers the request; `calldata` executes delivery
    /// on the destination handler
    HyperbridgeFinalized { tx_hash: B256, calldata: Bytes },
    /// Destination chain executed the request
    DestinationDelivered { tx_hash: B256 },
    /// Request timed out before delivery
    Timeout,
}

/// Ordered rank of a status. `TimedOut` may follow any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Pending,
    SourceFinalized,
    HyperbridgeDelivered,
    HyperbridgeFinalized,
    DestinationDelivered,
    TimedOut,
}

impl Stage {
    /// The progress stage directly after this one, if any
    pub fn successor(&self) -> Option<Stage> {
        match self {
            Stage::Pending => Some(Stage::SourceFinalized),
            Stage::SourceFinalized => Some(Stage::HyperbridgeDelivered),
            Stage::HyperbridgeDelivered => Some(Stage::HyperbridgeFinalized),
            Stage::HyperbridgeFinalized => Some(Stage::DestinationDelivered),
            Stage::DestinationDelivered | Stage::TimedOut => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::DestinationDelivered | Stage::TimedOut)
    }

    /// Whether `next` is a legal transition from this stage
    pub fn can_advance_to(&self, next: Stage) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == Stage::TimedOut || self.successor() == Some(next)
    }
}

impl MessageStatus {
    pub fn stage(&self) -> Stage {
        match self {
            MessageStatus::Pending => Stage::Pending,
            MessageStatus::SourceFinalized { .. } => Stage::SourceFinalized,
            MessageStatus::HyperbridgeDelivered { .. } => Stage::HyperbridgeDelivered,
            MessageStatus::HyperbridgeFinalized { .. } => Stage::HyperbridgeFinalized,
            MessageStatus::DestinationDelivered { .. } => Stage::DestinationDelivered,
            MessageStatus::Timeout => Stage::TimedOut,
        }
    }

    /// Wire tag for this status
    pub fn kind(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "Pending",
            MessageStatus::SourceFinalized { .. } => "SourceFinalized",
            MessageStatus::HyperbridgeDelivered { .. } => "HyperbridgeDelivered",
            MessageStatus::HyperbridgeFinalized { .. } => "HyperbridgeFinalized",
            MessageStatus::DestinationDelivered { .. } => "DestinationDelivered",
            MessageStatus::Timeout => "Timeout",
        }
    }

    /// Transaction that produced this status, if the status carries one
    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            MessageStatus::SourceFinalized { tx_hash }
            | MessageStatus::HyperbridgeDelivered { tx_hash }
            | MessageStatus::HyperbridgeFinalized { tx_hash, .. }
            | MessageStatus::DestinationDelivered { tx_hash } => Some(*tx_hash),
            MessageStatus::Pending | MessageStatus::Timeout => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage().is_terminal()
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tx_hash() {
            Some(hash) => write!(f, "{} ({})", self.kind(), hash),
            None => f.write_str(self.kind()),
        }
    }
}

/// Status as it appears on the relay wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireStatus {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calldata: Option<Bytes>,
}

impl WireStatus {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            transaction_hash: None,
            calldata: None,
        }
    }

    pub fn with_hash(mut self, tx_hash: B256) -> Self {
        self.transaction_hash = Some(tx_hash);
        self
    }

    pub fn with_calldata(mut self, calldata: Bytes) -> Self {
        self.calldata = Some(calldata);
        self
    }
}

/// Errors decoding a [`WireStatus`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error("unknown status kind: {0}")]
    UnknownKind(String),
    #[error("status {kind} is missing field `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}

impl TryFrom<WireStatus> for MessageStatus {
    type Error = StatusError;

    fn try_from(wire: WireStatus) -> Result<Self, Self::Error> {
        let hash = |kind: &'static str| {
            wire.transaction_hash.ok_or(StatusError::MissingField {
                kind,
                field: "transaction_hash",
            })
        };

        match wire.kind.as_str() {
            "Pending" => Ok(MessageStatus::Pending),
            "SourceFinalized" => Ok(MessageStatus::SourceFinalized {
                tx_hash: hash("SourceFinalized")?,
            }),
            "HyperbridgeDelivered" => Ok(MessageStatus::HyperbridgeDelivered {
                tx_hash: hash("HyperbridgeDelivered")?,
            }),
            "HyperbridgeFinalized" => {
                let tx_hash = hash("HyperbridgeFinalized")?;
                let calldata = wire.calldata.clone().ok_or(StatusError::MissingField {
                    kind: "HyperbridgeFinalized",
                    field: "calldata",
                })?;
                Ok(MessageStatus::HyperbridgeFinalized { tx_hash, calldata })
            }
            "DestinationDelivered" => Ok(MessageStatus::DestinationDelivered {
                tx_hash: hash("DestinationDelivered")?,
            }),
            "Timeout" => Ok(MessageStatus::Timeout),
            other => Err(StatusError::UnknownKind(other.to_string())),
        }
    }
}
