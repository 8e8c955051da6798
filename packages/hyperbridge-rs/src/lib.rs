//! Hyperbridge-RS: ISMP Request Tracking over Hyperbridge
//!
//! This crate follows a cross-chain ISMP post request from the moment it is
//! emitted on the source chain until it is executed on the destination chain:
//!
//! - **Types** - `PostRequest` descriptor and `ChainDescriptor` for relay setup
//! - **Status** - Closed `MessageStatus` model decoded from the relay wire format
//! - **Relay** - `RelayClient` trait and the Hyperbridge JSON-RPC client
//! - **Tracker** - `StatusTracker` with one-shot queries and a status stream
//! - **Self-Relay** - Decoding and submitting finalized delivery calldata
//! - **Explorer** - Block-explorer links per status
//! - **EVM Module** - Chain client, host/handler bindings, host event parsing
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! hyperbridge-rs = { path = "../hyperbridge-rs" }
//! ```

pub mod evm;
pub mod explorer;
pub mod relay;
pub mod self_relay;
pub mod status;
pub mod tracker;
pub mod types;

pub use explorer::{ExplorerUrls, LinkTarget};
pub use relay::{HyperbridgeClient, HyperclientConfig, RelayClient, RelayError, RetryConfig};
pub use self_relay::{decode_handle_post_requests, EvmSelfRelayer, SelfRelayer};
pub use status::{MessageStatus, Stage, StatusError, WireStatus};
pub use tracker::{StatusTracker, TrackerError, TrackerEvent};
pub use types::{ChainDescriptor, PostRequest};
