//! EVM Chain Support Module
//!
//! ## Submodules
//!
//! - `client` - Signing chain client
//! - `contracts` - EvmHost and Handler bindings using alloy sol! macro
//! - `events` - PostRequestEvent extraction from receipt logs

pub mod client;
pub mod contracts;
pub mod events;

pub use client::EvmChain;
pub use contracts::{EvmHost, Handler};
pub use events::{post_request_from_logs, post_request_from_receipt, EventError};
