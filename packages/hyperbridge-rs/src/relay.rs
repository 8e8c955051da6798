//! Hyperbridge relay client
//!
//! The tracker only needs one capability from the relay network: the ordered
//! list of statuses it has recorded for a request. [`RelayClient`] is that
//! seam; [`HyperbridgeClient`] implements it over JSON-RPC/HTTP.
//!
//! # Wire format
//!
//! ```text
//! -> {"jsonrpc":"2.0","id":1,"method":"hyperbridge_requestStatusHistory",
//!     "params":[{"request":{...},"source":{...},"dest":{...}}]}
//! <- {"jsonrpc":"2.0","id":1,"result":[{"kind":"SourceFinalized","transaction_hash":"0x.."}]}
//! ```
//!
//! An indexer configured through `HyperclientConfig::indexer_url` replaces the
//! node endpoint and is spoken to with exactly this wire format.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::status::WireStatus;
use crate::types::{ChainDescriptor, PostRequest};

/// JSON-RPC method returning a request's status history
pub const STATUS_HISTORY_METHOD: &str = "hyperbridge_requestStatusHistory";

/// JSON-RPC error code the relay uses for requests it has never seen
pub const UNKNOWN_REQUEST_CODE: i64 = -32602;

/// Default per-call HTTP timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors talking to the relay
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("relay unavailable: {0}")]
    Unavailable(String),
    #[error("request not recognized by relay: {0}")]
    UnknownRequest(String),
    #[error("invalid relay response: {0}")]
    InvalidResponse(String),
}

impl RelayError {
    /// Transport-level failures are worth retrying; the rest are not
    pub fn is_retryable(&self) -> bool {
        matches!(self, RelayError::Unavailable(_))
    }
}

/// Source of truth for a request's delivery progress
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Statuses recorded for `request`, oldest first. Empty until the relay
    /// has observed the request.
    async fn status_history(&self, request: &PostRequest) -> Result<Vec<WireStatus>, RelayError>;
}

#[async_trait]
impl<T: RelayClient + ?Sized> RelayClient for Arc<T> {
    async fn status_history(&self, request: &PostRequest) -> Result<Vec<WireStatus>, RelayError> {
        (**self).status_history(request).await
    }
}

/// Retry policy for relay queries
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts per query
    pub max_retries: u32,
    /// Initial backoff duration
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Calculate backoff duration for a given attempt
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff = self
            .initial_backoff
            .as_millis()
            .saturating_mul(2u128.saturating_pow(attempt));
        Duration::from_millis(backoff.min(self.max_backoff.as_millis()) as u64)
    }
}

/// Relay client configuration
#[derive(Debug, Clone)]
pub struct HyperclientConfig {
    pub source: ChainDescriptor,
    pub dest: ChainDescriptor,
    /// Hyperbridge RPC endpoint
    pub hyperbridge_url: String,
    /// Indexer endpoint queried instead of the Hyperbridge node when set. It
    /// must serve `hyperbridge_requestStatusHistory` over the same JSON-RPC
    /// envelope.
    pub indexer_url: Option<String>,
    /// Per-call HTTP timeout
    pub request_timeout: Duration,
}

#[derive(Serialize)]
struct StatusQuery<'a> {
    request: &'a PostRequest,
    source: &'a ChainDescriptor,
    dest: &'a ChainDescriptor,
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: [StatusQuery<'a>; 1],
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Vec<WireStatus>>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    fn into_history(self) -> Result<Vec<WireStatus>, RelayError> {
        if let Some(err) = self.error {
            return Err(if err.code == UNKNOWN_REQUEST_CODE {
                RelayError::UnknownRequest(err.message)
            } else {
                RelayError::InvalidResponse(format!("{} (code {})", err.message, err.code))
            });
        }
        self.result
            .ok_or_else(|| RelayError::InvalidResponse("missing result".to_string()))
    }
}

/// JSON-RPC client for the Hyperbridge network
pub struct HyperbridgeClient {
    http: reqwest::Client,
    endpoint: String,
    config: HyperclientConfig,
    next_id: AtomicU64,
}

impl HyperbridgeClient {
    pub fn new(config: HyperclientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .wrap_err("Failed to build relay HTTP client")?;

        let endpoint = config
            .indexer_url
            .clone()
            .unwrap_or_else(|| config.hyperbridge_url.clone());
        url::Url::parse(&endpoint)
            .wrap_err_with(|| format!("Invalid relay endpoint: {}", endpoint))?;

        info!(
            endpoint = %endpoint,
            source = %config.source.state_machine,
            dest = %config.dest.state_machine,
            "Created Hyperbridge client"
        );

        Ok(Self {
            http,
            endpoint,
            config,
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl RelayClient for HyperbridgeClient {
    async fn status_history(&self, request: &PostRequest) -> Result<Vec<WireStatus>, RelayError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method: STATUS_HISTORY_METHOD,
            params: [StatusQuery {
                request,
                source: &self.config.source,
                dest: &self.config.dest,
            }],
        };

        debug!(id = id, request = %request, "Querying relay status history");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RelayError::Unavailable(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(RelayError::InvalidResponse(format!("HTTP {}", status)));
        }

        let parsed: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RelayError::InvalidResponse(e.to_string()))?;

        parsed.into_history()
    }
}
