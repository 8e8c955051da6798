//! Request status tracker
//!
//! Follows a post request through
//! `Pending -> SourceFinalized -> HyperbridgeDelivered -> HyperbridgeFinalized
//! -> DestinationDelivered`, or into `Timeout` from any non-terminal stage.
//!
//! # Polling
//!
//! The relay is polled for the request's status history every
//! `poll_interval`. Each poll is retried with exponential backoff on transport
//! failures; once `RetryConfig::max_retries` attempts fail the tracker gives up
//! with [`TrackerError::TrackingUnavailable`].
//!
//! # Bounded waiting
//!
//! Once the request's own `timeout_timestamp` has passed without a terminal status from the relay,
//! the tracker emits `Timeout` itself. With a stage timeout configured, going
//! that long without a new status ends the stream with
//! [`TrackerError::StageTimeout`].
//!
//! # Self-relay
//!
//! With a [`SelfRelayer`] configured, the first `HyperbridgeFinalized` status a
//! subscription sees triggers exactly one delivery attempt. The outcome is
//! reported as its own stream item and never ends the stream.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy::primitives::{Bytes, B256};
use futures::stream::{self, Stream};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::relay::{RelayClient, RelayError, RetryConfig};
use crate::self_relay::{decode_handle_post_requests, SelfRelayer};
use crate::status::{MessageStatus, Stage, StatusError, WireStatus};
use crate::types::PostRequest;

/// Default interval between relay polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Item produced by a status subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// The request reached a new status
    Status(MessageStatus),
    /// Our own delivery transaction was included on the destination chain
    SelfRelayed { tx_hash: B256 },
    /// Self-relay could not be completed; delivery is left to other relayers
    SelfRelayFailed { reason: String },
}

/// Errors while tracking a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("tracking unavailable after {attempts} attempts: {last_error}")]
    TrackingUnavailable { attempts: u32, last_error: String },
    #[error("request not recognized by relay: {0}")]
    UnknownRequest(String),
    #[error("invalid relay response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error("status out of order: {from:?} -> {to:?}")]
    OutOfOrder { from: Stage, to: Stage },
    #[error("relay history shrank from {seen} to {len} entries")]
    HistoryRegressed { seen: usize, len: usize },
    #[error("no status after {stage:?} for {waited:?}")]
    StageTimeout { stage: Stage, waited: Duration },
}

/// Tracks post requests against a relay
pub struct StatusTracker<R> {
    relay: R,
    self_relayer: Option<Arc<dyn SelfRelayer>>,
    poll_interval: Duration,
    stage_timeout: Option<Duration>,
    retry: RetryConfig,
}

impl<R: RelayClient> StatusTracker<R> {
    pub fn new(relay: R) -> Self {
        Self {
            relay,
            self_relayer: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            stage_timeout: None,
            retry: RetryConfig::default(),
        }
    }

    /// Enable self-relay at `HyperbridgeFinalized`
    pub fn with_self_relayer(mut self, self_relayer: Arc<dyn SelfRelayer>) -> Self {
        self.self_relayer = Some(self_relayer);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Give up when no new status arrives within `stage_timeout`
    pub fn with_stage_timeout(mut self, stage_timeout: Duration) -> Self {
        self.stage_timeout = Some(stage_timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Current status of `request`. Returns `Pending` until the relay has
    /// recorded any progress.
    pub async fn query_status(&self, request: &PostRequest) -> Result<MessageStatus, TrackerError> {
        let history = self.fetch_statuses(request).await?;
        Ok(history.into_iter().last().unwrap_or(MessageStatus::Pending))
    }

    /// Stream of events for `request`, starting at its current status.
    ///
    /// The stream ends after `DestinationDelivered` or `Timeout`, or after the
    /// first error.
    pub fn subscribe_status(
        &self,
        request: &PostRequest,
    ) -> impl Stream<Item = Result<TrackerEvent, TrackerError>> + '_ {
        info!(request = %request, "Subscribing to request status");

        stream::unfold(Subscription::new(self, request.clone()), |mut sub| async move {
            let item = sub.next_event().await?;
            Some((item, sub))
        })
    }

    async fn fetch_statuses(&self, request: &PostRequest) -> Result<Vec<MessageStatus>, TrackerError> {
        let wire = self.fetch_with_retry(request).await?;
        let history = wire
            .into_iter()
            .map(MessageStatus::try_from)
            .filter(|status| !matches!(status, Ok(MessageStatus::Pending)))
            .collect::<Result<Vec<_>, _>>()?;

        validate_history(&history)?;
        Ok(history)
    }

    async fn fetch_with_retry(&self, request: &PostRequest) -> Result<Vec<WireStatus>, TrackerError> {
        let attempts = self.retry.max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            match self.relay.status_history(request).await {
                Ok(history) => return Ok(history),
                Err(e) if e.is_retryable() => {
                    warn!(attempt = attempt + 1, error = %e, "Relay query failed");
                    last_error = Some(e);
                }
                Err(RelayError::UnknownRequest(msg)) => {
                    return Err(TrackerError::UnknownRequest(msg))
                }
                Err(e) => return Err(TrackerError::InvalidResponse(e.to_string())),
            }

            if attempt + 1 < attempts {
                let backoff = self.retry.backoff_for_attempt(attempt);
                debug!(
                    attempt = attempt + 1,
                    backoff_ms = backoff.as_millis(),
                    "Backing off before retry"
                );
                tokio::time::sleep(backoff).await;
            }
        }

        Err(TrackerError::TrackingUnavailable {
            attempts,
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}

async fn self_relay(relayer: &dyn SelfRelayer, calldata: &Bytes) -> TrackerEvent {
    let call = match decode_handle_post_requests(calldata) {
        Ok(call) => call,
        Err(e) => {
            warn!(error = %e, "Cannot decode delivery calldata, skipping self-relay");
            return TrackerEvent::SelfRelayFailed {
                reason: e.to_string(),
            };
        }
    };

    match relayer.submit(call).await {
        Ok(tx_hash) => {
            info!(tx_hash = %tx_hash, "Self-relay succeeded");
            TrackerEvent::SelfRelayed { tx_hash }
        }
        Err(e) => {
            error!(error = %e, "Error self-relaying");
            TrackerEvent::SelfRelayFailed {
                reason: e.to_string(),
            }
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn validate_history(history: &[MessageStatus]) -> Result<(), TrackerError> {
    let mut last = Stage::Pending;
    for status in history {
        let stage = status.stage();
        if !last.can_advance_to(stage) {
            return Err(TrackerError::OutOfOrder {
                from: last,
                to: stage,
            });
        }
        last = stage;
    }
    Ok(())
}

enum Step {
    Emit(TrackerEvent),
    SelfRelay(Arc<dyn SelfRelayer>, Bytes),
}

/// Driving state of one `subscribe_status` call
struct Subscription<'a, R> {
    tracker: &'a StatusTracker<R>,
    request: PostRequest,
    /// History entries consumed so far; `None` before the first poll
    seen: Option<usize>,
    last: Stage,
    /// When `last` was reached
    last_progress: Instant,
    queue: VecDeque<Step>,
    self_relay_attempted: bool,
    done: bool,
}

impl<'a, R: RelayClient> Subscription<'a, R> {
    fn new(tracker: &'a StatusTracker<R>, request: PostRequest) -> Self {
        Self {
            tracker,
            request,
            seen: None,
            last: Stage::Pending,
            last_progress: Instant::now(),
            queue: VecDeque::new(),
            self_relay_attempted: false,
            done: false,
        }
    }

    async fn next_event(&mut self) -> Option<Result<TrackerEvent, TrackerError>> {
        loop {
            if let Some(step) = self.queue.pop_front() {
                let event = match step {
                    Step::Emit(event) => event,
                    Step::SelfRelay(relayer, calldata) => {
                        self_relay(relayer.as_ref(), &calldata).await
                    }
                };
                return Some(Ok(event));
            }

            if self.done {
                return None;
            }

            match self.poll().await {
                Ok(true) => continue,
                Ok(false) => tokio::time::sleep(self.tracker.poll_interval).await,
                Err(e) => {
                    warn!(request = %self.request, error = %e, "Status subscription failed");
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }

    /// Poll the relay once, queueing anything new. Returns whether the queue
    /// has work.
    async fn poll(&mut self) -> Result<bool, TrackerError> {
        let history = self.tracker.fetch_statuses(&self.request).await?;
        let len = history.len();

        match self.seen {
            // a fresh subscription begins at the current status
            None => {
                if let Some(current) = history.into_iter().last() {
                    self.push(current);
                }
            }
            Some(seen) if len < seen => {
                return Err(TrackerError::HistoryRegressed { seen, len });
            }
            Some(seen) => {
                for status in history.into_iter().skip(seen) {
                    let stage = status.stage();
                    if !self.last.can_advance_to(stage) {
                        return Err(TrackerError::OutOfOrder {
                            from: self.last,
                            to: stage,
                        });
                    }
                    self.push(status);
                }
            }
        }

        self.seen = Some(len);

        if !self.done {
            self.check_deadlines()?;
        }
        Ok(!self.queue.is_empty())
    }

    /// Enforce the request timeout and the stage timeout while the relay has
    /// nothing terminal to report
    fn check_deadlines(&mut self) -> Result<(), TrackerError> {
        if self.request.is_expired_at(unix_now()) {
            info!(
                request = %self.request,
                timeout = self.request.timeout_timestamp,
                "Request expired without delivery"
            );
            self.push(MessageStatus::Timeout);
            return Ok(());
        }

        if let Some(limit) = self.tracker.stage_timeout {
            let waited = self.last_progress.elapsed();
            if waited >= limit {
                return Err(TrackerError::StageTimeout {
                    stage: self.last,
                    waited,
                });
            }
        }
        Ok(())
    }

    fn push(&mut self, status: MessageStatus) {
        debug!(request = %self.request, status = %status, "Observed status");

        self.last = status.stage();
        self.last_progress = Instant::now();
        if status.is_terminal() {
            self.done = true;
        }

        let calldata = match &status {
            MessageStatus::HyperbridgeFinalized { calldata, .. } => Some(calldata.clone()),
            _ => None,
        };

        self.queue.push_back(Step::Emit(TrackerEvent::Status(status)));

        if let (Some(calldata), Some(relayer)) = (calldata, &self.tracker.self_relayer) {
            if !self.self_relay_attempted {
                self.self_relay_attempted = true;
                self.queue.push_back(Step::SelfRelay(relayer.clone(), calldata));
            }
        }
    }
}
