//! Status stream consumer
//!
//! Logs every tracker event with its explorer link and decides when the
//! dispatcher is done.

use alloy::primitives::B256;
use eyre::{eyre, Result};
use futures::{pin_mut, Stream, StreamExt};
use hyperbridge_rs::{ExplorerUrls, LinkTarget, MessageStatus, TrackerError, TrackerEvent};
use tracing::{info, warn};

/// How tracking ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Request executed on the destination chain
    Delivered { tx_hash: B256 },
    /// Request expired before delivery
    TimedOut,
    /// Delivery submitted by us; tracking stopped on request
    SelfRelayed { tx_hash: B256 },
}

/// Drive `stream` until a terminal status (or a completed self-relay when
/// `stop_after_self_relay` is set)
pub async fn follow<S>(
    stream: S,
    explorers: &ExplorerUrls,
    stop_after_self_relay: bool,
) -> Result<Outcome>
where
    S: Stream<Item = Result<TrackerEvent, TrackerError>>,
{
    pin_mut!(stream);

    while let Some(item) = stream.next().await {
        let event = item.map_err(|e| eyre!("Status stream failed: {}", e))?;

        match event {
            TrackerEvent::Status(status) => {
                log_status(&status, explorers);
                match status {
                    MessageStatus::DestinationDelivered { tx_hash } => {
                        return Ok(Outcome::Delivered { tx_hash })
                    }
                    MessageStatus::Timeout => return Ok(Outcome::TimedOut),
                    _ => {}
                }
            }
            TrackerEvent::SelfRelayed { tx_hash } => {
                info!(
                    url = %explorers.tx_url(LinkTarget::Destination, tx_hash),
                    "Self-relay transaction included"
                );
                if stop_after_self_relay {
                    return Ok(Outcome::SelfRelayed { tx_hash });
                }
            }
            TrackerEvent::SelfRelayFailed { reason } => {
                warn!(reason = %reason, "Self-relay failed, waiting for relayers");
            }
        }
    }

    Err(eyre!("Status stream ended before a terminal status"))
}

fn log_status(status: &MessageStatus, explorers: &ExplorerUrls) {
    match explorers.status_url(status) {
        Some(url) => info!(status = %status, url = %url, "Got Status"),
        None => info!(status = %status, "Got Status"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Bytes;
    use futures::stream;

    fn hash(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    fn status(s: MessageStatus) -> Result<TrackerEvent, TrackerError> {
        Ok(TrackerEvent::Status(s))
    }

    #[tokio::test]
    async fn test_follow_until_delivered() {
        let events = vec![
            status(MessageStatus::SourceFinalized { tx_hash: hash(1) }),
            status(MessageStatus::HyperbridgeDelivered { tx_hash: hash(2) }),
            status(MessageStatus::HyperbridgeFinalized {
                tx_hash: hash(3),
                calldata: Bytes::from_static(&[0xde, 0xad]),
            }),
            Ok(TrackerEvent::SelfRelayed { tx_hash: hash(4) }),
            status(MessageStatus::DestinationDelivered { tx_hash: hash(4) }),
        ];

        let outcome = follow(stream::iter(events), &ExplorerUrls::default(), false)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Delivered { tx_hash: hash(4) });
    }

    #[tokio::test]
    async fn test_follow_stops_after_self_relay() {
        let events = vec![
            status(MessageStatus::HyperbridgeFinalized {
                tx_hash: hash(3),
                calldata: Bytes::new(),
            }),
            Ok(TrackerEvent::SelfRelayed { tx_hash: hash(9) }),
            status(MessageStatus::DestinationDelivered { tx_hash: hash(9) }),
        ];

        let outcome = follow(stream::iter(events), &ExplorerUrls::default(), true)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::SelfRelayed { tx_hash: hash(9) });
    }

    #[tokio::test]
    async fn test_self_relay_failure_is_not_fatal() {
        let events = vec![
            Ok(TrackerEvent::SelfRelayFailed {
                reason: "nonce too low".to_string(),
            }),
            status(MessageStatus::Timeout),
        ];

        let outcome = follow(stream::iter(events), &ExplorerUrls::default(), true)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::TimedOut);
    }

    #[tokio::test]
    async fn test_stream_error_propagates() {
        let events = vec![
            status(MessageStatus::SourceFinalized { tx_hash: hash(1) }),
            Err(TrackerError::TrackingUnavailable {
                attempts: 4,
                last_error: "connection refused".to_string(),
            }),
        ];

        let err = follow(stream::iter(events), &ExplorerUrls::default(), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Status stream failed"));
    }

    #[tokio::test]
    async fn test_stream_ending_early_is_an_error() {
        let events = vec![status(MessageStatus::SourceFinalized { tx_hash: hash(1) })];

        let err = follow(stream::iter(events), &ExplorerUrls::default(), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ended before a terminal status"));
    }
}
