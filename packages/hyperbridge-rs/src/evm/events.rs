//! Host event parsing
//!
//! Extracts the ISMP post request a transaction dispatched from its receipt
//! logs. The first host event in the receipt must be a `PostRequestEvent`;
//! anything else means the dispatch did not do what the caller expected and
//! tracking must not start.

use alloy::primitives::{Bytes, Log, U256};
use alloy::rpc::types::TransactionReceipt;
use alloy::sol_types::SolEventInterface;
use thiserror::Error;
use tracing::debug;

use crate::evm::contracts::EvmHost::{EvmHostEvents, PostRequestEvent};
use crate::types::PostRequest;

/// Errors extracting a post request from receipt logs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("unexpected event type: expected PostRequestEvent, found {found}")]
    UnexpectedEvent { found: String },
    #[error("receipt has no block number")]
    MissingBlockNumber,
    #[error("{field} does not fit in u64: {value}")]
    Overflow { field: &'static str, value: U256 },
}

fn event_name(event: &EvmHostEvents) -> &'static str {
    match event {
        EvmHostEvents::PostRequestEvent(_) => "PostRequestEvent",
        EvmHostEvents::PostResponseEvent(_) => "PostResponseEvent",
        EvmHostEvents::GetRequestEvent(_) => "GetRequestEvent",
    }
}

/// Decode the first host event found in `logs`. Logs from other contracts or
/// with unknown signatures are skipped.
fn first_host_event(logs: &[Log]) -> Option<EvmHostEvents> {
    logs.iter()
        .find_map(|log| EvmHostEvents::decode_log(log, true).ok())
        .map(|decoded| decoded.data)
}

/// Build a [`PostRequest`] from the host event in `logs`, included at `height`
pub fn post_request_from_logs(logs: &[Log], height: u64) -> Result<PostRequest, EventError> {
    match first_host_event(logs) {
        Some(EvmHostEvents::PostRequestEvent(event)) => {
            let request = post_request_from_event(event, height)?;
            debug!(request = %request, "Decoded PostRequestEvent");
            Ok(request)
        }
        Some(other) => Err(EventError::UnexpectedEvent {
            found: event_name(&other).to_string(),
        }),
        None => Err(EventError::UnexpectedEvent {
            found: "no host event".to_string(),
        }),
    }
}

/// Build a [`PostRequest`] from a mined dispatch transaction
pub fn post_request_from_receipt(receipt: &TransactionReceipt) -> Result<PostRequest, EventError> {
    let height = receipt
        .block_number
        .ok_or(EventError::MissingBlockNumber)?;
    let logs: Vec<Log> = receipt
        .inner
        .logs()
        .iter()
        .map(|log| log.inner.clone())
        .collect();

    post_request_from_logs(&logs, height)
}

fn post_request_from_event(
    event: PostRequestEvent,
    height: u64,
) -> Result<PostRequest, EventError> {
    let nonce = u64::try_from(event.nonce).map_err(|_| EventError::Overflow {
        field: "nonce",
        value: event.nonce,
    })?;
    let timeout_timestamp =
        u64::try_from(event.timeoutTimestamp).map_err(|_| EventError::Overflow {
            field: "timeoutTimestamp",
            value: event.timeoutTimestamp,
        })?;

    Ok(PostRequest {
        source: event.source,
        dest: event.dest,
        from: Bytes::copy_from_slice(event.from.as_slice()),
        to: event.to,
        nonce,
        timeout_timestamp,
        body: event.body,
        fee: event.fee,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evm::contracts::EvmHost::PostResponseEvent;
    use alloy::primitives::{Address, LogData, B256};
    use alloy::sol_types::SolEvent;

    fn host() -> Address {
        Address::repeat_byte(0xA3)
    }

    fn post_request_event() -> PostRequestEvent {
        PostRequestEvent {
            source: "BSC".to_string(),
            dest: "OPTI".to_string(),
            from: Address::repeat_byte(0x32),
            to: Bytes::from(vec![0x32; 20]),
            nonce: U256::from(981u64),
            timeoutTimestamp: U256::from(1_700_003_600u64),
            body: Bytes::from_static(b"ping"),
            fee: U256::ZERO,
        }
    }

    fn foreign_log() -> Log {
        Log {
            address: Address::repeat_byte(0x15),
            data: LogData::new_unchecked(vec![B256::repeat_byte(0x42)], Bytes::new()),
        }
    }

    #[test]
    fn test_post_request_decoded() {
        let logs = vec![
            foreign_log(),
            Log {
                address: host(),
                data: post_request_event().encode_log_data(),
            },
        ];

        let request = post_request_from_logs(&logs, 1234).unwrap();

        assert_eq!(request.source, "BSC");
        assert_eq!(request.dest, "OPTI");
        assert_eq!(request.nonce, 981);
        assert_eq!(request.timeout_timestamp, 1_700_003_600);
        assert_eq!(request.from.as_ref(), Address::repeat_byte(0x32).as_slice());
        assert_eq!(request.body.as_ref(), b"ping");
        assert_eq!(request.height, 1234);
    }

    #[test]
    fn test_no_host_event_is_fatal() {
        let err = post_request_from_logs(&[foreign_log()], 1).unwrap_err();
        assert!(matches!(err, EventError::UnexpectedEvent { .. }));

        let err = post_request_from_logs(&[], 1).unwrap_err();
        assert!(matches!(err, EventError::UnexpectedEvent { .. }));
    }

    #[test]
    fn test_wrong_host_event_is_fatal() {
        let response = PostResponseEvent {
            source: "BSC".to_string(),
            dest: "OPTI".to_string(),
            from: Address::ZERO,
            to: Bytes::new(),
            nonce: U256::from(1u64),
            timeoutTimestamp: U256::ZERO,
            body: Bytes::new(),
            response: Bytes::new(),
            responseTimeoutTimestamp: U256::ZERO,
            fee: U256::ZERO,
        };
        let logs = vec![
            Log {
                address: host(),
                data: response.encode_log_data(),
            },
            Log {
                address: host(),
                data: post_request_event().encode_log_data(),
            },
        ];

        let err = post_request_from_logs(&logs, 1).unwrap_err();
        assert_eq!(
            err,
            EventError::UnexpectedEvent {
                found: "PostResponseEvent".to_string()
            }
        );
    }

    #[test]
    fn test_nonce_overflow() {
        let event = PostRequestEvent {
            nonce: U256::MAX,
            ..post_request_event()
        };
        let logs = vec![Log {
            address: host(),
            data: event.encode_log_data(),
        }];

        let err = post_request_from_logs(&logs, 1).unwrap_err();
        assert!(matches!(err, EventError::Overflow { field: "nonce", .. }));
    }
}
