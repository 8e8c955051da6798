//! ISMP host and handler ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings for the EvmHost
//! (event source) and the HandlerV1 contract (destination entry point used for
//! self-relay).

#![allow(clippy::too_many_arguments)]

use alloy::sol;

sol! {
    /// ISMP post request as carried inside handler messages
    #[derive(Debug, PartialEq, Eq)]
    struct PostRequest {
        bytes source;
        bytes dest;
        uint64 nonce;
        bytes from;
        bytes to;
        uint64 timeoutTimestamp;
        bytes body;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct StateMachineHeight {
        uint256 stateMachineId;
        uint256 height;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Proof {
        StateMachineHeight height;
        bytes32[] multiproof;
        uint256 leafCount;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct PostRequestLeaf {
        PostRequest request;
        uint256 index;
        uint256 kIndex;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct PostRequestMessage {
        Proof proof;
        PostRequestLeaf[] requests;
    }

    /// ISMP host contract. Only the events the tracker consumes are declared.
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract EvmHost {
        /// Emitted when a module dispatches a post request
        event PostRequestEvent(
            string source,
            string dest,
            address indexed from,
            bytes to,
            uint256 indexed nonce,
            uint256 timeoutTimestamp,
            bytes body,
            uint256 fee
        );

        /// Emitted when a module dispatches a post response
        event PostResponseEvent(
            string source,
            string dest,
            address indexed from,
            bytes to,
            uint256 indexed nonce,
            uint256 timeoutTimestamp,
            bytes body,
            bytes response,
            uint256 responseTimeoutTimestamp,
            uint256 fee
        );

        /// Emitted when a module dispatches a get request
        event GetRequestEvent(
            string source,
            string dest,
            address indexed from,
            bytes[] keys,
            uint256 indexed nonce,
            uint256 height,
            uint256 timeoutTimestamp,
            uint256 fee
        );
    }

    /// ISMP handler: entry point for relayers delivering proven messages
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract Handler {
        /// Deliver proven post requests to the host
        function handlePostRequests(address host, PostRequestMessage request) external;

        /// Deliver a consensus update to the host
        function handleConsensus(address host, bytes proof) external;
    }
}
