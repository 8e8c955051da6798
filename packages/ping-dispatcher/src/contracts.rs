//! Source-chain contract bindings for the ping flow

#![allow(clippy::too_many_arguments)]

use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct PingMessage {
        bytes dest;
        address module;
        uint64 timeout;
        uint64 count;
        uint256 fee;
    }

    /// Demo ISMP module that dispatches post requests to a peer module
    #[sol(rpc)]
    contract PingModule {
        function ping(PingMessage pingMessage) external;
    }

    /// ERC-6160 token used to pay relayer fees
    #[sol(rpc)]
    contract FeeToken {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Testnet faucet handing out fee tokens
    #[sol(rpc)]
    contract TokenFaucet {
        function drip(address token) external;
    }
}
