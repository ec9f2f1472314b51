//! JSON-RPC adapters for the wallet and the chain.

pub mod client;
pub mod service;
pub mod wallet;

pub use client::JsonRpcClient;
pub use service::RpcContractService;
pub use wallet::JsonRpcWallet;

use crate::common::error::{DappError, Result};

/// Parses a `0x`-prefixed hex quantity such as a chain id or block number.
pub fn parse_quantity(value: &str) -> Result<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| DappError::RpcError(format!("expected hex quantity, got {value:?}")))?;
    if digits.is_empty() {
        return Err(DappError::RpcError(format!("empty hex quantity {value:?}")));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| DappError::RpcError(format!("invalid hex quantity {value:?}: {e}")))
}
