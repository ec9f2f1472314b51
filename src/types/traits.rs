//! Capability traits for the two external collaborators.
//!
//! The dapp never signs, broadcasts or reads chain state itself. It goes
//! through a [`WalletSessionProvider`] for the account and a
//! [`ContractCallService`] for everything that touches the contract.

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::common::error::Result;
use crate::config::Connector;
use crate::types::action::{AbiValue, ReceiptStatus, TransactionRequest};

/// Wallet connection management.
#[async_trait]
pub trait WalletSessionProvider: Send + Sync {
    /// Connects through `connector` and returns the authorized account.
    async fn connect(&self, connector: &Connector) -> Result<Address>;

    /// Drops the current session. A no-op when not connected.
    async fn disconnect(&self) -> Result<()>;

    /// The connected account, if any.
    fn account(&self) -> Option<Address>;
}

/// Submission, confirmation and read access to the deposit contract.
#[async_trait]
pub trait ContractCallService: Send + Sync {
    /// Signs and broadcasts `request` from `from`.
    ///
    /// Rejections by the wallet or node are reported as
    /// [`DappError::SubmissionError`](crate::DappError::SubmissionError).
    async fn submit(&self, from: Address, request: &TransactionRequest) -> Result<TxHash>;

    /// Looks up the receipt for `handle`.
    async fn poll_receipt(&self, handle: &TxHash) -> Result<ReceiptStatus>;

    /// Calls a view function that returns a single `uint256`.
    async fn read_view(&self, function: &str, args: &[AbiValue]) -> Result<U256>;

    /// Native balance of `address`.
    async fn read_native_balance(&self, address: Address) -> Result<U256>;
}
