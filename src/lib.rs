//! # deposit-dapp
//!
//! A client for an ETH deposit contract. It connects a wallet, submits
//! `deposit`, `withdraw` and `ownerWithdraw` calls, follows each transaction
//! until it is mined, and keeps the account's contract and wallet balances up
//! to date.
//!
//! Signing and broadcasting are left to the wallet; chain reads go through a
//! JSON-RPC node. Both sit behind the [`WalletSessionProvider`] and
//! [`ContractCallService`] traits, so the lifecycle logic in
//! [`ActionController`] can be driven by any implementation.
//!
//! ```no_run
//! use deposit_dapp::{DappConfigBuilder, DepositDapp};
//!
//! # async fn run() -> deposit_dapp::Result<()> {
//! let config = DappConfigBuilder::new()
//!     .with_rpc("https://sepolia.drpc.org")
//!     .with_wallet("http://127.0.0.1:1248")
//!     .contract_address("0x5FbDB2315678afecb367f032d93F642f64180aa3")
//!     .build()?;
//!
//! let dapp = DepositDapp::from_config(config)?;
//! dapp.connect().await?;
//! dapp.set_deposit_amount("0.05")?;
//! let resolution = dapp.deposit().await?;
//! println!("{}", dapp.status()?);
//! # let _ = resolution;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod config;
pub mod contract;
pub mod core;
pub mod rpc;
pub mod session;
pub mod sources;
pub mod types;

pub use common::error::{DappError, Result};
pub use config::{Connector, DappConfig, DappConfigBuilder};
pub use contract::ContractDescriptor;
pub use crate::core::{ActionController, DepositDapp, PageView};
pub use rpc::{JsonRpcClient, JsonRpcWallet, RpcContractService};
pub use session::{SessionRecord, SessionStore};
pub use types::{
    AbiValue, ActionKind, AmountInputs, BalanceSnapshot, ContractCallService, Outcome,
    ReceiptStatus, Resolution, TransactionRequest, TxPhase, WalletSessionProvider,
};
