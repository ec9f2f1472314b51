//! Domain types and collaborator traits.

pub mod action;
pub mod balance;
pub mod traits;
pub mod units;

pub use action::{
    AbiValue, ActionKind, AmountInputs, Outcome, ReceiptStatus, Resolution, TransactionRequest,
    TxPhase,
};
pub use balance::BalanceSnapshot;
pub use traits::{ContractCallService, WalletSessionProvider};
