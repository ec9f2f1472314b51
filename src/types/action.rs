//! Action, request and lifecycle types shared by the controller and the
//! collaborator traits.

use std::fmt;

use alloy_primitives::{Address, TxHash, U256};

use crate::common::error::Result;
use crate::types::units::parse_ether;

/// The three user operations on the deposit contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Deposit,
    Withdraw,
    OwnerWithdraw,
}

impl ActionKind {
    /// All kinds, in display order.
    pub const ALL: [ActionKind; 3] = [Self::Deposit, Self::Withdraw, Self::OwnerWithdraw];

    /// Contract function invoked by this action.
    #[must_use]
    pub fn function_name(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::OwnerWithdraw => "ownerWithdraw",
        }
    }

    /// Whether the action reads an amount field.
    #[must_use]
    pub fn requires_amount(self) -> bool {
        !matches!(self, Self::OwnerWithdraw)
    }

    /// Status text shown while the action is in flight.
    #[must_use]
    pub fn processing_message(self) -> &'static str {
        match self {
            Self::Deposit => "Processing deposit...",
            Self::Withdraw => "Processing withdrawal...",
            Self::OwnerWithdraw => "Processing owner withdrawal...",
        }
    }

    /// Status text shown once the action is confirmed.
    #[must_use]
    pub fn success_message(self, amount: Option<&str>) -> String {
        let amount = amount.unwrap_or_default();
        match self {
            Self::Deposit => format!("Successfully deposited {amount} ETH"),
            Self::Withdraw => format!("Successfully withdrew {amount} ETH"),
            Self::OwnerWithdraw => "Successfully withdrew all funds".to_string(),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::OwnerWithdraw => "owner withdraw",
        };
        f.write_str(label)
    }
}

/// The two user-edited amount fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmountInputs {
    pub deposit: String,
    pub withdraw: String,
}

impl AmountInputs {
    /// Field backing `kind`, if it has one.
    #[must_use]
    pub fn field(&self, kind: ActionKind) -> Option<&str> {
        match kind {
            ActionKind::Deposit => Some(&self.deposit),
            ActionKind::Withdraw => Some(&self.withdraw),
            ActionKind::OwnerWithdraw => None,
        }
    }

    pub(crate) fn clear(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::Deposit => self.deposit.clear(),
            ActionKind::Withdraw => self.withdraw.clear(),
            ActionKind::OwnerWithdraw => {}
        }
    }
}

/// A single ABI-encodable argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint(U256),
    Address(Address),
}

/// A contract call derived from an action at submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub kind: ActionKind,
    pub function: &'static str,
    pub args: Vec<AbiValue>,
    /// Wei attached to the call (payable functions only).
    pub value: Option<U256>,
    /// Amount text as entered, kept for the success message.
    pub amount: Option<String>,
}

impl TransactionRequest {
    /// Builds the request for `kind`.
    ///
    /// `deposit` carries the amount as call value, `withdraw` as its single
    /// `uint256` argument and `ownerWithdraw` ignores `amount` entirely.
    pub fn for_action(kind: ActionKind, amount: Option<&str>) -> Result<Self> {
        let function = kind.function_name();
        match kind {
            ActionKind::OwnerWithdraw => Ok(Self {
                kind,
                function,
                args: Vec::new(),
                value: None,
                amount: None,
            }),
            ActionKind::Deposit | ActionKind::Withdraw => {
                let text = amount.unwrap_or_default().trim().to_string();
                let wei = parse_ether(&text)?;
                let (args, value) = if kind == ActionKind::Deposit {
                    (Vec::new(), Some(wei))
                } else {
                    (vec![AbiValue::Uint(wei)], None)
                };
                Ok(Self {
                    kind,
                    function,
                    args,
                    value,
                    amount: Some(text),
                })
            }
        }
    }
}

/// Receipt state reported by the contract call service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptStatus {
    Pending,
    Confirmed { block_number: u64 },
    Failed { reason: String },
}

/// Lifecycle phase of the action slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPhase {
    Idle,
    Submitting,
    Confirming,
}

/// How a request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Confirmed { block_number: u64 },
    Failed { message: String },
}

/// The one-shot result of resolving the active request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub kind: ActionKind,
    /// Absent when submission itself failed.
    pub handle: Option<TxHash>,
    pub outcome: Outcome,
    /// Whether both balances must be re-read.
    pub refresh_balances: bool,
}

impl Resolution {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Confirmed { .. })
    }
}
