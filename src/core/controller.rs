//! Transaction action controller.
//!
//! A synchronous state machine driving the three contract actions through
//! `Idle -> Submitting -> Confirming -> Resolved -> Idle`. It owns the single
//! action slot, the amount fields and the status message. It performs no I/O;
//! [`DepositDapp`](crate::core::dapp::DepositDapp) feeds it the results of
//! submissions and receipt polls and acts on the [`Resolution`]s it returns.

use alloy_primitives::TxHash;

use crate::common::error::{DappError, Result};
use crate::types::action::{
    ActionKind, AmountInputs, Outcome, ReceiptStatus, Resolution, TransactionRequest, TxPhase,
};

#[derive(Debug, Clone)]
struct ActiveRequest {
    request: TransactionRequest,
    handle: Option<TxHash>,
}

/// Single-slot lifecycle state for deposit, withdraw and owner withdraw.
#[derive(Debug, Default)]
pub struct ActionController {
    active: Option<ActiveRequest>,
    inputs: AmountInputs,
    status: String,
    last_resolution: Option<Resolution>,
}

impl ActionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest status message. Empty until the first action.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    #[must_use]
    pub fn inputs(&self) -> &AmountInputs {
        &self.inputs
    }

    pub fn set_deposit_amount(&mut self, value: impl Into<String>) {
        self.inputs.deposit = value.into();
    }

    pub fn set_withdraw_amount(&mut self, value: impl Into<String>) {
        self.inputs.withdraw = value.into();
    }

    #[must_use]
    pub fn active_kind(&self) -> Option<ActionKind> {
        self.active.as_ref().map(|a| a.request.kind)
    }

    #[must_use]
    pub fn active_request(&self) -> Option<&TransactionRequest> {
        self.active.as_ref().map(|a| &a.request)
    }

    #[must_use]
    pub fn active_handle(&self) -> Option<TxHash> {
        self.active.as_ref().and_then(|a| a.handle)
    }

    #[must_use]
    pub fn phase(&self) -> TxPhase {
        match &self.active {
            None => TxPhase::Idle,
            Some(ActiveRequest { handle: None, .. }) => TxPhase::Submitting,
            Some(ActiveRequest { handle: Some(_), .. }) => TxPhase::Confirming,
        }
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Whether `kind` is the action currently in flight.
    #[must_use]
    pub fn is_loading(&self, kind: ActionKind) -> bool {
        self.active_kind() == Some(kind)
    }

    /// Whether a request for `kind` would be accepted right now.
    #[must_use]
    pub fn can_submit(&self, kind: ActionKind) -> bool {
        !self.is_busy()
            && self
                .inputs
                .field(kind)
                .is_none_or(|amount| !amount.trim().is_empty())
    }

    #[must_use]
    pub fn last_resolution(&self) -> Option<&Resolution> {
        self.last_resolution.as_ref()
    }

    /// Writes `amount` into the field backing `kind` ahead of a submission.
    /// Refused with `Busy`, leaving the fields untouched, while the slot is
    /// taken.
    pub fn stage(&mut self, kind: ActionKind, amount: Option<String>) -> Result<()> {
        if self.is_busy() {
            return Err(DappError::Busy);
        }
        match (kind, amount) {
            (ActionKind::Deposit, Some(amount)) => self.inputs.deposit = amount,
            (ActionKind::Withdraw, Some(amount)) => self.inputs.withdraw = amount,
            _ => {}
        }
        Ok(())
    }

    /// `Idle -> Submitting`.
    ///
    /// Takes the action slot and returns the request to dispatch. Fails
    /// without changing any state when the slot is taken, or when a
    /// deposit/withdraw amount is empty or malformed.
    pub fn begin(&mut self, kind: ActionKind) -> Result<TransactionRequest> {
        if self.is_busy() {
            return Err(DappError::Busy);
        }
        let amount = self.inputs.field(kind);
        if kind.requires_amount() && amount.is_none_or(|a| a.trim().is_empty()) {
            return Err(DappError::EmptyAmount);
        }

        let request = TransactionRequest::for_action(kind, amount)?;
        self.status = kind.processing_message().to_string();
        self.active = Some(ActiveRequest {
            request: request.clone(),
            handle: None,
        });
        Ok(request)
    }

    /// `Submitting -> Confirming`. The handle can be assigned only once.
    pub fn on_submitted(&mut self, handle: TxHash) -> Result<()> {
        match &mut self.active {
            Some(active) if active.handle.is_none() => {
                active.handle = Some(handle);
                Ok(())
            }
            Some(active) => Err(DappError::InternalError(format!(
                "{} already has handle {:?}",
                active.request.kind,
                active.handle
            ))),
            None => Err(DappError::InternalError(
                "submission reported with no active action".to_string(),
            )),
        }
    }

    /// `Submitting -> Resolved{failed}`. The error text becomes the status
    /// verbatim and the amount fields are left untouched.
    pub fn on_submission_failed(&mut self, message: impl Into<String>) -> Option<Resolution> {
        if self.phase() != TxPhase::Submitting {
            return None;
        }
        let active = self.active.take()?;
        let message = message.into();
        self.status.clone_from(&message);
        Some(self.record(Resolution {
            kind: active.request.kind,
            handle: None,
            outcome: Outcome::Failed { message },
            refresh_balances: false,
        }))
    }

    /// Reacts to a receipt poll for `handle`.
    ///
    /// Acts only when `handle` belongs to the active request, so a handle
    /// resolves at most once. On confirmation the balance refresh is
    /// requested, the success message set, and the action's amount cleared.
    pub fn on_receipt(&mut self, handle: TxHash, receipt: &ReceiptStatus) -> Option<Resolution> {
        if self.active_handle() != Some(handle) {
            return None;
        }
        match receipt {
            ReceiptStatus::Pending => None,
            ReceiptStatus::Confirmed { block_number } => {
                let active = self.active.take()?;
                let kind = active.request.kind;
                self.status = kind.success_message(active.request.amount.as_deref());
                self.inputs.clear(kind);
                Some(self.record(Resolution {
                    kind,
                    handle: Some(handle),
                    outcome: Outcome::Confirmed {
                        block_number: *block_number,
                    },
                    refresh_balances: true,
                }))
            }
            ReceiptStatus::Failed { reason } => self.fail_active(handle, reason.clone()),
        }
    }

    /// Gives up on `handle` after the confirmation timeout.
    pub fn on_confirmation_timeout(&mut self, handle: TxHash) -> Option<Resolution> {
        if self.active_handle() != Some(handle) {
            return None;
        }
        let message = DappError::ConfirmationTimeout(handle).to_string();
        self.fail_active(handle, message)
    }

    /// Abandons the wait for `handle` at shutdown. The transaction may still
    /// land; only the slot is released.
    pub fn on_cancelled(&mut self, handle: TxHash) -> Option<Resolution> {
        if self.active_handle() != Some(handle) {
            return None;
        }
        self.fail_active(handle, format!("Stopped waiting for confirmation of {handle}"))
    }

    fn fail_active(&mut self, handle: TxHash, message: String) -> Option<Resolution> {
        let active = self.active.take()?;
        self.status.clone_from(&message);
        Some(self.record(Resolution {
            kind: active.request.kind,
            handle: Some(handle),
            outcome: Outcome::Failed { message },
            refresh_balances: false,
        }))
    }

    fn record(&mut self, resolution: Resolution) -> Resolution {
        self.last_resolution = Some(resolution.clone());
        resolution
    }
}
