//! Render model for the single-page front end.

use std::fmt;

use alloy_primitives::{Address, TxHash};

use crate::types::action::{ActionKind, TxPhase};

/// Everything the page shows, captured at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub account: Option<Address>,
    /// `None` while disconnected.
    pub contract_balance: Option<String>,
    /// `None` while disconnected.
    pub wallet_balance: Option<String>,
    pub deposit_amount: String,
    pub withdraw_amount: String,
    pub status: String,
    pub phase: TxPhase,
    pub active: Option<ActionKind>,
    pub pending_handle: Option<TxHash>,
    pub can_deposit: bool,
    pub can_withdraw: bool,
    pub can_owner_withdraw: bool,
}

impl PageView {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    #[must_use]
    pub fn is_loading(&self, kind: ActionKind) -> bool {
        self.active == Some(kind)
    }

    #[must_use]
    pub fn can_submit(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Deposit => self.can_deposit,
            ActionKind::Withdraw => self.can_withdraw,
            ActionKind::OwnerWithdraw => self.can_owner_withdraw,
        }
    }

    /// Button caption for `kind`.
    #[must_use]
    pub fn button_label(&self, kind: ActionKind) -> &'static str {
        if self.is_loading(kind) {
            return "Processing...";
        }
        match kind {
            ActionKind::Deposit => "Deposit",
            ActionKind::Withdraw => "Withdraw",
            ActionKind::OwnerWithdraw => "Owner Withdraw",
        }
    }
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== ETH Deposit Contract ===")?;

        let Some(account) = self.account else {
            writeln!(f, "Wallet not connected. Type `connect` to connect.")?;
            if !self.status.is_empty() {
                writeln!(f, "Status: {}", self.status)?;
            }
            return Ok(());
        };

        writeln!(f, "Connected Account: {account}")?;
        writeln!(
            f,
            "Contract Balance: {} ETH",
            self.contract_balance.as_deref().unwrap_or("0.0")
        )?;
        writeln!(
            f,
            "Wallet Balance:   {} ETH",
            self.wallet_balance.as_deref().unwrap_or("0.0")
        )?;

        let field = |amount: &str| {
            if amount.is_empty() {
                "0.0".to_string()
            } else {
                amount.to_string()
            }
        };
        writeln!(
            f,
            "[{}] amount: {}",
            self.button_label(ActionKind::Deposit),
            field(&self.deposit_amount)
        )?;
        writeln!(
            f,
            "[{}] amount: {}",
            self.button_label(ActionKind::Withdraw),
            field(&self.withdraw_amount)
        )?;
        writeln!(f, "[{}]", self.button_label(ActionKind::OwnerWithdraw))?;

        if let Some(handle) = self.pending_handle {
            writeln!(f, "Pending transaction: {handle}")?;
        }
        if !self.status.is_empty() {
            writeln!(f, "Status: {}", self.status)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> PageView {
        PageView {
            account: None,
            contract_balance: None,
            wallet_balance: None,
            deposit_amount: String::new(),
            withdraw_amount: String::new(),
            status: String::new(),
            phase: TxPhase::Idle,
            active: None,
            pending_handle: None,
            can_deposit: false,
            can_withdraw: false,
            can_owner_withdraw: false,
        }
    }

    #[test]
    fn test_disconnected_render_hides_balances() {
        let text = view().to_string();
        assert!(text.contains("not connected"));
        assert!(!text.contains("Contract Balance"));
    }

    #[test]
    fn test_loading_label() {
        let mut page = view();
        page.account = Some(Address::repeat_byte(0xab));
        page.active = Some(ActionKind::Withdraw);
        page.contract_balance = Some("1".to_string());
        page.wallet_balance = Some("2.000000".to_string());
        page.status = "Processing withdrawal...".to_string();

        assert_eq!(page.button_label(ActionKind::Withdraw), "Processing...");
        assert_eq!(page.button_label(ActionKind::Deposit), "Deposit");

        let text = page.to_string();
        assert!(text.contains("Contract Balance: 1 ETH"));
        assert!(text.contains("2.000000 ETH"));
        assert!(text.contains("[Processing...] amount"));
        assert!(text.contains("Status: Processing withdrawal..."));
    }
}
