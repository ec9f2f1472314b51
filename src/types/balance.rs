use alloy_primitives::U256;

use crate::types::units::{format_ether, format_ether_fixed};

/// Shown for a balance that is unknown or zero.
pub const EMPTY_BALANCE: &str = "0.0";

/// Decimal places used for the wallet balance.
pub const WALLET_BALANCE_PLACES: usize = 6;

/// Cached balances for the connected account, in wei.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceSnapshot {
    /// Held by the deposit contract for the account (`balanceOf`).
    pub contract: Option<U256>,
    /// Native balance of the account itself.
    pub wallet: Option<U256>,
}

impl BalanceSnapshot {
    /// Contract balance in natural decimal form.
    #[must_use]
    pub fn contract_display(&self) -> String {
        match self.contract {
            Some(wei) if !wei.is_zero() => format_ether(wei),
            _ => EMPTY_BALANCE.to_string(),
        }
    }

    /// Wallet balance rounded to six decimals.
    #[must_use]
    pub fn wallet_display(&self) -> String {
        match self.wallet {
            Some(wei) if !wei.is_zero() => format_ether_fixed(wei, WALLET_BALANCE_PLACES),
            _ => EMPTY_BALANCE.to_string(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
