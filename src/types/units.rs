//! Conversions between decimal ether strings and wei.

use alloy_primitives::U256;

use crate::common::error::{DappError, Result};

/// Decimals of the native currency.
pub const ETHER_DECIMALS: usize = 18;

/// `10^18`, the number of wei in one ether.
pub const WEI_PER_ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

fn invalid(input: &str, reason: &str) -> DappError {
    DappError::InvalidAmount(format!("{input:?}: {reason}"))
}

fn pow10(exp: usize) -> U256 {
    let mut value = U256::from(1u8);
    for _ in 0..exp {
        value *= U256::from(10u8);
    }
    value
}

/// Parses a decimal ether amount such as `"0.05"` into wei.
///
/// Digits past the 18th fractional place are rounded half-up. Signs,
/// exponents and separators are rejected.
pub fn parse_ether(input: &str) -> Result<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DappError::EmptyAmount);
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid(input, "no digits"));
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid(input, "expected a non-negative decimal number"));
    }

    let whole_wei = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10)
            .map_err(|e| invalid(input, &e.to_string()))?
            .checked_mul(WEI_PER_ETHER)
            .ok_or_else(|| invalid(input, "amount too large"))?
    };

    let (kept, round_up) = if fraction.len() > ETHER_DECIMALS {
        let (kept, rest) = fraction.split_at(ETHER_DECIMALS);
        (kept, rest.as_bytes()[0] >= b'5')
    } else {
        (fraction, false)
    };

    let mut fraction_wei = if kept.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(kept, 10).map_err(|e| invalid(input, &e.to_string()))?
            * pow10(ETHER_DECIMALS - kept.len())
    };
    if round_up {
        fraction_wei += U256::from(1u8);
    }

    whole_wei
        .checked_add(fraction_wei)
        .ok_or_else(|| invalid(input, "amount too large"))
}

/// Formats wei as ether in its shortest natural form (`1`, `0.05`, `1.5`).
#[must_use]
pub fn format_ether(wei: U256) -> String {
    let whole = wei / WEI_PER_ETHER;
    let fraction = wei % WEI_PER_ETHER;
    if fraction.is_zero() {
        return whole.to_string();
    }
    let digits = format!("{:0>width$}", fraction.to_string(), width = ETHER_DECIMALS);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Formats wei as ether with exactly `places` decimals, rounding half-up.
#[must_use]
pub fn format_ether_fixed(wei: U256, places: usize) -> String {
    let places = places.min(ETHER_DECIMALS);
    let scale = pow10(ETHER_DECIMALS - places);
    let half = scale / U256::from(2u8);
    let rounded = wei.saturating_add(half) / scale;

    if places == 0 {
        return rounded.to_string();
    }
    let unit = pow10(places);
    let whole = rounded / unit;
    let fraction = rounded % unit;
    format!("{whole}.{:0>places$}", fraction.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(s: &str) -> U256 {
        U256::from_str_radix(s, 10).unwrap()
    }

    #[test]
    fn test_parse_ether_values() {
        assert_eq!(parse_ether("0.05").unwrap(), wei("50000000000000000"));
        assert_eq!(parse_ether("1").unwrap(), WEI_PER_ETHER);
        assert_eq!(parse_ether(".5").unwrap(), wei("500000000000000000"));
        assert_eq!(parse_ether("2.").unwrap(), wei("2000000000000000000"));
        assert_eq!(parse_ether(" 0.02 ").unwrap(), wei("20000000000000000"));
        assert_eq!(parse_ether("0.000000000000000001").unwrap(), U256::from(1u8));
    }

    #[test]
    fn test_parse_ether_rounds_extra_decimals() {
        assert_eq!(parse_ether("0.0000000000000000015").unwrap(), U256::from(2u8));
        assert_eq!(parse_ether("0.0000000000000000014").unwrap(), U256::from(1u8));
    }

    #[test]
    fn test_parse_ether_rejects_garbage() {
        assert!(matches!(parse_ether(""), Err(DappError::EmptyAmount)));
        assert!(matches!(parse_ether("."), Err(DappError::InvalidAmount(_))));
        assert!(matches!(parse_ether("-1"), Err(DappError::InvalidAmount(_))));
        assert!(matches!(parse_ether("1e3"), Err(DappError::InvalidAmount(_))));
        assert!(matches!(parse_ether("1.2.3"), Err(DappError::InvalidAmount(_))));
    }

    #[test]
    fn test_format_ether_natural() {
        assert_eq!(format_ether(WEI_PER_ETHER), "1");
        assert_eq!(format_ether(U256::ZERO), "0");
        assert_eq!(format_ether(wei("1500000000000000000")), "1.5");
        assert_eq!(format_ether(wei("50000000000000000")), "0.05");
        assert_eq!(format_ether(U256::from(1u8)), "0.000000000000000001");
    }

    #[test]
    fn test_format_ether_fixed() {
        assert_eq!(format_ether_fixed(wei("2000000000000000000"), 6), "2.000000");
        assert_eq!(format_ether_fixed(wei("1234567890000000000"), 6), "1.234568");
        assert_eq!(format_ether_fixed(wei("999999500000000000"), 6), "1.000000");
        assert_eq!(format_ether_fixed(WEI_PER_ETHER, 0), "1");
    }
}
