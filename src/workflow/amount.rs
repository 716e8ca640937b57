//! Base-unit amount handling.
//!
//! Every ledger operation takes integer base units (`human × 10^decimals`).
//! Human amounts arrive as decimal strings and must convert exactly; a
//! fractional remainder below the mint's precision is rejected, never
//! truncated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AmountError {
    #[error("amount '{raw}' is not a valid decimal number")]
    Malformed { raw: String },

    #[error("amount '{raw}' is negative")]
    Negative { raw: String },

    #[error("amount '{raw}' is not representable at {decimals} decimal places")]
    TooPrecise { raw: String, decimals: u8 },

    #[error("amount '{raw}' overflows at {decimals} decimal places")]
    Overflow { raw: String, decimals: u8 },
}

/// Convert a human-readable decimal amount to integer base units.
///
/// `base_units("100", 2)` is `10000`; `base_units("1.5", 2)` is `150`;
/// `base_units("1.005", 2)` is `TooPrecise`.
pub fn base_units(human: &str, decimals: u8) -> Result<u64, AmountError> {
    let raw = human.trim();
    if raw.starts_with('-') {
        return Err(AmountError::Negative {
            raw: human.to_string(),
        });
    }

    let (integral, fractional) = match raw.split_once('.') {
        Some((i, f)) => (i, f),
        None => (raw, ""),
    };
    if integral.is_empty() && fractional.is_empty() {
        return Err(AmountError::Malformed {
            raw: human.to_string(),
        });
    }
    if !integral.chars().all(|c| c.is_ascii_digit())
        || !fractional.chars().all(|c| c.is_ascii_digit())
    {
        return Err(AmountError::Malformed {
            raw: human.to_string(),
        });
    }

    // Digits past the mint's precision must all be zero.
    let precision = decimals as usize;
    if fractional.len() > precision && fractional[precision..].bytes().any(|b| b != b'0') {
        return Err(AmountError::TooPrecise {
            raw: human.to_string(),
            decimals,
        });
    }

    let overflow = || AmountError::Overflow {
        raw: human.to_string(),
        decimals,
    };
    let scale = 10u64.checked_pow(decimals as u32).ok_or_else(overflow)?;

    let whole: u64 = if integral.is_empty() {
        0
    } else {
        integral.parse().map_err(|_| overflow())?
    };

    let kept = &fractional[..fractional.len().min(precision)];
    let mut frac: u64 = if kept.is_empty() {
        0
    } else {
        kept.parse().map_err(|_| overflow())?
    };
    // Right-pad to the full precision: "1.5" at 2 decimals is 50 base units.
    for _ in kept.len()..precision {
        frac = frac.checked_mul(10).ok_or_else(overflow)?;
    }

    whole
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(frac))
        .ok_or_else(overflow)
}

/// Render base units back into a human-readable decimal string.
pub fn format_base_units(base: u64, decimals: u8) -> String {
    if decimals == 0 {
        return base.to_string();
    }
    let scale = 10u64.saturating_pow(decimals as u32);
    let whole = base / scale;
    let frac = base % scale;
    format!("{whole}.{frac:0width$}", width = decimals as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_amounts_scale_exactly() {
        assert_eq!(base_units("100", 2), Ok(10_000));
        assert_eq!(base_units("50", 2), Ok(5_000));
        assert_eq!(base_units("25", 2), Ok(2_500));
        assert_eq!(base_units("0", 9), Ok(0));
        assert_eq!(base_units("7", 0), Ok(7));
    }

    #[test]
    fn exact_fractions_are_accepted() {
        assert_eq!(base_units("1.5", 2), Ok(150));
        assert_eq!(base_units("1.50", 2), Ok(150));
        assert_eq!(base_units("1.500", 2), Ok(150));
        assert_eq!(base_units("0.01", 2), Ok(1));
        assert_eq!(base_units(".5", 1), Ok(5));
    }

    #[test]
    fn inexact_fractions_are_rejected_not_truncated() {
        assert!(matches!(
            base_units("1.005", 2),
            Err(AmountError::TooPrecise { .. })
        ));
        assert!(matches!(
            base_units("0.1", 0),
            Err(AmountError::TooPrecise { .. })
        ));
    }

    #[test]
    fn negative_and_malformed_amounts_are_rejected() {
        assert!(matches!(
            base_units("-1", 2),
            Err(AmountError::Negative { .. })
        ));
        assert!(matches!(
            base_units("", 2),
            Err(AmountError::Malformed { .. })
        ));
        assert!(matches!(
            base_units(".", 2),
            Err(AmountError::Malformed { .. })
        ));
        assert!(matches!(
            base_units("1e3", 2),
            Err(AmountError::Malformed { .. })
        ));
        assert!(matches!(
            base_units("1.2.3", 2),
            Err(AmountError::Malformed { .. })
        ));
    }

    #[test]
    fn overflow_is_reported() {
        assert!(matches!(
            base_units("18446744073709551616", 0),
            Err(AmountError::Overflow { .. })
        ));
        assert!(matches!(
            base_units("1", 20),
            Err(AmountError::Overflow { .. })
        ));
    }

    #[test]
    fn formatting_round_trips_scaled_values() {
        assert_eq!(format_base_units(10_000, 2), "100.00");
        assert_eq!(format_base_units(2_500, 2), "25.00");
        assert_eq!(format_base_units(1, 2), "0.01");
        assert_eq!(format_base_units(42, 0), "42");
    }
}
