//! Property tests for base-unit amount conversion: integer human amounts
//! scale exactly, exact fractions are accepted, and anything below the
//! mint's precision is rejected rather than truncated.

use mintflow::workflow::{base_units, format_base_units, AmountError};
use proptest::prelude::*;

proptest! {
    #[test]
    fn integer_amounts_scale_exactly(h in 0u64..=1_000_000, d in 0u8..=9) {
        let expected = h * 10u64.pow(d as u32);
        prop_assert_eq!(base_units(&h.to_string(), d), Ok(expected));
    }

    #[test]
    fn exact_fractions_convert_losslessly(units in 0u64..=10_000_000, d in 1u8..=6) {
        let scale = 10u64.pow(d as u32);
        let human = format!("{}.{:0width$}", units / scale, units % scale, width = d as usize);
        prop_assert_eq!(base_units(&human, d), Ok(units));
    }

    #[test]
    fn formatting_inverts_conversion(units in 0u64..=10_000_000, d in 1u8..=6) {
        let human = format_base_units(units, d);
        prop_assert_eq!(base_units(&human, d), Ok(units));
    }

    #[test]
    fn digits_below_the_precision_are_rejected(
        h in 0u64..=1_000,
        d in 0u8..=6,
        extra in 1u64..=9,
    ) {
        // One nonzero digit one place below the mint's precision.
        let human = format!("{}.{}{}", h, "0".repeat(d as usize), extra);
        prop_assert!(
            matches!(
                base_units(&human, d),
                Err(AmountError::TooPrecise { .. })
            ),
            "expected TooPrecise error"
        );
    }

    #[test]
    fn negative_amounts_are_rejected(h in 1u64..=1_000_000, d in 0u8..=9) {
        let human = format!("-{h}");
        prop_assert!(
            matches!(
                base_units(&human, d),
                Err(AmountError::Negative { .. })
            ),
            "expected Negative error"
        );
    }
}
