//! Common numeric helpers for the analytics calculations.
//!
//! All rounding here is half away from zero, so `0.5` becomes `1` and
//! `-0.5` becomes `-1`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use energy_core::analytics::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a decimal value to the nearest whole number, half away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use energy_core::analytics::common::round_whole;
///
/// assert_eq!(round_whole(dec!(119.5)), dec!(120));
/// assert_eq!(round_whole(dec!(119.49)), dec!(119));
/// ```
pub fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Divides `numerator` by `denominator`, yielding zero for a zero denominator.
///
/// `None` when the quotient does not fit in a `Decimal`.
pub fn ratio_or_zero(
    numerator: Decimal,
    denominator: Decimal,
) -> Option<Decimal> {
    if denominator.is_zero() {
        Some(Decimal::ZERO)
    } else {
        numerator.checked_div(denominator)
    }
}
