//! Money primitives using rust_decimal for precision
//!
//! All monetary inputs crossing the external boundary are untrusted f64
//! values; [`safe_amount`] coerces them into a well-formed [`Decimal`].
//! Internal arithmetic is done on `Decimal` (2dp, half-up).

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
pub const DECIMAL_PLACES: u32 = 2;

/// Maximum accepted monetary amount
const MAX_AMOUNT: f64 = 1_000_000.0;

/// Coerce an untrusted numeric input into a monetary amount.
///
/// Non-finite, negative, or absurdly large values collapse to zero;
/// external amounts are never trusted to be well-formed.
pub fn safe_amount(value: f64) -> Decimal {
    if !value.is_finite() || value < 0.0 || value > MAX_AMOUNT {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value)
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a computed amount to monetary precision
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}
