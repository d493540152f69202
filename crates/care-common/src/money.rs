//! Currency rounding helpers
//!
//! All claim arithmetic is `rust_decimal`; these helpers pin the rounding so
//! the three-way split reconciles cent-exact everywhere.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to whole cents, midpoint away from zero
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Cent-rounded percentage of an amount (`pct` on the 0..=100 scale)
pub fn percent_of(amount: Decimal, pct: Decimal) -> Decimal {
    round_cents(amount * pct / Decimal::ONE_HUNDRED)
}
