use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Round a dollar amount to whole cents, halves rounding up.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn non_negative(amount: Decimal) -> Decimal {
    amount.max(Decimal::ZERO)
}

pub fn format_usd(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}

/// Format a rate such as `0.30` as `30%`.
pub fn format_rate(rate: Decimal) -> String {
    format!("{}%", (rate * dec!(100)).normalize())
}
