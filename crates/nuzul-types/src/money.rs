//! Money helpers for SAR and USD amounts
//!
//! All monetary values are `rust_decimal::Decimal`, rounded to 2 decimal
//! places (half-up) at calculation boundaries. The ledger stores SAR; USD
//! appears only at the payment-processor boundary.

use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary precision (2 decimal places, half-up)
pub const MONEY_DECIMALS: u32 = 2;

/// Round a monetary value to standard precision.
///
/// The result always carries exactly two decimal places, so amounts
/// serialize uniformly ("120.00", never "120").
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_DECIMALS);
    rounded
}

/// Convert a SAR amount to USD at the given rate (USD per 1 SAR)
pub fn sar_to_usd(amount_sar: Decimal, sar_to_usd_rate: Decimal) -> Decimal {
    round_money(amount_sar * sar_to_usd_rate)
}
