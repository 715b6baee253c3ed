//! Parsing of the numeric strings handed over by balance providers.

use rust_decimal::Decimal;

use crate::errors::{ApError, ApResult};

/// Parse a decimal amount such as `"1000"` or `" 12.50 "`.
///
/// Surrounding whitespace is ignored. Anything else that is not a plain
/// decimal number is rejected with [`ApError::Parse`].
pub fn parse_amount(raw: &str) -> ApResult<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApError::Parse {
            input: raw.to_string(),
            message: "empty amount".to_string(),
        });
    }

    trimmed.parse::<Decimal>().map_err(|e| ApError::Parse {
        input: raw.to_string(),
        message: e.to_string(),
    })
}

/// `amount * percentage / 100`, saturating at `Decimal::MAX` / `Decimal::MIN`.
pub fn percent_of(amount: Decimal, percentage: Decimal) -> Decimal {
    amount
        .checked_mul(percentage)
        .map(|v| v / Decimal::ONE_HUNDRED)
        .or_else(|| (amount / Decimal::ONE_HUNDRED).checked_mul(percentage))
        .unwrap_or(if amount.is_sign_negative() != percentage.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
}
