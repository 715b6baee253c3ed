//! Risk-adjusted scoring and whole-percent allocation.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use ap_types::ProtocolInfo;

const FULL_ALLOCATION: u32 = 100;

/// `apy - risk_score * (11 - preference) / 10`
///
/// The penalty grows with the protocol's risk score and shrinks as the user's
/// preference moves towards 10.
pub fn risk_adjusted_apy(protocol: &ProtocolInfo, risk_preference: u8) -> Decimal {
    let tolerance_gap = Decimal::from(11u8.saturating_sub(risk_preference));
    protocol.current_apy - Decimal::from(protocol.risk_score) * tolerance_gap / Decimal::TEN
}

/// Split 100% across `scores` (already in priority order).
///
/// Each entry gets its share of the score total rounded half-up and clamped
/// to what is left; the last entry takes the remainder so the result always
/// sums to 100. Negative scores weigh nothing, and if no score is positive
/// the split is even.
pub fn allocate_percentages(scores: &[Decimal]) -> Vec<u32> {
    if scores.is_empty() {
        return Vec::new();
    }

    let mut weights: Vec<Decimal> = scores.iter().map(|s| (*s).max(Decimal::ZERO)).collect();
    let mut total: Decimal = weights.iter().copied().sum();
    if total <= Decimal::ZERO {
        weights = vec![Decimal::ONE; scores.len()];
        total = Decimal::from(scores.len());
    }

    let last = weights.len() - 1;
    let mut remaining = FULL_ALLOCATION;
    let mut allocations = Vec::with_capacity(weights.len());

    for (i, weight) in weights.iter().enumerate() {
        let pct = if i == last {
            remaining
        } else {
            let share = (*weight * Decimal::ONE_HUNDRED / total)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_u32()
                .unwrap_or(0);
            share.min(remaining)
        };
        remaining -= pct;
        allocations.push(pct);
    }

    allocations
}

/// Human-readable justification, picked by allocation size.
pub fn recommendation_reason(protocol: &ProtocolInfo, allocation_percentage: u32) -> String {
    let risk = protocol.risk_level();
    if allocation_percentage > 50 {
        format!(
            "{} is strongly recommended: {}% APY at {} risk gives the best risk-adjusted return",
            protocol.name, protocol.current_apy, risk
        )
    } else if allocation_percentage > 25 {
        format!(
            "{} is a good allocation at {}% APY with {} risk and diversifies the portfolio",
            protocol.name, protocol.current_apy, risk
        )
    } else {
        format!(
            "Small allocation to {} for diversification ({}% APY, {} risk)",
            protocol.name, protocol.current_apy, risk
        )
    }
}
