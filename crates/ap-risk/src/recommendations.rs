//! Rule chains that turn dimension results into recommended actions.

use rust_decimal::Decimal;

use crate::assessment::{
    CollateralRiskAssessment, LiquidationRiskAssessment, LiquidityRiskAssessment,
};

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: u64 = 86_400;

/// A shortfall with a payment due sooner than this is urgent.
const URGENT_PAYMENT_WINDOW_SECS: i64 = 24 * SECONDS_PER_HOUR;
const CRITICAL_LIQUIDATION_SECS: u64 = 3 * SECONDS_PER_DAY;
const WARNING_LIQUIDATION_SECS: u64 = 7 * SECONDS_PER_DAY;

pub const STABLE_MESSAGE: &str =
    "All risk indicators are within normal ranges; no action needed";

fn display(value: Decimal) -> Decimal {
    value.round_dp(2).normalize()
}

pub fn liquidity_actions(assessment: &LiquidityRiskAssessment, base_asset: &str) -> Vec<String> {
    let mut actions = Vec::new();
    if assessment.liquidity_ratio >= Decimal::ONE_HUNDRED {
        return actions;
    }

    actions.push(format!(
        "Top up {} {} to cover {} {} of pending payments",
        display(assessment.shortfall),
        base_asset,
        display(assessment.required_liquidity),
        base_asset,
    ));

    if assessment.seconds_until_next_payment < URGENT_PAYMENT_WINDOW_SECS {
        let hours = assessment.seconds_until_next_payment / SECONDS_PER_HOUR;
        actions.push(format!(
            "URGENT: next payment is due in {} hours and liquidity covers only {}% of pending payments",
            hours,
            display(assessment.liquidity_ratio),
        ));
    }
    actions
}

pub fn collateral_actions(assessment: &CollateralRiskAssessment) -> Vec<String> {
    let threshold = assessment.liquidation_threshold;
    let ratio = assessment.collateral_ratio;

    if ratio < threshold * Decimal::new(11, 1) {
        vec![format!(
            "CRITICAL: {} collateral ratio {}% is within 10% of its {}% liquidation threshold; add collateral or repay debt now",
            assessment.protocol,
            display(ratio),
            display(threshold),
        )]
    } else if ratio < threshold * Decimal::new(12, 1) {
        vec![format!(
            "WARNING: {} collateral ratio {}% is within 20% of its {}% liquidation threshold; consider adding collateral",
            assessment.protocol,
            display(ratio),
            display(threshold),
        )]
    } else {
        Vec::new()
    }
}

pub fn liquidation_actions(assessment: &LiquidationRiskAssessment) -> Vec<String> {
    let mut actions = Vec::new();

    if let Some(seconds) = assessment.seconds_to_liquidation {
        let days = assessment
            .days_to_liquidation
            .map(display)
            .unwrap_or(Decimal::ZERO);
        if seconds < CRITICAL_LIQUIDATION_SECS {
            actions.push(format!(
                "CRITICAL: {} position may be liquidated within {} days at the current {} trend; repay debt or add collateral immediately",
                assessment.protocol, days, assessment.collateral_asset,
            ));
        } else if seconds < WARNING_LIQUIDATION_SECS {
            actions.push(format!(
                "WARNING: {} position may be liquidated within {} days; monitor {} closely",
                assessment.protocol, days, assessment.collateral_asset,
            ));
        }
    }

    if assessment.price_gap_percent < Decimal::TEN {
        actions.push(format!(
            "Add {} collateral to {}: price is only {}% above the liquidation price of {}",
            assessment.collateral_asset,
            assessment.protocol,
            display(assessment.price_gap_percent),
            display(assessment.liquidation_price),
        ));
    }
    actions
}

/// Concatenate the per-dimension rules in order: liquidity, collateral,
/// liquidation. Falls back to [`STABLE_MESSAGE`] when nothing fires.
pub fn recommended_actions(
    liquidity: Option<&LiquidityRiskAssessment>,
    collateral: Option<&CollateralRiskAssessment>,
    liquidation: Option<&LiquidationRiskAssessment>,
    base_asset: &str,
) -> Vec<String> {
    let mut actions = Vec::new();
    if let Some(a) = liquidity {
        actions.extend(liquidity_actions(a, base_asset));
    }
    if let Some(a) = collateral {
        actions.extend(collateral_actions(a));
    }
    if let Some(a) = liquidation {
        actions.extend(liquidation_actions(a));
    }

    if actions.is_empty() {
        actions.push(STABLE_MESSAGE.to_string());
    }
    actions
}
