//! Assessment outputs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ap_types::RiskLevel;

/// Can the account cover what it has promised to pay?
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRiskAssessment {
    pub available_liquidity: Decimal,
    /// Sum of pending payments in the base asset.
    pub required_liquidity: Decimal,
    /// Available over required, percent, capped at 100.
    pub liquidity_ratio: Decimal,
    /// How much is missing to cover every pending payment (zero if covered).
    pub shortfall: Decimal,
    /// Seconds until the nearest payment falls due; zero if one is overdue.
    pub seconds_until_next_payment: i64,
    pub risk_level: RiskLevel,
}

/// Health of the worst-collateralised position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralRiskAssessment {
    pub protocol: String,
    pub collateral_asset: String,
    pub borrowed_asset: String,
    /// Collateral value over borrowed value, percent.
    pub collateral_ratio: Decimal,
    pub liquidation_threshold: Decimal,
    /// Positions that had the prices needed to be scored.
    pub positions_evaluated: usize,
    pub risk_level: RiskLevel,
}

/// The position closest to liquidation at the current price trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationRiskAssessment {
    pub protocol: String,
    pub collateral_asset: String,
    pub current_price: Decimal,
    pub liquidation_price: Decimal,
    /// Distance from the current price down to the liquidation price, percent
    /// of the current price. Zero or negative once breached.
    pub price_gap_percent: Decimal,
    pub daily_price_change_percent: Decimal,
    /// `None` when the price is flat or rising: no liquidation expected.
    pub days_to_liquidation: Option<Decimal>,
    pub seconds_to_liquidation: Option<u64>,
    pub risk_level: RiskLevel,
}

impl LiquidationRiskAssessment {
    pub fn is_breached(&self) -> bool {
        self.seconds_to_liquidation == Some(0)
    }
}

/// Combined output of [`crate::RiskAssessmentEngine::perform_risk_assessment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub liquidity: Option<LiquidityRiskAssessment>,
    pub collateral: Option<CollateralRiskAssessment>,
    pub liquidation: Option<LiquidationRiskAssessment>,
    /// Highest level among the dimensions present; Low if none are.
    pub overall_risk_level: RiskLevel,
    pub recommended_actions: Vec<String>,
}

impl RiskAssessment {
    pub fn new(
        timestamp: DateTime<Utc>,
        liquidity: Option<LiquidityRiskAssessment>,
        collateral: Option<CollateralRiskAssessment>,
        liquidation: Option<LiquidationRiskAssessment>,
        recommended_actions: Vec<String>,
    ) -> Self {
        let overall_risk_level = overall_level(
            liquidity.as_ref().map(|a| a.risk_level),
            collateral.as_ref().map(|a| a.risk_level),
            liquidation.as_ref().map(|a| a.risk_level),
        );
        Self {
            id: Uuid::new_v4(),
            timestamp,
            liquidity,
            collateral,
            liquidation,
            overall_risk_level,
            recommended_actions,
        }
    }
}

fn overall_level(
    liquidity: Option<RiskLevel>,
    collateral: Option<RiskLevel>,
    liquidation: Option<RiskLevel>,
) -> RiskLevel {
    [liquidity, collateral, liquidation]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(RiskLevel::Low)
}
