//! Account risk assessment for AutoPay.
//!
//! Provides:
//! - Liquidity coverage of pending payments
//! - Collateral health of open borrow positions
//! - Time-to-liquidation estimates from daily price trends
//! - Aggregated risk level with recommended actions

pub mod assessment;
pub mod engine;
pub mod ledger;
pub mod recommendations;

pub use assessment::{
    CollateralRiskAssessment, LiquidationRiskAssessment, LiquidityRiskAssessment, RiskAssessment,
};
pub use engine::RiskAssessmentEngine;
pub use ledger::{LedgerUpdate, RiskLedger};
pub use recommendations::{recommended_actions, STABLE_MESSAGE};
