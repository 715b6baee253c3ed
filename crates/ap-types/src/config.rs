//! Configuration for the optimizer, the risk engine and the agent.
//!
//! Every section has defaults, so a config file only needs the fields it
//! overrides.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::config_error;
use crate::errors::ApResult;
use crate::protocol::validate_risk_score;
use crate::threshold::{RiskThreshold, ThresholdDirection};

const SECONDS_PER_DAY: i64 = 86_400;

/// The three dimensions scored by the risk engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskDimension {
    Liquidity,
    Collateral,
    Liquidation,
}

impl RiskDimension {
    /// Every dimension is scored "lower is worse": ratios in percent, and
    /// remaining seconds for liquidation.
    pub fn direction(&self) -> ThresholdDirection {
        ThresholdDirection::LowerIsWorse
    }
}

impl fmt::Display for RiskDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Liquidity => write!(f, "liquidity"),
            Self::Collateral => write!(f, "collateral"),
            Self::Liquidation => write!(f, "liquidation"),
        }
    }
}

/// Severity cut-offs for each risk dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Liquidity coverage ratio, percent.
    pub liquidity: RiskThreshold,
    /// Worst collateral ratio, percent.
    pub collateral: RiskThreshold,
    /// Estimated seconds until liquidation.
    pub liquidation: RiskThreshold,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            liquidity: RiskThreshold::new(Decimal::from(80), Decimal::from(50), Decimal::from(20)),
            collateral: RiskThreshold::new(
                Decimal::from(200),
                Decimal::from(150),
                Decimal::from(120),
            ),
            liquidation: RiskThreshold::new(
                Decimal::from(30 * SECONDS_PER_DAY),
                Decimal::from(7 * SECONDS_PER_DAY),
                Decimal::from(3 * SECONDS_PER_DAY),
            ),
        }
    }
}

impl RiskThresholds {
    pub fn get(&self, dimension: RiskDimension) -> &RiskThreshold {
        match dimension {
            RiskDimension::Liquidity => &self.liquidity,
            RiskDimension::Collateral => &self.collateral,
            RiskDimension::Liquidation => &self.liquidation,
        }
    }

    /// Replace one dimension's cut-offs after checking their ordering.
    pub fn set(&mut self, dimension: RiskDimension, threshold: RiskThreshold) -> ApResult<()> {
        threshold.validate(dimension.direction())?;
        match dimension {
            RiskDimension::Liquidity => self.liquidity = threshold,
            RiskDimension::Collateral => self.collateral = threshold,
            RiskDimension::Liquidation => self.liquidation = threshold,
        }
        Ok(())
    }

    pub fn validate(&self) -> ApResult<()> {
        for dimension in [
            RiskDimension::Liquidity,
            RiskDimension::Collateral,
            RiskDimension::Liquidation,
        ] {
            self.get(dimension)
                .validate(dimension.direction())
                .map_err(|e| config_error!("{} thresholds: {}", dimension, e))?;
        }
        Ok(())
    }
}

/// Allocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// 1 = conservative, 10 = aggressive.
    pub risk_preference: u8,
    /// Share of available funds held back before allocating.
    pub emergency_funds_percentage: Decimal,
    /// Percentage-point drift that triggers a rebalance.
    pub rebalance_drift_threshold: Decimal,
    /// Fund amount used to compute the reference allocation when no real
    /// total is supplied.
    pub rebalance_reference_funds: Decimal,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            risk_preference: 5,
            emergency_funds_percentage: Decimal::from(10),
            rebalance_drift_threshold: Decimal::from(10),
            rebalance_reference_funds: Decimal::from(1000),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> ApResult<()> {
        validate_risk_score(self.risk_preference, "risk_preference")
            .map_err(|e| config_error!("{}", e))?;
        if self.emergency_funds_percentage < Decimal::ZERO
            || self.emergency_funds_percentage > Decimal::ONE_HUNDRED
        {
            return Err(config_error!(
                "emergency_funds_percentage must be within 0..=100, got {}",
                self.emergency_funds_percentage
            ));
        }
        if self.rebalance_drift_threshold < Decimal::ZERO {
            return Err(config_error!(
                "rebalance_drift_threshold must not be negative, got {}",
                self.rebalance_drift_threshold
            ));
        }
        Ok(())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoPayConfig {
    /// Asset that payments are denominated in and yield is deployed from.
    pub base_asset: String,
    pub optimizer: OptimizerConfig,
    pub risk: RiskThresholds,
}

impl Default for AutoPayConfig {
    fn default() -> Self {
        Self {
            base_asset: "USDC".to_string(),
            optimizer: OptimizerConfig::default(),
            risk: RiskThresholds::default(),
        }
    }
}

impl AutoPayConfig {
    pub fn from_json_str(raw: &str) -> ApResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ApResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> ApResult<()> {
        if self.base_asset.trim().is_empty() {
            return Err(config_error!("base_asset must not be empty"));
        }
        self.optimizer.validate()?;
        self.risk.validate()
    }
}
