use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ApResult;
use crate::invalid_argument;
use crate::threshold::{RiskLevel, RiskThreshold, ThresholdDirection};

/// Lowest protocol risk score / user risk preference.
pub const MIN_RISK_SCORE: u8 = 1;
/// Highest protocol risk score / user risk preference.
pub const MAX_RISK_SCORE: u8 = 10;

/// Reject scores outside `1..=10`.
pub fn validate_risk_score(score: u8, what: &str) -> ApResult<()> {
    if (MIN_RISK_SCORE..=MAX_RISK_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(invalid_argument!(
            "{} must be between {} and {}, got {}",
            what,
            MIN_RISK_SCORE,
            MAX_RISK_SCORE,
            score
        ))
    }
}

/// Reference data for one yield-generating protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolInfo {
    pub id: String,
    pub name: String,
    /// Nominal APY in percent.
    pub current_apy: Decimal,
    /// 1 (safest) to 10 (riskiest).
    pub risk_score: u8,
    pub minimum_deposit: Decimal,
    /// Seconds the deposit stays locked.
    pub lockup_period: u64,
}

impl ProtocolInfo {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        current_apy: Decimal,
        risk_score: u8,
        minimum_deposit: Decimal,
        lockup_period: u64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            current_apy,
            risk_score,
            minimum_deposit,
            lockup_period,
        }
    }

    /// Qualitative label: Low up to 3, Medium up to 6, High above.
    pub fn risk_level(&self) -> RiskLevel {
        // Critical sits past the top of the scale and is never reached.
        let bands = RiskThreshold::new(Decimal::from(4), Decimal::from(7), Decimal::from(11));
        bands.classify(
            Decimal::from(self.risk_score),
            ThresholdDirection::HigherIsWorse,
        )
    }

    /// Merge the fields present in `update`.
    pub fn apply_update(&mut self, update: &ProtocolUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(apy) = update.current_apy {
            self.current_apy = apy;
        }
        if let Some(score) = update.risk_score {
            self.risk_score = score;
        }
        if let Some(min) = update.minimum_deposit {
            self.minimum_deposit = min;
        }
        if let Some(lockup) = update.lockup_period {
            self.lockup_period = lockup;
        }
    }
}

/// Partial update for a catalog entry; `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub current_apy: Option<Decimal>,
    #[serde(default)]
    pub risk_score: Option<u8>,
    #[serde(default)]
    pub minimum_deposit: Option<Decimal>,
    #[serde(default)]
    pub lockup_period: Option<u64>,
}

impl ProtocolUpdate {
    pub fn apy(apy: Decimal) -> Self {
        Self {
            current_apy: Some(apy),
            ..Default::default()
        }
    }

    pub fn with_risk_score(mut self, score: u8) -> Self {
        self.risk_score = Some(score);
        self
    }

    pub fn with_minimum_deposit(mut self, amount: Decimal) -> Self {
        self.minimum_deposit = Some(amount);
        self
    }
}

/// One line of an allocation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecommendation {
    pub protocol_id: String,
    pub protocol_name: String,
    /// Whole percent of the allocatable funds.
    pub allocation_percentage: u32,
    /// Funds this percentage represents.
    pub allocation_amount: Decimal,
    /// Nominal APY of the protocol.
    pub expected_apy: Decimal,
    pub risk_level: RiskLevel,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn protocol(score: u8) -> ProtocolInfo {
        ProtocolInfo::new("p", "Protocol", dec!(5), score, dec!(10), 0)
    }

    #[test]
    fn risk_level_bands() {
        assert_eq!(protocol(1).risk_level(), RiskLevel::Low);
        assert_eq!(protocol(3).risk_level(), RiskLevel::Low);
        assert_eq!(protocol(4).risk_level(), RiskLevel::Medium);
        assert_eq!(protocol(6).risk_level(), RiskLevel::Medium);
        assert_eq!(protocol(7).risk_level(), RiskLevel::High);
        assert_eq!(protocol(10).risk_level(), RiskLevel::High);
    }

    #[test]
    fn apply_update_merges_only_present_fields() {
        let mut p = protocol(2);
        p.apply_update(&ProtocolUpdate::apy(dec!(7.25)).with_risk_score(5));

        assert_eq!(p.current_apy, dec!(7.25));
        assert_eq!(p.risk_score, 5);
        assert_eq!(p.name, "Protocol");
        assert_eq!(p.minimum_deposit, dec!(10));
    }

    #[test]
    fn partial_update_from_json() {
        let update: ProtocolUpdate = serde_json::from_str(r#"{"current_apy":"6.1"}"#).unwrap();
        assert_eq!(update.current_apy, Some(dec!(6.1)));
        assert!(update.name.is_none());
    }

    #[test]
    fn risk_score_validation() {
        assert!(validate_risk_score(0, "risk score").is_err());
        assert!(validate_risk_score(1, "risk score").is_ok());
        assert!(validate_risk_score(10, "risk score").is_ok());
        assert!(validate_risk_score(11, "risk score").is_err());
    }
}
