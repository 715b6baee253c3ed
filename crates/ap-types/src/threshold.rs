//! Risk levels and the ordered-threshold lookup shared by every risk dimension.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ApResult;
use crate::invalid_argument;

/// Severity of a risk reading, totally ordered `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        };
        write!(f, "{label}")
    }
}

/// Which way severity grows as the measured value moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdDirection {
    /// Ratios and remaining time: the smaller the value, the worse.
    /// Cut-offs are ordered `medium > high > critical`, comparisons are `<=`.
    LowerIsWorse,
    /// Scores: the larger the value, the worse.
    /// Cut-offs are ordered `medium < high < critical`, comparisons are `>=`.
    HigherIsWorse,
}

/// Cut-offs for one risk dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskThreshold {
    pub medium: Decimal,
    pub high: Decimal,
    pub critical: Decimal,
}

impl RiskThreshold {
    pub fn new(medium: Decimal, high: Decimal, critical: Decimal) -> Self {
        Self {
            medium,
            high,
            critical,
        }
    }

    /// Check that the cut-offs are strictly monotonic for `direction`.
    pub fn validate(&self, direction: ThresholdDirection) -> ApResult<()> {
        let ordered = match direction {
            ThresholdDirection::LowerIsWorse => {
                self.medium > self.high && self.high > self.critical
            }
            ThresholdDirection::HigherIsWorse => {
                self.medium < self.high && self.high < self.critical
            }
        };
        if ordered {
            Ok(())
        } else {
            Err(invalid_argument!(
                "thresholds out of order for {:?}: medium={}, high={}, critical={}",
                direction,
                self.medium,
                self.high,
                self.critical
            ))
        }
    }

    /// Classify `value` against these cut-offs. See [`classify`].
    pub fn classify(&self, value: Decimal, direction: ThresholdDirection) -> RiskLevel {
        classify(value, self, direction)
    }
}

/// First matching cut-off wins, checked from the most severe down.
///
/// Boundaries are inclusive: a value sitting exactly on a cut-off takes that
/// cut-off's level.
pub fn classify(value: Decimal, threshold: &RiskThreshold, direction: ThresholdDirection) -> RiskLevel {
    let hits = |cutoff: Decimal| match direction {
        ThresholdDirection::LowerIsWorse => value <= cutoff,
        ThresholdDirection::HigherIsWorse => value >= cutoff,
    };

    if hits(threshold.critical) {
        RiskLevel::Critical
    } else if hits(threshold.high) {
        RiskLevel::High
    } else if hits(threshold.medium) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
