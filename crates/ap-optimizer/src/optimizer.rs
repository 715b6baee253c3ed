//! The yield allocation optimizer.
//!
//! [`YieldAllocationOptimizer`] owns a [`ProtocolCatalog`] and the user's risk
//! preference, and turns an amount of available funds into an ordered list of
//! [`StrategyRecommendation`]s whose percentages sum to 100.

use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use ap_types::{
    percent_of, validate_risk_score, ApResult, OptimizerConfig, ProtocolInfo, ProtocolUpdate,
    StrategyRecommendation,
};

use crate::allocation::{allocate_percentages, recommendation_reason, risk_adjusted_apy};
use crate::catalog::ProtocolCatalog;

#[derive(Debug, Clone)]
pub struct YieldAllocationOptimizer {
    catalog: ProtocolCatalog,
    config: OptimizerConfig,
}

impl YieldAllocationOptimizer {
    pub fn new(catalog: ProtocolCatalog, config: OptimizerConfig) -> ApResult<Self> {
        config.validate()?;
        Ok(Self { catalog, config })
    }

    /// Built-in catalog, default settings.
    pub fn with_defaults() -> Self {
        Self {
            catalog: ProtocolCatalog::builtin(),
            config: OptimizerConfig::default(),
        }
    }

    pub fn risk_preference(&self) -> u8 {
        self.config.risk_preference
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Replace the risk preference (1 = conservative, 10 = aggressive).
    pub fn set_risk_preference(&mut self, preference: u8) -> ApResult<()> {
        validate_risk_score(preference, "risk preference")?;
        info!(
            old = self.config.risk_preference,
            new = preference,
            "risk preference updated"
        );
        self.config.risk_preference = preference;
        Ok(())
    }

    /// Merge `update` into the catalog entry `id`.
    pub fn update_protocol_info(&mut self, id: &str, update: &ProtocolUpdate) -> ApResult<()> {
        let protocol = self.catalog.update(id, update)?;
        debug!(
            protocol = %protocol.id,
            apy = %protocol.current_apy,
            risk_score = protocol.risk_score,
            "protocol info updated"
        );
        Ok(())
    }

    pub fn get_protocols_info(&self) -> &[ProtocolInfo] {
        self.catalog.as_slice()
    }

    /// Allocate using the configured emergency reserve.
    pub fn optimize_allocation(&self, available_funds: Decimal) -> Vec<StrategyRecommendation> {
        self.optimize_allocation_with_reserve(available_funds, self.config.emergency_funds_percentage)
    }

    /// Hold back `emergency_funds_percentage` of `available_funds` and split
    /// the rest across eligible protocols.
    ///
    /// Returns an empty plan when nothing is left to allocate or no protocol's
    /// minimum deposit fits. The reserve percentage is clamped to `0..=100`
    /// in both directions: a negative reserve holds nothing back and anything
    /// above 100 holds back everything.
    pub fn optimize_allocation_with_reserve(
        &self,
        available_funds: Decimal,
        emergency_funds_percentage: Decimal,
    ) -> Vec<StrategyRecommendation> {
        let reserve_pct = emergency_funds_percentage.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
        let emergency_funds = percent_of(available_funds, reserve_pct);
        let allocatable = available_funds - emergency_funds;
        if allocatable <= Decimal::ZERO {
            debug!(%available_funds, %reserve_pct, "nothing left to allocate");
            return Vec::new();
        }

        let mut scored: Vec<(&ProtocolInfo, Decimal)> = self
            .catalog
            .iter()
            .filter(|p| p.minimum_deposit <= allocatable)
            .map(|p| (p, risk_adjusted_apy(p, self.config.risk_preference)))
            .collect();
        if scored.is_empty() {
            debug!(%allocatable, "no protocol accepts the allocatable amount");
            return Vec::new();
        }

        // `sort_by` is stable: equal scores keep catalog order.
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let scores: Vec<Decimal> = scored.iter().map(|(_, s)| *s).collect();
        let percentages = allocate_percentages(&scores);

        let recommendations: Vec<StrategyRecommendation> = scored
            .iter()
            .zip(percentages)
            .filter(|(_, pct)| *pct > 0)
            .map(|((protocol, _), pct)| StrategyRecommendation {
                protocol_id: protocol.id.clone(),
                protocol_name: protocol.name.clone(),
                allocation_percentage: pct,
                allocation_amount: percent_of(allocatable, Decimal::from(pct)),
                expected_apy: protocol.current_apy,
                risk_level: protocol.risk_level(),
                reason: recommendation_reason(protocol, pct),
            })
            .collect();

        info!(
            %available_funds,
            %emergency_funds,
            %allocatable,
            risk_preference = self.config.risk_preference,
            protocols = recommendations.len(),
            "allocation computed"
        );
        recommendations
    }

    /// Compare `current` (protocol id → percent) with a fresh reference plan
    /// computed for the configured reference fund amount.
    ///
    /// The reference amount is a fixed placeholder, not the real total under
    /// management; callers that know the total should use
    /// [`Self::should_rebalance_with_funds`].
    pub fn should_rebalance(&self, current: &HashMap<String, Decimal>) -> bool {
        self.should_rebalance_with_funds(current, self.config.rebalance_reference_funds)
    }

    /// `true` if any protocol drifts from the plan for `total_funds` by more
    /// than the configured number of percentage points. Ids missing on
    /// either side count as 0%.
    pub fn should_rebalance_with_funds(
        &self,
        current: &HashMap<String, Decimal>,
        total_funds: Decimal,
    ) -> bool {
        let recommended: HashMap<String, Decimal> = self
            .optimize_allocation(total_funds)
            .into_iter()
            .map(|r| (r.protocol_id, Decimal::from(r.allocation_percentage)))
            .collect();

        let ids: HashSet<&String> = current.keys().chain(recommended.keys()).collect();
        let drift_limit = self.config.rebalance_drift_threshold;

        for id in ids {
            let have = current.get(id).copied().unwrap_or(Decimal::ZERO);
            let want = recommended.get(id).copied().unwrap_or(Decimal::ZERO);
            if (have - want).abs() > drift_limit {
                info!(protocol = %id, current = %have, recommended = %want, "rebalance needed");
                return true;
            }
        }
        false
    }
}

impl Default for YieldAllocationOptimizer {
    fn default() -> Self {
        Self::with_defaults()
    }
}
