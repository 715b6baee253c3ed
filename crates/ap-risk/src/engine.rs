//! Risk assessment engine.
//!
//! [`RiskAssessmentEngine`] scores three independent dimensions against
//! configurable [`RiskThresholds`]:
//!
//! - liquidity: can available funds cover pending payments,
//! - collateral: how healthy is the worst-collateralised position,
//! - liquidation: how soon could a position be liquidated at the current
//!   price trend.
//!
//! Each dimension returns `None` when there is nothing to assess.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use ap_types::{ApResult, RiskDimension, RiskLevel, RiskThreshold, RiskThresholds};

use crate::assessment::{
    CollateralRiskAssessment, LiquidationRiskAssessment, LiquidityRiskAssessment, RiskAssessment,
};
use crate::ledger::{LedgerUpdate, RiskLedger};
use crate::recommendations::recommended_actions;

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone)]
pub struct RiskAssessmentEngine {
    thresholds: RiskThresholds,
    ledger: RiskLedger,
}

impl RiskAssessmentEngine {
    pub fn new(thresholds: RiskThresholds, ledger: RiskLedger) -> ApResult<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds, ledger })
    }

    /// Default thresholds over the demo ledger.
    pub fn with_mock_data() -> Self {
        Self {
            thresholds: RiskThresholds::default(),
            ledger: RiskLedger::mock(Utc::now()),
        }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    pub fn ledger(&self) -> &RiskLedger {
        &self.ledger
    }

    /// Replace one dimension's cut-offs. Misordered cut-offs are rejected and
    /// leave the current ones in place.
    pub fn set_risk_thresholds(
        &mut self,
        dimension: RiskDimension,
        threshold: RiskThreshold,
    ) -> ApResult<()> {
        self.thresholds.set(dimension, threshold)?;
        info!(
            %dimension,
            medium = %threshold.medium,
            high = %threshold.high,
            critical = %threshold.critical,
            "risk thresholds updated"
        );
        Ok(())
    }

    pub fn update_mock_data(&mut self, update: LedgerUpdate) {
        self.ledger.apply(update);
        debug!(
            payments = self.ledger.pending_payments.len(),
            positions = self.ledger.positions.len(),
            "risk ledger updated"
        );
    }

    fn classify(&self, dimension: RiskDimension, value: Decimal) -> RiskLevel {
        self.thresholds
            .get(dimension)
            .classify(value, dimension.direction())
    }

    // ---- liquidity ----

    pub fn assess_liquidity_risk(&self, available_liquidity: Decimal) -> Option<LiquidityRiskAssessment> {
        self.assess_liquidity_risk_at(available_liquidity, Utc::now())
    }

    pub fn assess_liquidity_risk_at(
        &self,
        available_liquidity: Decimal,
        now: DateTime<Utc>,
    ) -> Option<LiquidityRiskAssessment> {
        let required_liquidity: Decimal = self
            .ledger
            .base_asset_payments()
            .map(|p| p.amount)
            .sum();
        if required_liquidity.is_zero() {
            return None;
        }

        // A ratio too large to represent is fully covered.
        let liquidity_ratio = available_liquidity
            .checked_div(required_liquidity)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ONE_HUNDRED)
            .min(Decimal::ONE_HUNDRED);
        let seconds_until_next_payment = self
            .ledger
            .base_asset_payments()
            .map(|p| p.seconds_until_due(now))
            .min()
            .unwrap_or(0);

        Some(LiquidityRiskAssessment {
            available_liquidity,
            required_liquidity,
            liquidity_ratio,
            shortfall: (required_liquidity - available_liquidity).max(Decimal::ZERO),
            seconds_until_next_payment,
            risk_level: self.classify(RiskDimension::Liquidity, liquidity_ratio),
        })
    }

    // ---- collateral ----

    pub fn assess_collateral_risk(&self) -> Option<CollateralRiskAssessment> {
        let mut worst: Option<(usize, Decimal)> = None;
        let mut evaluated = 0;

        for (i, position) in self.ledger.positions.iter().enumerate() {
            let (Some(collateral_price), Some(borrowed_price)) = (
                self.ledger.price(&position.collateral_asset),
                self.ledger.price(&position.borrowed_asset),
            ) else {
                warn!(
                    protocol = %position.protocol,
                    collateral = %position.collateral_asset,
                    borrowed = %position.borrowed_asset,
                    "missing price, position skipped"
                );
                continue;
            };
            let Some(ratio) = position.collateral_ratio(collateral_price, borrowed_price) else {
                continue;
            };

            evaluated += 1;
            if worst.map_or(true, |(_, r)| ratio < r) {
                worst = Some((i, ratio));
            }
        }

        let (index, collateral_ratio) = worst?;
        let position = &self.ledger.positions[index];
        Some(CollateralRiskAssessment {
            protocol: position.protocol.clone(),
            collateral_asset: position.collateral_asset.clone(),
            borrowed_asset: position.borrowed_asset.clone(),
            collateral_ratio,
            liquidation_threshold: position.liquidation_threshold,
            positions_evaluated: evaluated,
            risk_level: self.classify(RiskDimension::Collateral, collateral_ratio),
        })
    }

    // ---- liquidation ----

    pub fn assess_liquidation_risk(&self) -> Option<LiquidationRiskAssessment> {
        let mut shortest: Option<LiquidationRiskAssessment> = None;

        for position in &self.ledger.positions {
            let (Some(current_price), Some(borrowed_price)) = (
                self.ledger.price(&position.collateral_asset),
                self.ledger.price(&position.borrowed_asset),
            ) else {
                warn!(
                    protocol = %position.protocol,
                    collateral = %position.collateral_asset,
                    "missing price, position skipped"
                );
                continue;
            };
            if current_price <= Decimal::ZERO {
                continue;
            }
            let Some(liquidation_price) = position.liquidation_price(borrowed_price) else {
                continue;
            };

            // Only a liquidation price far above spot can overflow here.
            let price_gap_percent = (current_price - liquidation_price)
                .checked_div(current_price)
                .and_then(|g| g.checked_mul(Decimal::ONE_HUNDRED))
                .unwrap_or(Decimal::MIN);
            let daily_change = self.ledger.daily_price_change(&position.collateral_asset);

            let days_to_liquidation = if price_gap_percent <= Decimal::ZERO {
                Some(Decimal::ZERO)
            } else if daily_change >= Decimal::ZERO {
                None
            } else {
                Some(
                    price_gap_percent
                        .checked_div(daily_change.abs())
                        .unwrap_or(Decimal::MAX),
                )
            };
            // Horizons past u64 seconds saturate.
            let seconds_to_liquidation = days_to_liquidation.map(|days| {
                days.checked_mul(Decimal::from(SECONDS_PER_DAY))
                    .and_then(|secs| secs.floor().to_u64())
                    .unwrap_or(u64::MAX)
            });

            let candidate = LiquidationRiskAssessment {
                protocol: position.protocol.clone(),
                collateral_asset: position.collateral_asset.clone(),
                current_price,
                liquidation_price,
                price_gap_percent,
                daily_price_change_percent: daily_change,
                days_to_liquidation,
                seconds_to_liquidation,
                risk_level: match seconds_to_liquidation {
                    Some(secs) => self.classify(RiskDimension::Liquidation, Decimal::from(secs)),
                    None => RiskLevel::Low,
                },
            };

            let sooner = match &shortest {
                None => true,
                Some(best) => time_key(&candidate) < time_key(best),
            };
            if sooner {
                shortest = Some(candidate);
            }
        }

        shortest
    }

    // ---- combined ----

    pub fn perform_risk_assessment(&self, available_liquidity: Decimal) -> RiskAssessment {
        self.perform_risk_assessment_at(available_liquidity, Utc::now())
    }

    pub fn perform_risk_assessment_at(
        &self,
        available_liquidity: Decimal,
        now: DateTime<Utc>,
    ) -> RiskAssessment {
        let liquidity = self.assess_liquidity_risk_at(available_liquidity, now);
        let collateral = self.assess_collateral_risk();
        let liquidation = self.assess_liquidation_risk();

        let actions = recommended_actions(
            liquidity.as_ref(),
            collateral.as_ref(),
            liquidation.as_ref(),
            &self.ledger.base_asset,
        );
        let assessment = RiskAssessment::new(now, liquidity, collateral, liquidation, actions);

        match assessment.overall_risk_level {
            RiskLevel::Critical | RiskLevel::High => warn!(
                level = %assessment.overall_risk_level,
                actions = assessment.recommended_actions.len(),
                "elevated account risk"
            ),
            _ => info!(
                level = %assessment.overall_risk_level,
                "risk assessment complete"
            ),
        }
        assessment
    }
}

impl Default for RiskAssessmentEngine {
    fn default() -> Self {
        Self::with_mock_data()
    }
}

/// `None` (never liquidated) sorts after every finite time.
fn time_key(assessment: &LiquidationRiskAssessment) -> u64 {
    assessment.seconds_to_liquidation.unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_types::{PendingPayment, Position};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn engine_with(ledger: RiskLedger) -> RiskAssessmentEngine {
        RiskAssessmentEngine::new(RiskThresholds::default(), ledger).unwrap()
    }

    fn usdc_ledger() -> RiskLedger {
        let mut ledger = RiskLedger::new("USDC");
        ledger.prices.insert("USDC".into(), dec!(1));
        ledger.prices.insert("ETH".into(), dec!(2000));
        ledger
    }

    fn eth_position(collateral: Decimal, borrowed: Decimal) -> Position {
        Position::new("aave", "USDC", borrowed, "ETH", collateral, dec!(150))
    }

    // ---- liquidity ----

    #[test]
    fn no_payments_means_no_liquidity_assessment() {
        let engine = engine_with(usdc_ledger());
        assert!(engine.assess_liquidity_risk(dec!(100)).is_none());
    }

    #[test]
    fn huge_balance_caps_ratio_instead_of_overflowing() {
        let now = Utc::now();
        let mut ledger = usdc_ledger();
        ledger.pending_payments = vec![PendingPayment::new(
            "p", "alice", "USDC", dec!(0.5), now + Duration::days(2),
        )];
        let engine = engine_with(ledger);

        let a = engine.assess_liquidity_risk_at(Decimal::MAX, now).unwrap();
        assert_eq!(a.liquidity_ratio, dec!(100));
        assert_eq!(a.shortfall, Decimal::ZERO);
        assert_eq!(a.risk_level, RiskLevel::Low);
    }

    #[test]
    fn zero_liquidity_is_critical() {
        let now = Utc::now();
        let mut ledger = usdc_ledger();
        ledger.pending_payments = vec![PendingPayment::new(
            "p", "alice", "USDC", dec!(50), now + Duration::days(2),
        )];
        let engine = engine_with(ledger);

        let a = engine.assess_liquidity_risk_at(dec!(0), now).unwrap();
        assert_eq!(a.liquidity_ratio, dec!(0));
        assert_eq!(a.risk_level, RiskLevel::Critical);
        assert_eq!(a.shortfall, dec!(50));
        assert_eq!(a.seconds_until_next_payment, 2 * 86_400);
    }

    #[test]
    fn liquidity_ratio_is_capped_and_classified() {
        let now = Utc::now();
        let mut ledger = usdc_ledger();
        ledger.pending_payments = vec![
            PendingPayment::new("a", "x", "USDC", dec!(600), now + Duration::hours(30)),
            PendingPayment::new("b", "y", "USDC", dec!(400), now + Duration::hours(6)),
            PendingPayment::new("c", "z", "DAI", dec!(10_000), now + Duration::hours(1)),
        ];
        let engine = engine_with(ledger);

        let covered = engine.assess_liquidity_risk_at(dec!(5000), now).unwrap();
        assert_eq!(covered.required_liquidity, dec!(1000));
        assert_eq!(covered.liquidity_ratio, dec!(100));
        assert_eq!(covered.risk_level, RiskLevel::Low);
        assert_eq!(covered.shortfall, dec!(0));
        assert_eq!(covered.seconds_until_next_payment, 6 * 3_600);

        let at_medium = engine.assess_liquidity_risk_at(dec!(800), now).unwrap();
        assert_eq!(at_medium.risk_level, RiskLevel::Medium);

        let high = engine.assess_liquidity_risk_at(dec!(300), now).unwrap();
        assert_eq!(high.risk_level, RiskLevel::High);
    }

    // ---- collateral ----

    #[test]
    fn no_positions_means_no_collateral_assessment() {
        let engine = engine_with(usdc_ledger());
        assert!(engine.assess_collateral_risk().is_none());
        assert!(engine.assess_liquidation_risk().is_none());
    }

    #[test]
    fn collateral_ratio_on_medium_threshold_is_medium() {
        let mut ledger = usdc_ledger();
        // 1 ETH * 2000 / 1000 USDC = 200%
        ledger.positions = vec![eth_position(dec!(1), dec!(1000))];
        let engine = engine_with(ledger);

        let a = engine.assess_collateral_risk().unwrap();
        assert_eq!(a.collateral_ratio, dec!(200));
        assert_eq!(a.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn worst_position_wins() {
        let mut ledger = usdc_ledger();
        ledger.positions = vec![
            eth_position(dec!(2), dec!(1000)),   // 400%
            Position::new("maker", "USDC", dec!(1000), "ETH", dec!(0.6), dec!(110)), // 120%
            eth_position(dec!(1), dec!(1000)),   // 200%
        ];
        let engine = engine_with(ledger);

        let a = engine.assess_collateral_risk().unwrap();
        assert_eq!(a.protocol, "maker");
        assert_eq!(a.collateral_ratio, dec!(120));
        assert_eq!(a.liquidation_threshold, dec!(110));
        assert_eq!(a.positions_evaluated, 3);
        assert_eq!(a.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn positions_without_prices_are_skipped() {
        let mut ledger = usdc_ledger();
        ledger.positions = vec![Position::new(
            "aave", "USDC", dec!(100), "SOL", dec!(10), dec!(150),
        )];
        let engine = engine_with(ledger);
        assert!(engine.assess_collateral_risk().is_none());
        assert!(engine.assess_liquidation_risk().is_none());
    }

    // ---- liquidation ----

    #[test]
    fn falling_price_gives_time_to_liquidation() {
        let mut ledger = usdc_ledger();
        // liquidation price = 1000 * 1.5 / 1 = 1500, gap 25%, -5%/day -> 5 days
        ledger.positions = vec![eth_position(dec!(1), dec!(1000))];
        ledger.daily_price_changes.insert("ETH".into(), dec!(-5));
        let engine = engine_with(ledger);

        let a = engine.assess_liquidation_risk().unwrap();
        assert_eq!(a.liquidation_price, dec!(1500));
        assert_eq!(a.price_gap_percent, dec!(25));
        assert_eq!(a.days_to_liquidation, Some(dec!(5)));
        assert_eq!(a.seconds_to_liquidation, Some(5 * 86_400));
        assert_eq!(a.risk_level, RiskLevel::High);
        assert!(!a.is_breached());
    }

    #[test]
    fn negligible_decline_saturates_instead_of_overflowing() {
        let mut ledger = usdc_ledger();
        ledger.positions = vec![eth_position(dec!(1), dec!(1000))];
        // 25% gap over a 1e-25 %/day decline: days fit, seconds do not
        ledger
            .daily_price_changes
            .insert("ETH".into(), dec!(-0.0000000000000000000000001));
        let engine = engine_with(ledger.clone());

        let a = engine.assess_liquidation_risk().unwrap();
        assert_eq!(a.days_to_liquidation, Some(dec!(250000000000000000000000000)));
        assert_eq!(a.seconds_to_liquidation, Some(u64::MAX));
        assert_eq!(a.risk_level, RiskLevel::Low);

        // 1e-28 %/day: the day count itself no longer fits
        ledger
            .daily_price_changes
            .insert("ETH".into(), dec!(-0.0000000000000000000000000001));
        let engine = engine_with(ledger);

        let a = engine.assess_liquidation_risk().unwrap();
        assert_eq!(a.days_to_liquidation, Some(Decimal::MAX));
        assert_eq!(a.seconds_to_liquidation, Some(u64::MAX));
        assert_eq!(a.risk_level, RiskLevel::Low);

        let assessment = engine.perform_risk_assessment(dec!(0));
        assert_eq!(assessment.liquidation.unwrap().risk_level, RiskLevel::Low);
    }

    #[test]
    fn rising_price_never_liquidates() {
        let mut ledger = usdc_ledger();
        ledger.positions = vec![eth_position(dec!(1), dec!(1000))];
        ledger.daily_price_changes.insert("ETH".into(), dec!(1.5));
        let engine = engine_with(ledger);

        let a = engine.assess_liquidation_risk().unwrap();
        assert_eq!(a.days_to_liquidation, None);
        assert_eq!(a.seconds_to_liquidation, None);
        assert_eq!(a.risk_level, RiskLevel::Low);
    }

    #[test]
    fn breached_position_is_critical_at_zero() {
        let mut ledger = usdc_ledger();
        // 0.7 ETH * 2000 = 1400 against 1000 borrowed: liquidation price 2142.86
        ledger.positions = vec![eth_position(dec!(0.7), dec!(1000))];
        ledger.daily_price_changes.insert("ETH".into(), dec!(3));
        let engine = engine_with(ledger);

        let a = engine.assess_liquidation_risk().unwrap();
        assert!(a.price_gap_percent < Decimal::ZERO);
        assert!(a.is_breached());
        assert_eq!(a.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn shortest_time_wins() {
        let mut ledger = usdc_ledger();
        ledger.prices.insert("WBTC".into(), dec!(50_000));
        ledger.positions = vec![
            eth_position(dec!(1), dec!(1000)),
            Position::new("compound", "USDC", dec!(1000), "WBTC", dec!(0.1), dec!(150)),
        ];
        // ETH: 25% gap at -1%/day = 25 days; WBTC: 70% gap at -10%/day = 7 days
        ledger.daily_price_changes.insert("ETH".into(), dec!(-1));
        ledger.daily_price_changes.insert("WBTC".into(), dec!(-10));
        let engine = engine_with(ledger);

        let a = engine.assess_liquidation_risk().unwrap();
        assert_eq!(a.protocol, "compound");
        assert_eq!(a.days_to_liquidation, Some(dec!(7)));
        assert_eq!(a.risk_level, RiskLevel::High);
    }

    // ---- thresholds & ledger updates ----

    #[test]
    fn set_thresholds_validates_ordering() {
        let mut engine = RiskAssessmentEngine::with_mock_data();
        let bad = RiskThreshold::new(dec!(100), dec!(150), dec!(200));
        assert!(engine
            .set_risk_thresholds(RiskDimension::Collateral, bad)
            .is_err());
        assert_eq!(engine.thresholds().collateral, RiskThresholds::default().collateral);

        let stricter = RiskThreshold::new(dec!(300), dec!(250), dec!(200));
        engine
            .set_risk_thresholds(RiskDimension::Collateral, stricter)
            .unwrap();
        assert_eq!(engine.thresholds().collateral, stricter);
    }

    #[test]
    fn update_mock_data_changes_outcome() {
        let mut engine = RiskAssessmentEngine::with_mock_data();
        assert!(engine.assess_collateral_risk().is_some());

        engine.update_mock_data(LedgerUpdate::default().with_positions(Vec::new()));
        assert!(engine.assess_collateral_risk().is_none());
        assert!(engine.assess_liquidation_risk().is_none());
    }

    // ---- combined ----

    #[test]
    fn mock_ledger_assessment() {
        let engine = RiskAssessmentEngine::with_mock_data();
        let a = engine.perform_risk_assessment(dec!(10_000));

        let liquidity = a.liquidity.as_ref().unwrap();
        assert_eq!(liquidity.required_liquidity, dec!(3715));
        assert_eq!(liquidity.risk_level, RiskLevel::Low);

        // compound: 0.06 WBTC * 60000 / 2000 = 180%
        let collateral = a.collateral.as_ref().unwrap();
        assert_eq!(collateral.protocol, "compound");
        assert_eq!(collateral.collateral_ratio, dec!(180));
        assert_eq!(collateral.risk_level, RiskLevel::Medium);

        let liquidation = a.liquidation.as_ref().unwrap();
        assert_eq!(liquidation.protocol, "aave");
        assert_eq!(liquidation.risk_level, RiskLevel::Medium);

        assert_eq!(a.overall_risk_level, RiskLevel::Medium);
    }

    #[test]
    fn any_critical_dimension_makes_overall_critical() {
        let now = Utc::now();
        let mut ledger = usdc_ledger();
        ledger.pending_payments = vec![PendingPayment::new(
            "p", "alice", "USDC", dec!(100), now + Duration::days(20),
        )];
        // Healthy position: 500%, rising price
        ledger.positions = vec![eth_position(dec!(2.5), dec!(1000))];
        ledger.daily_price_changes.insert("ETH".into(), dec!(2));
        let engine = engine_with(ledger);

        let healthy = engine.perform_risk_assessment_at(dec!(1000), now);
        assert_eq!(healthy.overall_risk_level, RiskLevel::Low);
        assert_eq!(
            healthy.recommended_actions,
            vec![crate::recommendations::STABLE_MESSAGE.to_string()]
        );

        let broke = engine.perform_risk_assessment_at(dec!(0), now);
        assert_eq!(broke.liquidity.as_ref().unwrap().risk_level, RiskLevel::Critical);
        assert_eq!(broke.collateral.as_ref().unwrap().risk_level, RiskLevel::Low);
        assert_eq!(broke.overall_risk_level, RiskLevel::Critical);
        assert!(broke.recommended_actions[0].starts_with("Top up 100 USDC"));
    }

    #[test]
    fn empty_ledger_is_low_and_stable() {
        let engine = engine_with(RiskLedger::new("USDC"));
        let a = engine.perform_risk_assessment(dec!(0));
        assert!(a.liquidity.is_none());
        assert!(a.collateral.is_none());
        assert!(a.liquidation.is_none());
        assert_eq!(a.overall_risk_level, RiskLevel::Low);
        assert_eq!(a.recommended_actions.len(), 1);
    }
}
