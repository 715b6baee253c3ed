//! The account ledger the risk engine reads from.
//!
//! The engine does not fetch anything itself: pending payments, open borrow
//! positions, spot prices and daily price moves are handed to it in a
//! [`RiskLedger`] and replaced piecewise with [`LedgerUpdate`].

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use ap_types::{PendingPayment, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLedger {
    /// Asset pending payments are settled in.
    pub base_asset: String,
    pub pending_payments: Vec<PendingPayment>,
    pub positions: Vec<Position>,
    /// Spot price per asset symbol.
    pub prices: HashMap<String, Decimal>,
    /// Daily price change per asset symbol, in percent (negative = falling).
    pub daily_price_changes: HashMap<String, Decimal>,
}

impl RiskLedger {
    pub fn new(base_asset: impl Into<String>) -> Self {
        Self {
            base_asset: base_asset.into(),
            pending_payments: Vec::new(),
            positions: Vec::new(),
            prices: HashMap::new(),
            daily_price_changes: HashMap::new(),
        }
    }

    /// Demo ledger: three USDC payments due over the next ten days and two
    /// borrow positions against ETH and WBTC, both in a falling market.
    pub fn mock(now: DateTime<Utc>) -> Self {
        let usdc = "USDC";
        let mut ledger = Self::new(usdc);

        ledger.pending_payments = vec![
            PendingPayment::new(
                "pay-streaming",
                "streaming-service",
                usdc,
                Decimal::from(15),
                now + Duration::days(1),
            ),
            PendingPayment::new("pay-rent", "landlord", usdc, Decimal::from(1200), now + Duration::days(3)),
            PendingPayment::new("pay-payroll", "payroll", usdc, Decimal::from(2500), now + Duration::days(10)),
        ];

        ledger.positions = vec![
            Position::new("aave", usdc, Decimal::from(1000), "ETH", Decimal::ONE, Decimal::from(150)),
            Position::new(
                "compound",
                usdc,
                Decimal::from(2000),
                "WBTC",
                Decimal::new(6, 2),
                Decimal::from(125),
            ),
        ];

        ledger.prices = [
            (usdc.to_string(), Decimal::ONE),
            ("ETH".to_string(), Decimal::from(2500)),
            ("WBTC".to_string(), Decimal::from(60_000)),
        ]
        .into_iter()
        .collect();

        ledger.daily_price_changes = [
            (usdc.to_string(), Decimal::ZERO),
            ("ETH".to_string(), Decimal::new(-25, 1)),
            ("WBTC".to_string(), Decimal::new(-12, 1)),
        ]
        .into_iter()
        .collect();

        ledger
    }

    pub fn price(&self, asset: &str) -> Option<Decimal> {
        self.prices.get(asset).copied()
    }

    /// Unknown assets are treated as flat.
    pub fn daily_price_change(&self, asset: &str) -> Decimal {
        self.daily_price_changes
            .get(asset)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Payments settled in the base asset.
    pub fn base_asset_payments(&self) -> impl Iterator<Item = &PendingPayment> {
        self.pending_payments
            .iter()
            .filter(move |p| p.asset == self.base_asset)
    }

    /// Apply `update`: lists are replaced, price maps are merged per asset.
    pub fn apply(&mut self, update: LedgerUpdate) {
        if let Some(base_asset) = update.base_asset {
            self.base_asset = base_asset;
        }
        if let Some(payments) = update.pending_payments {
            self.pending_payments = payments;
        }
        if let Some(positions) = update.positions {
            self.positions = positions;
        }
        if let Some(prices) = update.prices {
            self.prices.extend(prices);
        }
        if let Some(changes) = update.daily_price_changes {
            self.daily_price_changes.extend(changes);
        }
    }
}

/// Partial replacement for a [`RiskLedger`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerUpdate {
    pub base_asset: Option<String>,
    pub pending_payments: Option<Vec<PendingPayment>>,
    pub positions: Option<Vec<Position>>,
    pub prices: Option<HashMap<String, Decimal>>,
    pub daily_price_changes: Option<HashMap<String, Decimal>>,
}

impl LedgerUpdate {
    pub fn with_pending_payments(mut self, payments: Vec<PendingPayment>) -> Self {
        self.pending_payments = Some(payments);
        self
    }

    pub fn with_positions(mut self, positions: Vec<Position>) -> Self {
        self.positions = Some(positions);
        self
    }

    pub fn with_price(mut self, asset: impl Into<String>, price: Decimal) -> Self {
        self.prices
            .get_or_insert_with(HashMap::new)
            .insert(asset.into(), price);
        self
    }

    pub fn with_daily_price_change(mut self, asset: impl Into<String>, change_pct: Decimal) -> Self {
        self.daily_price_changes
            .get_or_insert_with(HashMap::new)
            .insert(asset.into(), change_pct);
        self
    }
}
