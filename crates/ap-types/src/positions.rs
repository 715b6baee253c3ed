use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open borrow position backed by collateral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub protocol: String,
    pub borrowed_asset: String,
    pub borrowed_amount: Decimal,
    pub collateral_asset: String,
    pub collateral_amount: Decimal,
    /// Collateral ratio (percent) below which the position can be liquidated.
    pub liquidation_threshold: Decimal,
}

impl Position {
    pub fn new(
        protocol: impl Into<String>,
        borrowed_asset: impl Into<String>,
        borrowed_amount: Decimal,
        collateral_asset: impl Into<String>,
        collateral_amount: Decimal,
        liquidation_threshold: Decimal,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            borrowed_asset: borrowed_asset.into(),
            borrowed_amount,
            collateral_asset: collateral_asset.into(),
            collateral_amount,
            liquidation_threshold,
        }
    }

    pub fn borrowed_value(&self, borrowed_price: Decimal) -> Decimal {
        self.borrowed_amount * borrowed_price
    }

    pub fn collateral_value(&self, collateral_price: Decimal) -> Decimal {
        self.collateral_amount * collateral_price
    }

    /// Collateral value over borrowed value, in percent. `None` when nothing
    /// is borrowed.
    pub fn collateral_ratio(&self, collateral_price: Decimal, borrowed_price: Decimal) -> Option<Decimal> {
        let borrowed = self.borrowed_value(borrowed_price);
        if borrowed.is_zero() {
            return None;
        }
        Some(self.collateral_value(collateral_price) / borrowed * Decimal::ONE_HUNDRED)
    }

    /// Collateral spot price at which the ratio touches the liquidation
    /// threshold. `None` without collateral.
    pub fn liquidation_price(&self, borrowed_price: Decimal) -> Option<Decimal> {
        if self.collateral_amount.is_zero() {
            return None;
        }
        Some(
            self.borrowed_value(borrowed_price) * self.liquidation_threshold
                / Decimal::ONE_HUNDRED
                / self.collateral_amount,
        )
    }
}

/// A scheduled outgoing payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPayment {
    pub id: String,
    pub recipient: String,
    pub asset: String,
    pub amount: Decimal,
    pub due_at: DateTime<Utc>,
}

impl PendingPayment {
    pub fn new(
        id: impl Into<String>,
        recipient: impl Into<String>,
        asset: impl Into<String>,
        amount: Decimal,
        due_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            recipient: recipient.into(),
            asset: asset.into(),
            amount,
            due_at,
        }
    }

    /// Whole seconds from `now` until the payment is due; zero once past due.
    pub fn seconds_until_due(&self, now: DateTime<Utc>) -> i64 {
        (self.due_at - now).num_seconds().max(0)
    }
}
