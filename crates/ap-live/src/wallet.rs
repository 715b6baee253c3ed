//! Seams to the account and transaction layers.
//!
//! Balances arrive as numeric strings, the way external providers hand them
//! over; transfers come back as opaque transaction ids. Implementations may
//! wrap a real chain SDK or simulate everything locally (see
//! [`super::paper::PaperWallet`]).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use ap_types::ApResult;

/// Opaque identifier returned by the transaction layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why funds are being moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferPurpose {
    /// Deposit into a yield protocol as part of an allocation plan.
    YieldDeposit { protocol_id: String },
    /// Settlement of a scheduled payment.
    Payment { payment_id: String },
}

/// A request to move `amount` of `asset` to `destination`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub asset: String,
    pub amount: Decimal,
    pub destination: String,
    pub purpose: TransferPurpose,
    pub requested_at: DateTime<Utc>,
}

impl TransferRequest {
    pub fn yield_deposit(asset: impl Into<String>, amount: Decimal, protocol_id: impl Into<String>) -> Self {
        let protocol_id = protocol_id.into();
        Self {
            asset: asset.into(),
            amount,
            destination: protocol_id.clone(),
            purpose: TransferPurpose::YieldDeposit { protocol_id },
            requested_at: Utc::now(),
        }
    }

    pub fn payment(
        asset: impl Into<String>,
        amount: Decimal,
        recipient: impl Into<String>,
        payment_id: impl Into<String>,
    ) -> Self {
        Self {
            asset: asset.into(),
            amount,
            destination: recipient.into(),
            purpose: TransferPurpose::Payment {
                payment_id: payment_id.into(),
            },
            requested_at: Utc::now(),
        }
    }
}

/// Supplies spendable balances.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Spendable balance of `asset` as a decimal string.
    async fn available_balance(&self, asset: &str) -> ApResult<String>;
}

/// Executes approved transfers.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Submit a transfer and return the id assigned by the transaction layer.
    async fn submit(&self, request: TransferRequest) -> ApResult<TransactionId>;
}
