//! Paper (simulated) wallet for sandbox mode.
//!
//! Keeps balances in memory and records every transfer it accepts. Nothing is
//! signed or broadcast.

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use ap_types::{invalid_argument, ApError, ApResult};

use crate::wallet::{AccountProvider, TransactionId, TransactionSubmitter, TransferRequest};

/// A transfer the paper wallet accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedTransfer {
    pub transaction_id: TransactionId,
    pub request: TransferRequest,
}

#[derive(Debug, Default)]
struct WalletState {
    balances: HashMap<String, Decimal>,
    transfers: Vec<SubmittedTransfer>,
}

/// A fully in-process wallet.
#[derive(Debug, Default)]
pub struct PaperWallet {
    state: Mutex<WalletState>,
}

impl PaperWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wallet holding `amount` of `asset`.
    pub fn with_balance(asset: impl Into<String>, amount: Decimal) -> Self {
        let wallet = Self::new();
        wallet.deposit(asset, amount);
        wallet
    }

    pub fn deposit(&self, asset: impl Into<String>, amount: Decimal) {
        let mut state = self.state.lock();
        *state.balances.entry(asset.into()).or_insert(Decimal::ZERO) += amount;
    }

    pub fn balance(&self, asset: &str) -> Decimal {
        self.state
            .lock()
            .balances
            .get(asset)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn transfers(&self) -> Vec<SubmittedTransfer> {
        self.state.lock().transfers.clone()
    }
}

#[async_trait]
impl AccountProvider for PaperWallet {
    async fn available_balance(&self, asset: &str) -> ApResult<String> {
        Ok(self.balance(asset).to_string())
    }
}

#[async_trait]
impl TransactionSubmitter for PaperWallet {
    async fn submit(&self, request: TransferRequest) -> ApResult<TransactionId> {
        if request.amount <= Decimal::ZERO {
            return Err(invalid_argument!(
                "transfer amount must be positive, got {}",
                request.amount
            ));
        }

        let mut state = self.state.lock();
        let available = state
            .balances
            .get(&request.asset)
            .copied()
            .unwrap_or(Decimal::ZERO);
        if request.amount > available {
            return Err(ApError::InsufficientFunds {
                required: request.amount,
                available,
            });
        }

        state
            .balances
            .insert(request.asset.clone(), available - request.amount);
        let transaction_id = TransactionId(format!("paper-{}", Uuid::new_v4()));
        info!(
            tx = %transaction_id,
            asset = %request.asset,
            amount = %request.amount,
            destination = %request.destination,
            "paper transfer accepted"
        );
        state.transfers.push(SubmittedTransfer {
            transaction_id: transaction_id.clone(),
            request,
        });
        Ok(transaction_id)
    }
}
