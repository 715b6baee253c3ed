//! AutoPay agent that ties a wallet, the yield optimizer and the risk engine
//! together.
//!
//! Engine state sits behind `RwLock`s: setters take the write lock, planning
//! and assessment take read locks, and no lock is held across an `.await`.

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{error, info};

use ap_optimizer::{ProtocolCatalog, YieldAllocationOptimizer};
use ap_risk::{LedgerUpdate, RiskAssessment, RiskAssessmentEngine, RiskLedger};
use ap_types::{
    parse_amount, ApResult, AutoPayConfig, ProtocolUpdate, RiskDimension, RiskLevel,
    RiskThreshold, StrategyRecommendation,
};

use crate::wallet::{AccountProvider, TransactionId, TransactionSubmitter, TransferRequest};

/// Events emitted by the agent for external consumption (logging, UI,
/// alerting).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentEvent {
    AllocationPlanned {
        available_funds: Decimal,
        protocols: usize,
    },
    TransferSubmitted {
        transaction_id: TransactionId,
        protocol_id: String,
        amount: Decimal,
    },
    TransferFailed {
        protocol_id: String,
        error: String,
    },
    RiskAssessed {
        level: RiskLevel,
        actions: Vec<String>,
    },
    SettingsChanged {
        description: String,
    },
}

/// One executed line of an allocation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedAllocation {
    pub recommendation: StrategyRecommendation,
    pub transaction_id: TransactionId,
}

pub struct AutoPayAgent<W> {
    wallet: W,
    base_asset: String,
    optimizer: RwLock<YieldAllocationOptimizer>,
    risk_engine: RwLock<RiskAssessmentEngine>,
    events: Mutex<Vec<AgentEvent>>,
}

impl<W> AutoPayAgent<W>
where
    W: AccountProvider + TransactionSubmitter,
{
    pub fn new(
        wallet: W,
        config: AutoPayConfig,
        catalog: ProtocolCatalog,
        mut ledger: RiskLedger,
    ) -> ApResult<Self> {
        config.validate()?;
        ledger.base_asset = config.base_asset.clone();

        let optimizer = YieldAllocationOptimizer::new(catalog, config.optimizer)?;
        let risk_engine = RiskAssessmentEngine::new(config.risk, ledger)?;

        Ok(Self {
            wallet,
            base_asset: config.base_asset,
            optimizer: RwLock::new(optimizer),
            risk_engine: RwLock::new(risk_engine),
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn base_asset(&self) -> &str {
        &self.base_asset
    }

    /// Spendable base-asset balance, parsed from the provider's string.
    pub async fn available_funds(&self) -> ApResult<Decimal> {
        let raw = self.wallet.available_balance(&self.base_asset).await?;
        parse_amount(&raw)
    }

    pub async fn plan_allocation(&self) -> ApResult<Vec<StrategyRecommendation>> {
        let available_funds = self.available_funds().await?;
        let plan = self.optimizer.read().optimize_allocation(available_funds);

        self.emit(AgentEvent::AllocationPlanned {
            available_funds,
            protocols: plan.len(),
        });
        Ok(plan)
    }

    /// Plan, then submit one deposit per recommendation.
    ///
    /// Stops at the first rejected transfer and returns its error; transfers
    /// already accepted stay recorded in the event log.
    pub async fn execute_allocation(&self) -> ApResult<Vec<ExecutedAllocation>> {
        let plan = self.plan_allocation().await?;
        let mut executed = Vec::with_capacity(plan.len());

        for recommendation in plan {
            if recommendation.allocation_amount <= Decimal::ZERO {
                continue;
            }
            let request = TransferRequest::yield_deposit(
                self.base_asset.clone(),
                recommendation.allocation_amount,
                recommendation.protocol_id.clone(),
            );

            match self.wallet.submit(request).await {
                Ok(transaction_id) => {
                    self.emit(AgentEvent::TransferSubmitted {
                        transaction_id: transaction_id.clone(),
                        protocol_id: recommendation.protocol_id.clone(),
                        amount: recommendation.allocation_amount,
                    });
                    executed.push(ExecutedAllocation {
                        recommendation,
                        transaction_id,
                    });
                }
                Err(e) => {
                    error!(protocol = %recommendation.protocol_id, error = %e, "deposit failed");
                    self.emit(AgentEvent::TransferFailed {
                        protocol_id: recommendation.protocol_id.clone(),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            }
        }

        info!(transfers = executed.len(), "allocation executed");
        Ok(executed)
    }

    pub async fn assess_risk(&self) -> ApResult<RiskAssessment> {
        let available = self.available_funds().await?;
        let assessment = self.risk_engine.read().perform_risk_assessment(available);

        self.emit(AgentEvent::RiskAssessed {
            level: assessment.overall_risk_level,
            actions: assessment.recommended_actions.clone(),
        });
        Ok(assessment)
    }

    pub fn should_rebalance(&self, current: &HashMap<String, Decimal>) -> bool {
        self.optimizer.read().should_rebalance(current)
    }

    // -- Settings -------------------------------------------------------------

    pub fn set_risk_preference(&self, preference: u8) -> ApResult<()> {
        self.optimizer.write().set_risk_preference(preference)?;
        self.emit(AgentEvent::SettingsChanged {
            description: format!("risk preference set to {preference}"),
        });
        Ok(())
    }

    pub fn update_protocol_info(&self, id: &str, update: &ProtocolUpdate) -> ApResult<()> {
        self.optimizer.write().update_protocol_info(id, update)?;
        self.emit(AgentEvent::SettingsChanged {
            description: format!("protocol {id} updated"),
        });
        Ok(())
    }

    pub fn set_risk_thresholds(&self, dimension: RiskDimension, threshold: RiskThreshold) -> ApResult<()> {
        self.risk_engine
            .write()
            .set_risk_thresholds(dimension, threshold)?;
        self.emit(AgentEvent::SettingsChanged {
            description: format!("{dimension} thresholds updated"),
        });
        Ok(())
    }

    pub fn update_ledger(&self, update: LedgerUpdate) {
        self.risk_engine.write().update_mock_data(update);
    }

    /// Drain all pending events.
    pub fn drain_events(&self) -> Vec<AgentEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    fn emit(&self, event: AgentEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::PaperWallet;
    use ap_types::{ApError, PendingPayment};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn agent_with_balance(balance: Decimal) -> AutoPayAgent<PaperWallet> {
        AutoPayAgent::new(
            PaperWallet::with_balance("USDC", balance),
            AutoPayConfig::default(),
            ProtocolCatalog::builtin(),
            RiskLedger::mock(Utc::now()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn plans_from_wallet_balance() {
        let agent = agent_with_balance(dec!(1000));
        let plan = agent.plan_allocation().await.unwrap();

        let ids: Vec<&str> = plan.iter().map(|r| r.protocol_id.as_str()).collect();
        assert_eq!(ids, vec!["yearn", "aave", "compound"]);

        let events = agent.drain_events();
        assert!(matches!(
            events.as_slice(),
            [AgentEvent::AllocationPlanned { protocols: 3, .. }]
        ));
        assert!(agent.drain_events().is_empty());
    }

    #[tokio::test]
    async fn executes_one_deposit_per_recommendation() {
        let agent = agent_with_balance(dec!(1000));
        let executed = agent.execute_allocation().await.unwrap();

        assert_eq!(executed.len(), 3);
        // 900 deployed, the 10% reserve stays in the wallet
        assert_eq!(agent.wallet().balance("USDC"), dec!(100));
        assert_eq!(agent.wallet().transfers().len(), 3);

        let submitted = agent
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, AgentEvent::TransferSubmitted { .. }))
            .count();
        assert_eq!(submitted, 3);
    }

    #[tokio::test]
    async fn empty_wallet_executes_nothing() {
        let agent = agent_with_balance(dec!(0));
        assert!(agent.execute_allocation().await.unwrap().is_empty());
        assert!(agent.wallet().transfers().is_empty());
    }

    #[tokio::test]
    async fn risk_assessment_uses_wallet_liquidity() {
        let agent = agent_with_balance(dec!(100));
        let assessment = agent.assess_risk().await.unwrap();

        // 100 of 3715 USDC pending
        let liquidity = assessment.liquidity.unwrap();
        assert_eq!(liquidity.risk_level, RiskLevel::Critical);
        assert_eq!(assessment.overall_risk_level, RiskLevel::Critical);
        assert!(assessment.recommended_actions[0].starts_with("Top up"));
    }

    #[tokio::test]
    async fn ledger_updates_flow_into_assessment() {
        let agent = agent_with_balance(dec!(100));
        agent.update_ledger(
            LedgerUpdate::default()
                .with_pending_payments(vec![PendingPayment::new(
                    "p",
                    "alice",
                    "USDC",
                    dec!(50),
                    Utc::now() + Duration::days(5),
                )])
                .with_positions(Vec::new()),
        );

        let assessment = agent.assess_risk().await.unwrap();
        assert_eq!(assessment.overall_risk_level, RiskLevel::Low);
        assert!(assessment.collateral.is_none());
    }

    #[tokio::test]
    async fn settings_are_validated_and_logged() {
        let agent = agent_with_balance(dec!(1000));
        assert!(matches!(
            agent.set_risk_preference(0),
            Err(ApError::InvalidArgument(_))
        ));
        agent.set_risk_preference(1).unwrap();
        agent
            .update_protocol_info("aave", &ProtocolUpdate::apy(dec!(6)))
            .unwrap();
        assert!(agent
            .set_risk_thresholds(
                RiskDimension::Liquidity,
                RiskThreshold::new(dec!(10), dec!(20), dec!(30)),
            )
            .is_err());

        let events = agent.drain_events();
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| matches!(e, AgentEvent::SettingsChanged { .. })));

        let plan = agent.plan_allocation().await.unwrap();
        assert_eq!(plan[0].protocol_id, "aave");
    }

    #[tokio::test]
    async fn rebalance_check_passes_through() {
        let agent = agent_with_balance(dec!(1000));
        assert!(agent.should_rebalance(&HashMap::new()));
    }

    #[test]
    fn config_base_asset_overrides_ledger() {
        let config = AutoPayConfig {
            base_asset: "DAI".into(),
            ..Default::default()
        };
        let agent = AutoPayAgent::new(
            PaperWallet::new(),
            config,
            ProtocolCatalog::builtin(),
            RiskLedger::mock(Utc::now()),
        )
        .unwrap();
        assert_eq!(agent.base_asset(), "DAI");
        assert_eq!(agent.risk_engine.read().ledger().base_asset, "DAI");
    }
}
