use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ap_live::{AutoPayAgent, PaperWallet};
use ap_optimizer::ProtocolCatalog;
use ap_risk::RiskLedger;
use ap_types::AutoPayConfig;

const STARTING_BALANCE: i64 = 10_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::var("AUTOPAY_CONFIG") {
        Ok(path) => AutoPayConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {path}"))?,
        Err(_) => AutoPayConfig::default(),
    };
    info!(base_asset = %config.base_asset, "starting autopay demo");

    let wallet = PaperWallet::with_balance(config.base_asset.clone(), Decimal::from(STARTING_BALANCE));
    let agent = AutoPayAgent::new(
        wallet,
        config,
        ProtocolCatalog::builtin(),
        RiskLedger::mock(Utc::now()),
    )?;

    let executed = agent.execute_allocation().await?;
    println!("{}", serde_json::to_string_pretty(&executed)?);

    let assessment = agent.assess_risk().await?;
    println!("{}", serde_json::to_string_pretty(&assessment)?);

    for event in agent.drain_events() {
        info!(?event, "agent event");
    }
    Ok(())
}
