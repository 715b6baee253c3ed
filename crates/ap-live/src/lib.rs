//! Live wiring for AutoPay.
//!
//! - [`wallet`]: account and transaction seams consumed by the agent
//! - [`paper`]: in-memory wallet for sandbox runs
//! - [`agent`]: the agent that plans, executes and monitors allocations

pub mod agent;
pub mod paper;
pub mod wallet;

pub use agent::{AgentEvent, AutoPayAgent, ExecutedAllocation};
pub use paper::{PaperWallet, SubmittedTransfer};
pub use wallet::{AccountProvider, TransactionId, TransactionSubmitter, TransferPurpose, TransferRequest};
