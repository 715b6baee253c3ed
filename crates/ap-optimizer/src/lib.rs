//! # ap-optimizer
//!
//! Risk-adjusted yield allocation for AutoPay.
//!
//! Ranks candidate protocols by APY net of a risk penalty that depends on the
//! user's risk preference, splits the allocatable funds into whole
//! percentages, and flags when an existing allocation has drifted from the
//! current plan.

mod allocation;
mod catalog;
mod optimizer;

pub use allocation::{allocate_percentages, recommendation_reason, risk_adjusted_apy};
pub use catalog::ProtocolCatalog;
pub use optimizer::YieldAllocationOptimizer;
