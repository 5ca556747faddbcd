//! # performa-engine
//!
//! The deal analysis pipeline built on top of `performa-ledger`: asset cash
//! flows, valuation, debt service, the funding cascade, and the partnership
//! waterfall, wired together by [`analyze`].

pub mod asset;
pub mod cash_flow_engine;
pub mod debt;
pub mod model;
pub mod models;
pub mod orchestrator;
pub mod partnership;
pub mod results;
pub mod valuation;

mod analyze;

pub use analyze::analyze;
pub use asset::AssetAnalyzer;
pub use cash_flow_engine::CashFlowEngine;
pub use debt::DebtAnalyzer;
pub use model::{CashFlowModel, Context, PostingSpec};
pub use orchestrator::Orchestrator;
pub use partnership::PartnershipAnalyzer;
pub use results::{DealResults, PartnerResult};
pub use valuation::{Disposition, ValuationEngine};
