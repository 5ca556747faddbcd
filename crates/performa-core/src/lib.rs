//! # performa-core
//!
//! Foundational types shared by every other crate in the Performa workspace:
//! - A month-indexed [`Timeline`] and the [`CashFlowSeries`] aligned to it
//! - The crate-wide error type ([`PerformaError`]) and its [`PerformaResult`] alias
//! - A dependency-free [`irr`] primitive (Newton-Raphson with bracketing fallback)
//!
//! This crate has no dependency on any other workspace crate; `performa-types`,
//! `performa-ledger`, and `performa-engine` all build on top of it.

pub mod error;
pub mod irr;
pub mod series;
pub mod timeline;

pub use error::{PerformaError, PerformaResult};
pub use irr::irr_monthly;
pub use series::CashFlowSeries;
pub use timeline::{Timeline, YearMonth};
