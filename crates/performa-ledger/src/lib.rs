//! # performa-ledger
//!
//! The append-only transactional ledger: the `Category`/`Subcategory`/
//! `FlowPurpose` taxonomy and its pure derivation (§3.5-3.6), the
//! `TransactionRecord` atomic unit (§3.3), the `Ledger` store with batched
//! commits (§4.1), the canonical `LedgerQueries` aggregations (§4.2), and
//! columnar export (§6).

pub mod export;
pub mod ledger;
pub mod queries;
pub mod record;
pub mod taxonomy;

pub use export::export_columnar;
pub use ledger::{Ledger, TransactionScope};
pub use queries::LedgerQueries;
pub use record::{TransactionMetadata, TransactionRecord};
pub use taxonomy::{derive_flow_purpose, Category, FlowPurpose, Subcategory};
