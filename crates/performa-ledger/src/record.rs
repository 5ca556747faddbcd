//! The atomic, immutable unit of the ledger.

use performa_core::timeline::YearMonth;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::taxonomy::{derive_flow_purpose, Category, FlowPurpose, Subcategory};

/// A single immutable, fully-valued ledger entry.
///
/// Constructed only via [`TransactionRecord::new`], which derives
/// `flow_purpose` from `(category, subcategory, sign(amount))` rather than
/// accepting it as an independent input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: Uuid,
    pub date: YearMonth,
    /// + = cash into the deal entity; − = cash out.
    pub amount: f64,
    pub category: Category,
    pub subcategory: Subcategory,
    pub flow_purpose: FlowPurpose,
    pub item_name: String,
    pub source_id: Uuid,
    pub asset_id: Uuid,
    pub deal_id: Option<Uuid>,
    pub entity_id: Option<Uuid>,
    pub entity_type: Option<String>,
    pub pass_num: u8,
}

/// Everything about a posting except its date and amount — supplied once
/// per `add_series` / `append` call and stamped onto every record it
/// produces.
#[derive(Debug, Clone)]
pub struct TransactionMetadata {
    pub category: Category,
    pub subcategory: Subcategory,
    pub item_name: String,
    pub source_id: Uuid,
    pub asset_id: Uuid,
    pub deal_id: Option<Uuid>,
    pub entity_id: Option<Uuid>,
    pub entity_type: Option<String>,
    pub pass_num: u8,
}

impl TransactionRecord {
    /// Build a record, deriving `flow_purpose` from the category,
    /// subcategory, and the sign of `amount`.
    pub fn new(date: YearMonth, amount: f64, meta: &TransactionMetadata) -> Self {
        let flow_purpose = derive_flow_purpose(meta.category, meta.subcategory, amount);
        Self {
            transaction_id: Uuid::new_v4(),
            date,
            amount,
            category: meta.category,
            subcategory: meta.subcategory,
            flow_purpose,
            item_name: meta.item_name.clone(),
            source_id: meta.source_id,
            asset_id: meta.asset_id,
            deal_id: meta.deal_id,
            entity_id: meta.entity_id,
            entity_type: meta.entity_type.clone(),
            pass_num: meta.pass_num,
        }
    }
}
