//! Columnar export of a ledger's committed state, for interoperability with
//! external analysis tools.

use std::io::Write;

use performa_core::error::{PerformaError, PerformaResult};

use crate::ledger::Ledger;

/// Write `ledger`'s time-ordered snapshot as CSV to `writer`, in the column
/// order fixed by the interop contract: `transaction_id, date, amount,
/// category, subcategory, flow_purpose, item_name, source_id, asset_id,
/// deal_id, entity_id, entity_type, pass_num`.
///
/// No header row is written; consumers key by column position.
pub fn export_columnar<W: Write>(ledger: &Ledger, writer: W) -> PerformaResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    for record in ledger.snapshot() {
        csv_writer
            .write_record([
                record.transaction_id.to_string(),
                record.date.as_naive_date().to_string(),
                format!("{:.2}", record.amount),
                record.category.as_str().to_string(),
                record.subcategory.as_str().to_string(),
                record.flow_purpose.as_str().to_string(),
                record.item_name.clone(),
                record.source_id.to_string(),
                record.asset_id.to_string(),
                record.deal_id.map(|id| id.to_string()).unwrap_or_default(),
                record.entity_id.map(|id| id.to_string()).unwrap_or_default(),
                record.entity_type.clone().unwrap_or_default(),
                record.pass_num.to_string(),
            ])
            .map_err(|e| PerformaError::query(format!("csv write failed: {e}")))?;
    }

    csv_writer
        .flush()
        .map_err(|e| PerformaError::query(format!("csv flush failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{TransactionMetadata, TransactionRecord};
    use crate::taxonomy::{Category, Subcategory};
    use performa_core::timeline::{Timeline, YearMonth};
    use uuid::Uuid;

    #[test]
    fn export_round_trips_column_count_and_order() {
        let mut ledger = Ledger::new(Timeline::new(YearMonth::new(2026, 1).unwrap(), 2).unwrap());
        let meta = TransactionMetadata {
            category: Category::Revenue,
            subcategory: Subcategory::Lease,
            item_name: "base rent".into(),
            source_id: Uuid::new_v4(),
            asset_id: Uuid::new_v4(),
            deal_id: Some(Uuid::new_v4()),
            entity_id: None,
            entity_type: None,
            pass_num: 1,
        };
        ledger
            .append(TransactionRecord::new(YearMonth::new(2026, 1).unwrap(), 1_000.0, &meta))
            .unwrap();

        let mut buffer = Vec::new();
        export_columnar(&ledger, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let row = text.trim_end();
        assert_eq!(row.split(',').count(), 13);
        assert!(row.starts_with(&ledger.records()[0].transaction_id.to_string()));
        assert!(row.contains("Revenue"));
        assert!(row.contains("1000.00"));
    }
}
