//! The append-only transactional ledger.

use performa_core::error::{PerformaError, PerformaResult};
use performa_core::series::CashFlowSeries;
use performa_core::timeline::Timeline;

use crate::queries::parse_query_expr;
use crate::record::{TransactionMetadata, TransactionRecord};

/// Append-only store of [`TransactionRecord`]s for a single analysis run.
///
/// Appends are only ever made through [`Ledger::transaction`] (or the
/// `append`/`append_series` convenience wrappers, which each open their own
/// single-statement transaction): nothing lands in the committed record set
/// until the scope closure returns `Ok`.
#[derive(Debug)]
pub struct Ledger {
    timeline: Timeline,
    records: Vec<TransactionRecord>,
    sealed: bool,
}

/// A batch of pending appends, committed atomically when its owning
/// [`Ledger::transaction`] call returns `Ok`.
pub struct TransactionScope<'a> {
    timeline: &'a Timeline,
    buffer: Vec<TransactionRecord>,
}

impl<'a> TransactionScope<'a> {
    /// Stage a single record. Validates the record's date against the
    /// governing timeline but does not commit it.
    pub fn append(&mut self, record: TransactionRecord) -> PerformaResult<()> {
        self.timeline.require_index_of(record.date)?;
        self.buffer.push(record);
        Ok(())
    }

    /// Expand a [`CashFlowSeries`] into one record per non-zero month,
    /// staging each with the same metadata.
    pub fn append_series(
        &mut self,
        series: &CashFlowSeries,
        meta: &TransactionMetadata,
    ) -> PerformaResult<()> {
        for (idx, month) in self.timeline.months().into_iter().enumerate() {
            let amount = series.as_slice().get(idx).copied().unwrap_or(0.0);
            if amount == 0.0 {
                continue;
            }
            self.append(TransactionRecord::new(month, amount, meta))?;
        }
        Ok(())
    }
}

impl Ledger {
    /// Construct an empty ledger governed by `timeline`.
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            records: Vec::new(),
            sealed: false,
        }
    }

    /// The timeline every record in this ledger is aligned to.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Run `f` against a fresh [`TransactionScope`] and commit its staged
    /// records in one batch if `f` succeeds. Nothing is committed if `f`
    /// returns an error or panics.
    pub fn transaction<F>(&mut self, f: F) -> PerformaResult<()>
    where
        F: FnOnce(&mut TransactionScope) -> PerformaResult<()>,
    {
        if self.sealed {
            return Err(PerformaError::LedgerSealedError);
        }
        let mut scope = TransactionScope {
            timeline: &self.timeline,
            buffer: Vec::new(),
        };
        f(&mut scope)?;
        self.records.extend(scope.buffer);
        Ok(())
    }

    /// Append a single record as its own transaction.
    pub fn append(&mut self, record: TransactionRecord) -> PerformaResult<()> {
        self.transaction(|scope| scope.append(record))
    }

    /// Expand and append a series as its own transaction.
    pub fn append_series(
        &mut self,
        series: &CashFlowSeries,
        meta: &TransactionMetadata,
    ) -> PerformaResult<()> {
        self.transaction(|scope| scope.append_series(series, meta))
    }

    /// Seal the ledger. Further appends fail with [`PerformaError::LedgerSealedError`];
    /// queries continue to work.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Whether the ledger has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of committed records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger has no committed records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All committed records, in append order (not logical/date order).
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// Materialize all committed records in time order (query order).
    pub fn snapshot(&self) -> Vec<&TransactionRecord> {
        let mut snapshot: Vec<&TransactionRecord> = self.records.iter().collect();
        snapshot.sort_by_key(|r| r.date);
        snapshot
    }

    /// Ad-hoc fallback query: a small conjunctive filter expression over
    /// `category`/`subcategory`/`flow_purpose`/`entity_id`, e.g.
    /// `"category=Financing,subcategory=Interest Reserve"`. Returns
    /// [`PerformaError::QueryError`] for unparsable expressions.
    ///
    /// Prefer [`crate::LedgerQueries`]'s typed methods for anything that
    /// feeds a reported metric; this exists for ad-hoc analytics only.
    pub fn query(&self, expr: &str) -> PerformaResult<Vec<&TransactionRecord>> {
        let predicate = parse_query_expr(expr)?;
        Ok(self.snapshot().into_iter().filter(|r| predicate(r)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{Category, Subcategory};
    use performa_core::timeline::YearMonth;
    use uuid::Uuid;

    fn timeline() -> Timeline {
        Timeline::new(YearMonth::new(2026, 1).unwrap(), 12).unwrap()
    }

    fn meta() -> TransactionMetadata {
        TransactionMetadata {
            category: Category::Revenue,
            subcategory: Subcategory::Lease,
            item_name: "base rent".into(),
            source_id: Uuid::new_v4(),
            asset_id: Uuid::new_v4(),
            deal_id: None,
            entity_id: None,
            entity_type: None,
            pass_num: 1,
        }
    }

    #[test]
    fn append_series_skips_zero_months() {
        let mut ledger = Ledger::new(timeline());
        let series = CashFlowSeries::new(vec![100.0, 0.0, 50.0]);
        ledger.append_series(&series, &meta()).unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn failed_transaction_commits_nothing() {
        let mut ledger = Ledger::new(timeline());
        let out_of_range = TransactionRecord::new(YearMonth::new(2030, 1).unwrap(), 10.0, &meta());
        let result = ledger.transaction(|scope| {
            scope.append(TransactionRecord::new(YearMonth::new(2026, 1).unwrap(), 5.0, &meta()))?;
            scope.append(out_of_range)?;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn sealed_ledger_rejects_appends() {
        let mut ledger = Ledger::new(timeline());
        ledger.seal();
        let record = TransactionRecord::new(YearMonth::new(2026, 1).unwrap(), 5.0, &meta());
        assert!(matches!(
            ledger.append(record),
            Err(PerformaError::LedgerSealedError)
        ));
    }

    #[test]
    fn snapshot_is_time_ordered_regardless_of_append_order() {
        let mut ledger = Ledger::new(timeline());
        ledger
            .append(TransactionRecord::new(YearMonth::new(2026, 3).unwrap(), 1.0, &meta()))
            .unwrap();
        ledger
            .append(TransactionRecord::new(YearMonth::new(2026, 1).unwrap(), 2.0, &meta()))
            .unwrap();
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot[0].date, YearMonth::new(2026, 1).unwrap());
        assert_eq!(snapshot[1].date, YearMonth::new(2026, 3).unwrap());
    }
}
