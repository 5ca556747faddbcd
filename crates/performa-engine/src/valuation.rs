//! Property valuation and the disposition posting at exit.

use performa_core::error::PerformaResult;
use performa_core::series::CashFlowSeries;
use performa_core::timeline::Timeline;
use performa_ledger::{Category, LedgerQueries, Subcategory, TransactionMetadata};
use performa_types::ExitStrategy;
use uuid::Uuid;

/// The gross sale proceeds and transaction costs posted at the hold period's
/// exit month.
pub struct Disposition {
    pub hold_months: u32,
    pub gross_sale_proceeds: f64,
    pub transaction_costs: f64,
}

/// Computes property value and the exit-month disposition, never by
/// arithmetic shortcuts on other queries — always from the NOI the ledger
/// actually recorded.
pub struct ValuationEngine<'a> {
    timeline: &'a Timeline,
}

const TRANSACTION_COST_RATE: f64 = 0.015;

impl<'a> ValuationEngine<'a> {
    pub fn new(timeline: &'a Timeline) -> Self {
        Self { timeline }
    }

    /// Property value at each month of the timeline, under `exit`.
    pub fn property_value_series(&self, exit: &ExitStrategy, noi: &CashFlowSeries) -> CashFlowSeries {
        match exit {
            ExitStrategy::DirectEntry { price, .. } => {
                CashFlowSeries::new(vec![*price; self.timeline.length()])
            }
            ExitStrategy::DirectCap { cap_rate, .. } => {
                let values = (0..self.timeline.length())
                    .map(|idx| {
                        let trailing_annual = self.trailing_annualized_noi(noi, idx);
                        trailing_annual / cap_rate
                    })
                    .collect();
                CashFlowSeries::new(values)
            }
            ExitStrategy::Dcf {
                discount_rate,
                terminal_cap,
                ..
            } => {
                let monthly_rate = discount_rate / 12.0;
                let values = (0..self.timeline.length())
                    .map(|idx| self.discounted_remaining_value(noi, idx, monthly_rate, *terminal_cap))
                    .collect();
                CashFlowSeries::new(values)
            }
        }
    }

    fn trailing_annualized_noi(&self, noi: &CashFlowSeries, idx: usize) -> f64 {
        let window_start = idx.saturating_sub(11);
        let window: f64 = (window_start..=idx).map(|i| noi.as_slice().get(i).copied().unwrap_or(0.0)).sum();
        let months_in_window = (idx - window_start + 1) as f64;
        window * (12.0 / months_in_window)
    }

    fn discounted_remaining_value(
        &self,
        noi: &CashFlowSeries,
        idx: usize,
        monthly_rate: f64,
        terminal_cap: f64,
    ) -> f64 {
        let length = self.timeline.length();
        let mut pv = 0.0;
        for (offset, future_idx) in ((idx + 1)..length).enumerate() {
            let month_noi = noi.as_slice().get(future_idx).copied().unwrap_or(0.0);
            pv += month_noi / (1.0 + monthly_rate).powi(offset as i32 + 1);
        }
        let last_annual_noi = if length > 0 {
            self.trailing_annualized_noi(noi, length - 1)
        } else {
            0.0
        };
        let terminal_value = if terminal_cap > 0.0 { last_annual_noi / terminal_cap } else { 0.0 };
        let remaining_periods = length.saturating_sub(idx + 1);
        pv + terminal_value / (1.0 + monthly_rate).powi(remaining_periods as i32)
    }

    /// Gross sale proceeds and transaction costs at the exit month, derived
    /// from trailing NOI under `exit` — never from a hardcoded price unless
    /// `exit` is [`ExitStrategy::DirectEntry`].
    pub fn disposition(&self, exit: &ExitStrategy, noi: &CashFlowSeries) -> Disposition {
        let hold_months = match exit {
            ExitStrategy::DirectCap { hold_months, .. }
            | ExitStrategy::Dcf { hold_months, .. }
            | ExitStrategy::DirectEntry { hold_months, .. } => *hold_months,
        };
        let exit_idx = (hold_months as usize).saturating_sub(1).min(self.timeline.length().saturating_sub(1));
        let value_series = self.property_value_series(exit, noi);
        let gross_sale_proceeds = value_series.as_slice().get(exit_idx).copied().unwrap_or(0.0);
        let transaction_costs = gross_sale_proceeds * TRANSACTION_COST_RATE;
        Disposition {
            hold_months,
            gross_sale_proceeds,
            transaction_costs,
        }
    }

    /// Post the full-timeline property value series as an informational
    /// `Valuation` record — never summed into any cash-flow query, it exists
    /// purely so a caller can trace the value behind a given month's
    /// disposition back to a ledger entry instead of recomputing it.
    pub fn post_value_series(
        &self,
        ledger: &mut performa_ledger::Ledger,
        exit: &ExitStrategy,
        noi: &CashFlowSeries,
        asset_id: Uuid,
        pass_num: u8,
    ) -> PerformaResult<()> {
        let subcategory = match exit {
            ExitStrategy::DirectEntry { .. } => Subcategory::AssetValuation,
            ExitStrategy::DirectCap { .. } => Subcategory::DirectCap,
            ExitStrategy::Dcf { .. } => Subcategory::Dcf,
        };
        let series = self.property_value_series(exit, noi);
        ledger.transaction(|scope| {
            scope.append_series(
                &series,
                &TransactionMetadata {
                    category: Category::Valuation,
                    subcategory,
                    item_name: "Property Value".into(),
                    source_id: Uuid::new_v5(&Uuid::NAMESPACE_OID, b"valuation.value_series"),
                    asset_id,
                    deal_id: None,
                    entity_id: None,
                    entity_type: None,
                    pass_num,
                },
            )
        })
    }

    /// Post the disposition's sale proceeds and transaction costs at the
    /// exit month.
    pub fn post_disposition(
        &self,
        ledger: &mut performa_ledger::Ledger,
        disposition: &Disposition,
        asset_id: Uuid,
        pass_num: u8,
    ) -> PerformaResult<()> {
        let exit_idx = (disposition.hold_months as usize)
            .saturating_sub(1)
            .min(self.timeline.length().saturating_sub(1));
        let exit_month = self.timeline.months()[exit_idx];

        let sale_series = self.single_month_series(exit_idx, disposition.gross_sale_proceeds);
        let cost_series = self.single_month_series(exit_idx, -disposition.transaction_costs);

        ledger.transaction(|scope| {
            scope.append_series(
                &sale_series,
                &TransactionMetadata {
                    category: Category::Revenue,
                    subcategory: Subcategory::Sale,
                    item_name: "Sale Proceeds".into(),
                    source_id: Uuid::new_v5(&Uuid::NAMESPACE_OID, b"valuation.disposition"),
                    asset_id,
                    deal_id: None,
                    entity_id: None,
                    entity_type: None,
                    pass_num,
                },
            )?;
            scope.append_series(
                &cost_series,
                &TransactionMetadata {
                    category: Category::Capital,
                    subcategory: Subcategory::TransactionCosts,
                    item_name: "Disposition Costs".into(),
                    source_id: Uuid::new_v5(&Uuid::NAMESPACE_OID, b"valuation.disposition"),
                    asset_id,
                    deal_id: None,
                    entity_id: None,
                    entity_type: None,
                    pass_num,
                },
            )?;
            Ok(())
        })?;

        tracing::info!(month = %exit_month, proceeds = disposition.gross_sale_proceeds, "posted disposition");
        Ok(())
    }

    fn single_month_series(&self, idx: usize, amount: f64) -> CashFlowSeries {
        let mut values = vec![0.0; self.timeline.length()];
        if idx < values.len() {
            values[idx] = amount;
        }
        CashFlowSeries::new(values)
    }
}

/// Convenience accessor mirroring [`LedgerQueries::noi`] for callers that
/// already hold a `LedgerQueries`.
pub fn noi_series(queries: &LedgerQueries) -> CashFlowSeries {
    queries.noi()
}

#[cfg(test)]
mod tests {
    use super::*;
    use performa_core::timeline::YearMonth;

    #[test]
    fn direct_entry_is_a_flat_price_series() {
        let timeline = Timeline::new(YearMonth::new(2026, 1).unwrap(), 12).unwrap();
        let engine = ValuationEngine::new(&timeline);
        let noi = CashFlowSeries::zeros(12);
        let exit = ExitStrategy::DirectEntry { price: 5_000_000.0, hold_months: 12 };
        let series = engine.property_value_series(&exit, &noi);
        assert!(series.iter().all(|v| *v == 5_000_000.0));
    }

    #[test]
    fn direct_cap_divides_trailing_annualized_noi_by_cap_rate() {
        let timeline = Timeline::new(YearMonth::new(2026, 1).unwrap(), 12).unwrap();
        let engine = ValuationEngine::new(&timeline);
        let noi = CashFlowSeries::new(vec![10_000.0; 12]);
        let exit = ExitStrategy::DirectCap { cap_rate: 0.05, hold_months: 12 };
        let series = engine.property_value_series(&exit, &noi);
        assert!((series[11] - (120_000.0 / 0.05)).abs() < 1.0);
    }

    #[test]
    fn value_series_is_posted_as_valuation_category_and_excluded_from_cash_flow() {
        let timeline = Timeline::new(YearMonth::new(2026, 1).unwrap(), 12).unwrap();
        let engine = ValuationEngine::new(&timeline);
        let mut ledger = performa_ledger::Ledger::new(timeline.clone());
        let noi = CashFlowSeries::new(vec![10_000.0; 12]);
        let exit = ExitStrategy::DirectCap { cap_rate: 0.05, hold_months: 12 };
        engine.post_value_series(&mut ledger, &exit, &noi, Uuid::new_v4(), 7).unwrap();

        let records = ledger.query("category=Valuation").unwrap();
        assert_eq!(records.len(), 12);
        assert!(records.iter().all(|r| r.amount >= 0.0));

        let queries = LedgerQueries::new(&ledger);
        assert_eq!(queries.project_cash_flow().total(), 0.0);
        assert_eq!(queries.noi().total(), 0.0);
    }

    #[test]
    fn disposition_applies_transaction_cost_rate() {
        let timeline = Timeline::new(YearMonth::new(2026, 1).unwrap(), 12).unwrap();
        let engine = ValuationEngine::new(&timeline);
        let exit = ExitStrategy::DirectEntry { price: 1_000_000.0, hold_months: 12 };
        let noi = CashFlowSeries::zeros(12);
        let disposition = engine.disposition(&exit, &noi);
        assert_eq!(disposition.gross_sale_proceeds, 1_000_000.0);
        assert!((disposition.transaction_costs - 15_000.0).abs() < 1e-6);
    }
}
