//! Funds each month's capital uses from available capital sources before
//! falling back to partner equity, per the deal's funding priority.

use std::collections::HashMap;

use performa_core::error::PerformaResult;
use performa_core::series::CashFlowSeries;
use performa_core::timeline::Timeline;
use performa_ledger::{Category, Ledger, LedgerQueries, Subcategory, TransactionMetadata};
use performa_types::Partnership;
use uuid::Uuid;

/// Posts each month's equity contribution needed to cover capital uses not
/// already funded by debt draws or a prior equity-first pass, split
/// pro-rata by `share_of_equity`.
pub struct CashFlowEngine<'a> {
    timeline: &'a Timeline,
}

impl<'a> CashFlowEngine<'a> {
    pub fn new(timeline: &'a Timeline) -> Self {
        Self { timeline }
    }

    /// Equity-first funding pass: draws each partner's committed capital
    /// against capital uses, pro-rata by the capital each partner still has
    /// left to commit, up to (but never past) `committed_capital`. Callers
    /// using `FundingPriority::EquityFirst` run this before
    /// `DebtAnalyzer::process` so equity is exhausted before debt sizing;
    /// [`Self::fund`] still runs afterward as a policy-agnostic top-up for
    /// whatever capital uses equity and debt together didn't cover.
    pub fn fund_equity_first(
        &self,
        ledger: &mut Ledger,
        partnership: &Partnership,
        asset_id: Uuid,
        pass_num: u8,
    ) -> PerformaResult<()> {
        let length = self.timeline.length();
        let queries = LedgerQueries::new(ledger);
        let capital_uses = queries.capital_uses();

        let mut remaining_committed: HashMap<Uuid, f64> = partnership
            .partners
            .iter()
            .map(|p| (p.id, p.committed_capital))
            .collect();
        let mut contributions: HashMap<Uuid, Vec<f64>> =
            partnership.partners.iter().map(|p| (p.id, vec![0.0; length])).collect();

        for month_idx in 0..length {
            let need = (-capital_uses.as_slice().get(month_idx).copied().unwrap_or(0.0)).max(0.0);
            if need <= 0.0 {
                continue;
            }
            let available: f64 = remaining_committed.values().sum();
            if available <= 0.0 {
                continue;
            }
            let funded = need.min(available);
            for partner in &partnership.partners {
                let cap = remaining_committed[&partner.id];
                if cap <= 0.0 {
                    continue;
                }
                let share = funded * (cap / available);
                remaining_committed.insert(partner.id, cap - share);
                contributions.get_mut(&partner.id).unwrap()[month_idx] += share;
            }
        }

        ledger.transaction(|scope| {
            for partner in &partnership.partners {
                scope.append_series(
                    &CashFlowSeries::new(contributions[&partner.id].clone()),
                    &TransactionMetadata {
                        category: Category::Financing,
                        subcategory: Subcategory::EquityContribution,
                        item_name: format!("{} Equity Contribution", partner.name),
                        source_id: partner.id,
                        asset_id,
                        deal_id: None,
                        entity_id: Some(partner.id),
                        entity_type: Some(partner.entity_type.clone()),
                        pass_num,
                    },
                )?;
            }
            Ok(())
        })
    }

    /// Run the funding cascade against `ledger`'s already-posted capital
    /// uses, debt draws, and any equity already contributed by
    /// [`Self::fund_equity_first`], posting one `Equity Contribution`
    /// record per partner per remaining funding month.
    pub fn fund(
        &self,
        ledger: &mut Ledger,
        partnership: &Partnership,
        asset_id: Uuid,
        pass_num: u8,
    ) -> PerformaResult<()> {
        let length = self.timeline.length();
        let queries = LedgerQueries::new(ledger);
        let capital_uses = queries.capital_uses();
        let debt_draws = queries.debt_draws();
        let equity_contributed = queries.equity_contributions();

        let shortfall: Vec<f64> = (0..length)
            .map(|idx| {
                let uses = -capital_uses.as_slice().get(idx).copied().unwrap_or(0.0);
                let draws = debt_draws.as_slice().get(idx).copied().unwrap_or(0.0);
                let already_funded = equity_contributed.as_slice().get(idx).copied().unwrap_or(0.0);
                (uses - draws - already_funded).max(0.0)
            })
            .collect();

        ledger.transaction(|scope| {
            for partner in &partnership.partners {
                let values: Vec<f64> = shortfall.iter().map(|s| s * partner.share_of_equity).collect();
                scope.append_series(
                    &CashFlowSeries::new(values),
                    &TransactionMetadata {
                        category: Category::Financing,
                        subcategory: Subcategory::EquityContribution,
                        item_name: format!("{} Equity Contribution", partner.name),
                        source_id: partner.id,
                        asset_id,
                        deal_id: None,
                        entity_id: Some(partner.id),
                        entity_type: Some(partner.entity_type.clone()),
                        pass_num,
                    },
                )?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use performa_core::timeline::YearMonth;
    use performa_ledger::{Category as Cat, Subcategory as Sub, TransactionMetadata as Meta};
    use performa_types::Partner;

    #[test]
    fn shortfall_is_split_pro_rata_by_equity_share() {
        let timeline = Timeline::new(YearMonth::new(2026, 1).unwrap(), 3).unwrap();
        let mut ledger = Ledger::new(timeline.clone());
        ledger
            .append_series(
                &CashFlowSeries::new(vec![-1_000.0, 0.0, 0.0]),
                &Meta {
                    category: Cat::Capital,
                    subcategory: Sub::HardCosts,
                    item_name: "costs".into(),
                    source_id: Uuid::new_v4(),
                    asset_id: Uuid::new_v4(),
                    deal_id: None,
                    entity_id: None,
                    entity_type: None,
                    pass_num: 1,
                },
            )
            .unwrap();

        let partnership = Partnership {
            partners: vec![
                Partner {
                    id: Uuid::new_v4(),
                    name: "GP".into(),
                    entity_type: "GP".into(),
                    share_of_equity: 0.2,
                    committed_capital: 200.0,
                },
                Partner {
                    id: Uuid::new_v4(),
                    name: "LP".into(),
                    entity_type: "LP".into(),
                    share_of_equity: 0.8,
                    committed_capital: 800.0,
                },
            ],
            waterfall: vec![],
        };

        let engine = CashFlowEngine::new(&timeline);
        engine.fund(&mut ledger, &partnership, Uuid::new_v4(), 5).unwrap();

        let queries = LedgerQueries::new(&ledger);
        assert!((queries.equity_contributions().total() - 1_000.0).abs() < 1e-6);
    }
}
