//! The IRR-hurdle distribution waterfall: turns each month's distributable
//! cash into per-partner `Equity Distribution` / `Preferred Return` /
//! `Promote` postings, tier by tier, top to bottom.

use std::collections::HashMap;

use performa_core::error::PerformaResult;
use performa_core::irr::irr_annualized;
use performa_core::series::CashFlowSeries;
use performa_core::timeline::Timeline;
use performa_ledger::{Category, Ledger, LedgerQueries, Subcategory, TransactionMetadata};
use performa_types::{Partner, Partnership, Tier};
use uuid::Uuid;

/// Bisection tolerance on the split amount itself, in dollars.
const SPLIT_AMOUNT_TOLERANCE: f64 = 0.01;
/// Bisection tolerance on the LP's annualized IRR, as a decimal rate.
const SPLIT_IRR_TOLERANCE: f64 = 1e-7;
const SPLIT_MAX_ITERATIONS: u32 = 100;

/// Executes a deal's waterfall against the cash the ledger has already
/// committed for the month (operations, debt service, sweeps, disposition).
pub struct PartnershipAnalyzer<'a> {
    timeline: &'a Timeline,
}

/// Per-partner running balances carried across the waterfall's monthly loop.
struct PartnerState {
    remaining_capital: f64,
    preferred_accrued: f64,
    preferred_paid_total: f64,
    catchup_paid_total: f64,
}

impl<'a> PartnershipAnalyzer<'a> {
    pub fn new(timeline: &'a Timeline) -> Self {
        Self { timeline }
    }

    /// The cash available to equity each month: project cash flow plus debt
    /// draws, less debt service and sweep deposits, plus sweep releases and
    /// net of financing fees not already captured by `debt_service`.
    fn distributable_cash_flow(&self, ledger: &Ledger) -> CashFlowSeries {
        let queries = LedgerQueries::new(ledger);
        let project_cf = queries.project_cash_flow();
        let draws = queries.debt_draws();
        let service = queries.debt_service();
        let sweep_deposits = queries.sweep_deposits();
        let sweep_releases = queries.sweep_releases();

        let fee_records = ledger
            .query("subcategory=Origination Fee")
            .unwrap_or_default();
        let mut fees = vec![0.0; self.timeline.length()];
        for record in fee_records {
            if let Some(idx) = self.timeline.index_of(record.date) {
                fees[idx] += record.amount;
            }
        }
        let fees = CashFlowSeries::new(fees);

        project_cf
            .elementwise_add(&draws)
            .elementwise_add(&service)
            .elementwise_add(&sweep_releases)
            .elementwise_add(&sweep_deposits)
            .elementwise_add(&fees)
    }

    /// Run the waterfall and post every tier's distributions.
    pub fn distribute(
        &self,
        ledger: &mut Ledger,
        partnership: &Partnership,
        asset_id: Uuid,
        pass_num: u8,
    ) -> PerformaResult<()> {
        let length = self.timeline.length();
        let distributable = self.distributable_cash_flow(ledger);

        // Contributions already posted by the funding cascade, combined
        // across every LP, by month. This function's own postings land in
        // one transaction at the end, so querying `by_entity` here sees
        // only contributions, never a prior call's distributions.
        let lp_contributions: Vec<f64> = {
            let queries = LedgerQueries::new(ledger);
            let mut values = vec![0.0; length];
            for partner in partnership.partners.iter().filter(|p| !p.entity_type.eq_ignore_ascii_case("GP")) {
                let series = queries.by_entity(partner.id);
                for (month_idx, value) in values.iter_mut().enumerate() {
                    *value += series.as_slice().get(month_idx).copied().unwrap_or(0.0);
                }
            }
            values
        };

        let mut states: HashMap<Uuid, PartnerState> = partnership
            .partners
            .iter()
            .map(|p| {
                (
                    p.id,
                    PartnerState {
                        remaining_capital: p.committed_capital,
                        preferred_accrued: 0.0,
                        preferred_paid_total: 0.0,
                        catchup_paid_total: 0.0,
                    },
                )
            })
            .collect();

        let mut equity_distribution: HashMap<Uuid, Vec<f64>> =
            partnership.partners.iter().map(|p| (p.id, vec![0.0; length])).collect();
        let mut preferred_distribution: HashMap<Uuid, Vec<f64>> =
            partnership.partners.iter().map(|p| (p.id, vec![0.0; length])).collect();
        let mut promote_distribution: HashMap<Uuid, Vec<f64>> =
            partnership.partners.iter().map(|p| (p.id, vec![0.0; length])).collect();

        let gp = partnership
            .partners
            .iter()
            .find(|p| p.entity_type.eq_ignore_ascii_case("GP"));

        for month_idx in 0..length {
            let mut remaining_cash = distributable.as_slice().get(month_idx).copied().unwrap_or(0.0).max(0.0);
            if remaining_cash <= 0.0 {
                continue;
            }

            let last_tier_idx = partnership.waterfall.len().saturating_sub(1);
            for (tier_idx, tier) in partnership.waterfall.iter().enumerate() {
                if remaining_cash <= 1e-9 {
                    break;
                }
                match tier {
                    Tier::ReturnOfCapital => {
                        let total_remaining: f64 = states.values().map(|s| s.remaining_capital).sum();
                        if total_remaining <= 0.0 {
                            continue;
                        }
                        let tier_total = remaining_cash.min(total_remaining);
                        for partner in &partnership.partners {
                            let state = states.get_mut(&partner.id).unwrap();
                            if state.remaining_capital <= 0.0 {
                                continue;
                            }
                            let share = tier_total * (state.remaining_capital / total_remaining);
                            state.remaining_capital -= share;
                            equity_distribution.get_mut(&partner.id).unwrap()[month_idx] -= share;
                        }
                        remaining_cash -= tier_total;
                    }
                    Tier::PreferredReturn { pref_rate } => {
                        for state in states.values_mut() {
                            state.preferred_accrued += state.remaining_capital * (pref_rate / 12.0);
                        }
                        let total_accrued: f64 = states.values().map(|s| s.preferred_accrued).sum();
                        if total_accrued <= 0.0 {
                            continue;
                        }
                        let tier_total = remaining_cash.min(total_accrued);
                        for partner in &partnership.partners {
                            let state = states.get_mut(&partner.id).unwrap();
                            if state.preferred_accrued <= 0.0 {
                                continue;
                            }
                            let share = tier_total * (state.preferred_accrued / total_accrued);
                            state.preferred_accrued -= share;
                            state.preferred_paid_total += share;
                            preferred_distribution.get_mut(&partner.id).unwrap()[month_idx] -= share;
                        }
                        remaining_cash -= tier_total;
                    }
                    Tier::CatchUp { catch_up_pct } => {
                        let Some(gp) = gp else { continue };
                        let total_preferred_paid: f64 =
                            states.values().map(|s| s.preferred_paid_total).sum();
                        let total_catchup_paid: f64 = states.values().map(|s| s.catchup_paid_total).sum();
                        let gp_state = states.get(&gp.id).unwrap();
                        let gp_profit_paid = gp_state.preferred_paid_total + gp_state.catchup_paid_total;
                        let total_profit_paid = total_preferred_paid + total_catchup_paid;

                        if *catch_up_pct <= 0.0 || *catch_up_pct >= 1.0 {
                            continue;
                        }
                        let target = (catch_up_pct * total_profit_paid - gp_profit_paid) / (1.0 - catch_up_pct);
                        let tier_total = target.max(0.0).min(remaining_cash);
                        if tier_total <= 0.0 {
                            continue;
                        }
                        states.get_mut(&gp.id).unwrap().catchup_paid_total += tier_total;
                        promote_distribution.get_mut(&gp.id).unwrap()[month_idx] -= tier_total;
                        remaining_cash -= tier_total;
                    }
                    Tier::Split { gp_pct, lp_pct, hurdle_irr } => {
                        let total_pct = gp_pct + lp_pct;
                        if total_pct <= 0.0 {
                            continue;
                        }
                        // The last tier in the waterfall has nowhere to
                        // pass leftover cash to, so it absorbs whatever
                        // remains regardless of the LP's IRR; only a
                        // non-terminal Split tier gates its split on the
                        // hurdle via binary search.
                        let tier_total = if tier_idx == last_tier_idx {
                            remaining_cash
                        } else {
                            self.solve_split_tier_total(
                                partnership,
                                &lp_contributions,
                                &equity_distribution,
                                &preferred_distribution,
                                &promote_distribution,
                                month_idx,
                                *hurdle_irr,
                                *lp_pct,
                                total_pct,
                                remaining_cash,
                            )
                        };
                        for partner in &partnership.partners {
                            let pct = if partner.entity_type.eq_ignore_ascii_case("GP") {
                                gp_pct / total_pct
                            } else {
                                lp_pct / total_pct
                            };
                            let share = tier_total * pct * partner.share_of_equity
                                / partnership
                                    .partners
                                    .iter()
                                    .filter(|p| p.entity_type.eq_ignore_ascii_case(&partner.entity_type))
                                    .map(|p| p.share_of_equity)
                                    .sum::<f64>();
                            equity_distribution.get_mut(&partner.id).unwrap()[month_idx] -= share;
                        }
                        remaining_cash -= tier_total;
                    }
                }
            }
        }

        ledger.transaction(|scope| {
            for partner in &partnership.partners {
                self.post_partner_series(
                    scope,
                    partner,
                    &equity_distribution[&partner.id],
                    Subcategory::EquityDistribution,
                    "Equity Distribution",
                    asset_id,
                    pass_num,
                )?;
                self.post_partner_series(
                    scope,
                    partner,
                    &preferred_distribution[&partner.id],
                    Subcategory::PreferredReturn,
                    "Preferred Return",
                    asset_id,
                    pass_num,
                )?;
                self.post_partner_series(
                    scope,
                    partner,
                    &promote_distribution[&partner.id],
                    Subcategory::Promote,
                    "Promote",
                    asset_id,
                    pass_num,
                )?;
            }
            Ok(())
        })
    }

    /// Binary search on the total cash allocated to a non-terminal Split
    /// tier this month, so that the combined LP investor-perspective
    /// cumulative IRR lands on `hurdle_irr` (within `SPLIT_AMOUNT_TOLERANCE`
    /// dollars or `SPLIT_IRR_TOLERANCE` IRR) rather than consuming all of
    /// `remaining_cash` unconditionally.
    #[allow(clippy::too_many_arguments)]
    fn solve_split_tier_total(
        &self,
        partnership: &Partnership,
        lp_contributions: &[f64],
        equity_distribution: &HashMap<Uuid, Vec<f64>>,
        preferred_distribution: &HashMap<Uuid, Vec<f64>>,
        promote_distribution: &HashMap<Uuid, Vec<f64>>,
        month_idx: usize,
        hurdle_irr: f64,
        lp_pct: f64,
        total_pct: f64,
        remaining_cash: f64,
    ) -> f64 {
        let lp_irr_at = |tier_total: f64| -> f64 {
            let lp_candidate = tier_total * (lp_pct / total_pct);
            let series = self.lp_investor_cf_through(
                partnership,
                lp_contributions,
                equity_distribution,
                preferred_distribution,
                promote_distribution,
                month_idx,
                lp_candidate,
            );
            irr_annualized(&series)
        };

        if lp_irr_at(0.0) >= hurdle_irr {
            return 0.0;
        }
        if lp_irr_at(remaining_cash) <= hurdle_irr {
            return remaining_cash;
        }

        let mut lo = 0.0;
        let mut hi = remaining_cash;
        for _ in 0..SPLIT_MAX_ITERATIONS {
            let mid = (lo + hi) / 2.0;
            if (hi - lo) < SPLIT_AMOUNT_TOLERANCE {
                return mid;
            }
            let irr_mid = lp_irr_at(mid);
            if (irr_mid - hurdle_irr).abs() < SPLIT_IRR_TOLERANCE {
                return mid;
            }
            if irr_mid < hurdle_irr {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        (lo + hi) / 2.0
    }

    /// Combined LP investor-perspective cash flow through `month_idx`:
    /// negative on contribution, positive on every distribution posted so
    /// far this waterfall run, with `candidate_lp_amount` added as this
    /// month's not-yet-posted Split-tier distribution.
    #[allow(clippy::too_many_arguments)]
    fn lp_investor_cf_through(
        &self,
        partnership: &Partnership,
        lp_contributions: &[f64],
        equity_distribution: &HashMap<Uuid, Vec<f64>>,
        preferred_distribution: &HashMap<Uuid, Vec<f64>>,
        promote_distribution: &HashMap<Uuid, Vec<f64>>,
        month_idx: usize,
        candidate_lp_amount: f64,
    ) -> Vec<f64> {
        let lp_ids: Vec<Uuid> = partnership
            .partners
            .iter()
            .filter(|p| !p.entity_type.eq_ignore_ascii_case("GP"))
            .map(|p| p.id)
            .collect();

        (0..=month_idx)
            .map(|m| {
                let contribution = lp_contributions.get(m).copied().unwrap_or(0.0);
                let mut distributed_deal: f64 = lp_ids
                    .iter()
                    .map(|id| {
                        equity_distribution[id][m] + preferred_distribution[id][m] + promote_distribution[id][m]
                    })
                    .sum();
                if m == month_idx {
                    distributed_deal -= candidate_lp_amount;
                }
                -contribution - distributed_deal
            })
            .collect()
    }

    fn post_partner_series(
        &self,
        scope: &mut performa_ledger::TransactionScope<'_>,
        partner: &Partner,
        values: &[f64],
        subcategory: Subcategory,
        label: &str,
        asset_id: Uuid,
        pass_num: u8,
    ) -> PerformaResult<()> {
        if values.iter().all(|v| *v == 0.0) {
            return Ok(());
        }
        scope.append_series(
            &CashFlowSeries::new(values.to_vec()),
            &TransactionMetadata {
                category: Category::Financing,
                subcategory,
                item_name: format!("{} {}", partner.name, label),
                source_id: partner.id,
                asset_id,
                deal_id: None,
                entity_id: Some(partner.id),
                entity_type: Some(partner.entity_type.clone()),
                pass_num,
            },
        )
    }
}
