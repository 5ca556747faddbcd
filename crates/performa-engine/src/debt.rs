//! Debt facility processing: construction draws, capitalized interest, cash
//! sweeps, permanent refinancing and amortization, and final payoff.

use performa_core::error::{PerformaError, PerformaResult};
use performa_core::series::CashFlowSeries;
use performa_core::timeline::Timeline;
use performa_ledger::{Category, Ledger, LedgerQueries, Subcategory, TransactionMetadata};
use performa_types::{
    CashSweep, ConstructionFacility, Facility, InterestMethod, PermanentFacility, PermanentSizing,
    SweepMode,
};
use uuid::Uuid;

/// Processes a deal's ordered facility list against the project cash flow
/// already committed to the ledger, posting draws, interest, sweeps, and
/// amortization as it goes.
pub struct DebtAnalyzer<'a> {
    timeline: &'a Timeline,
}

impl<'a> DebtAnalyzer<'a> {
    pub fn new(timeline: &'a Timeline) -> Self {
        Self { timeline }
    }

    /// Run every facility in `facilities` against `ledger`, in order.
    pub fn process(
        &self,
        ledger: &mut Ledger,
        facilities: &[Facility],
        asset_id: Uuid,
        exit_month_idx: usize,
    ) -> PerformaResult<()> {
        let has_permanent_takeout = facilities.iter().any(|f| matches!(f, Facility::Permanent(_)));
        for (pass_offset, facility) in facilities.iter().enumerate() {
            let pass_num = 10 + pass_offset as u8;
            match facility {
                Facility::Construction(c) => self.process_construction(
                    ledger,
                    c,
                    asset_id,
                    pass_num,
                    exit_month_idx,
                    has_permanent_takeout,
                )?,
                Facility::Permanent(p) => {
                    self.process_permanent(ledger, p, asset_id, pass_num, exit_month_idx)?
                }
            }
        }
        Ok(())
    }

    /// `has_permanent_takeout` is true when some facility in the same deal's
    /// list is a [`Facility::Permanent`] — it's that facility's refinancing
    /// proceeds, not this one, that's expected to pay this balance off. When
    /// no such facility exists, a balance still outstanding at
    /// `exit_month_idx` is paid off here instead of left stranded.
    fn process_construction(
        &self,
        ledger: &mut Ledger,
        facility: &ConstructionFacility,
        asset_id: Uuid,
        pass_num: u8,
        exit_month_idx: usize,
        has_permanent_takeout: bool,
    ) -> PerformaResult<()> {
        if facility.interest_method == InterestMethod::Iterative {
            return Err(PerformaError::config(format!(
                "facility '{}': Iterative interest method is not implemented",
                facility.name
            )));
        }

        let length = self.timeline.length();
        let queries = LedgerQueries::new(ledger);
        let capital_uses = queries.capital_uses();

        let mut draws = vec![0.0; length];
        let mut cumulative_project_cost = 0.0;
        let mut cumulative_draws = 0.0;
        let mut balance = 0.0;
        let monthly_rate = facility.rate / 12.0;
        let mut interest_reserve = vec![0.0; length];
        let mut interest_payments = vec![0.0; length];
        let mut balance_at_exit = 0.0;

        for month_idx in 0..length {
            cumulative_project_cost += -capital_uses.as_slice().get(month_idx).copied().unwrap_or(0.0);

            let accrued_interest = balance * monthly_rate;
            match facility.interest_method {
                InterestMethod::None => {}
                InterestMethod::Simple | InterestMethod::Scheduled => {
                    interest_reserve[month_idx] = -accrued_interest;
                    balance += accrued_interest;
                }
                InterestMethod::Iterative => unreachable!("rejected above"),
            }
            if facility.interest_method == InterestMethod::Simple {
                interest_payments[month_idx] = -accrued_interest;
                interest_reserve[month_idx] = 0.0;
                balance -= accrued_interest;
            }

            let max_balance = facility.ltc_threshold * cumulative_project_cost;
            let draw_need = (-capital_uses.as_slice().get(month_idx).copied().unwrap_or(0.0)).max(0.0);
            let room = (max_balance - cumulative_draws).max(0.0);
            let draw = draw_need.min(room);
            if draw > 0.0 {
                draws[month_idx] = draw;
                cumulative_draws += draw;
                balance += draw;
            }

            if month_idx == exit_month_idx {
                balance_at_exit = balance;
            }
        }

        let mut payoff = vec![0.0; length];
        if !has_permanent_takeout && balance_at_exit > 0.0 && exit_month_idx < length {
            payoff[exit_month_idx] = -balance_at_exit;
        }

        let draw_series = CashFlowSeries::new(draws);
        ledger.transaction(|scope| {
            scope.append_series(
                &draw_series,
                &TransactionMetadata {
                    category: Category::Financing,
                    subcategory: Subcategory::LoanProceeds,
                    item_name: format!("{} Draws", facility.name),
                    source_id: facility.id,
                    asset_id,
                    deal_id: None,
                    entity_id: Some(facility.id),
                    entity_type: Some("Construction Facility".into()),
                    pass_num,
                },
            )?;
            if facility.origination_fee_pct > 0.0 {
                let fee = -draw_series.total() * facility.origination_fee_pct;
                let mut fee_values = vec![0.0; length];
                fee_values[0] = fee;
                scope.append_series(
                    &CashFlowSeries::new(fee_values),
                    &TransactionMetadata {
                        category: Category::Financing,
                        subcategory: Subcategory::OriginationFee,
                        item_name: format!("{} Origination Fee", facility.name),
                        source_id: facility.id,
                        asset_id,
                        deal_id: None,
                        entity_id: Some(facility.id),
                        entity_type: Some("Construction Facility".into()),
                        pass_num,
                    },
                )?;
            }
            match facility.interest_method {
                InterestMethod::Simple => {
                    scope.append_series(
                        &CashFlowSeries::new(interest_payments),
                        &TransactionMetadata {
                            category: Category::Financing,
                            subcategory: Subcategory::InterestPayment,
                            item_name: format!("{} Interest", facility.name),
                            source_id: facility.id,
                            asset_id,
                            deal_id: None,
                            entity_id: Some(facility.id),
                            entity_type: Some("Construction Facility".into()),
                            pass_num,
                        },
                    )?;
                }
                InterestMethod::Scheduled => {
                    scope.append_series(
                        &CashFlowSeries::new(interest_reserve),
                        &TransactionMetadata {
                            category: Category::Financing,
                            subcategory: Subcategory::InterestReserve,
                            item_name: format!("{} Capitalized Interest", facility.name),
                            source_id: facility.id,
                            asset_id,
                            deal_id: None,
                            entity_id: Some(facility.id),
                            entity_type: Some("Construction Facility".into()),
                            pass_num,
                        },
                    )?;
                }
                InterestMethod::None | InterestMethod::Iterative => {}
            }
            scope.append_series(
                &CashFlowSeries::new(payoff),
                &TransactionMetadata {
                    category: Category::Financing,
                    subcategory: Subcategory::Prepayment,
                    item_name: format!("{} Payoff", facility.name),
                    source_id: facility.id,
                    asset_id,
                    deal_id: None,
                    entity_id: Some(facility.id),
                    entity_type: Some("Construction Facility".into()),
                    pass_num,
                },
            )?;
            Ok(())
        })?;

        if let Some(sweep) = &facility.cash_sweep {
            self.process_cash_sweep(ledger, facility, sweep, asset_id, pass_num)?;
        }

        Ok(())
    }

    fn process_cash_sweep(
        &self,
        ledger: &mut Ledger,
        facility: &ConstructionFacility,
        sweep: &CashSweep,
        asset_id: Uuid,
        pass_num: u8,
    ) -> PerformaResult<()> {
        let length = self.timeline.length();
        let queries = LedgerQueries::new(ledger);
        let project_cf = queries.project_cash_flow();
        let sweep_end = (sweep.end_month as usize).min(length);

        let mut deposits = vec![0.0; length];
        let mut releases = vec![0.0; length];
        let mut prepayments = vec![0.0; length];

        for month_idx in 0..sweep_end {
            let excess = project_cf.as_slice().get(month_idx).copied().unwrap_or(0.0).max(0.0);
            if excess <= 0.0 {
                continue;
            }
            match sweep.mode {
                SweepMode::Trap => deposits[month_idx] = -excess,
                SweepMode::Prepay => prepayments[month_idx] = -excess,
            }
        }

        if matches!(sweep.mode, SweepMode::Trap) && sweep_end < length {
            let trapped: f64 = deposits.iter().sum::<f64>().abs();
            if trapped > 0.0 {
                releases[sweep_end] = trapped;
            }
        }

        ledger.transaction(|scope| {
            scope.append_series(
                &CashFlowSeries::new(deposits),
                &TransactionMetadata {
                    category: Category::Financing,
                    subcategory: Subcategory::CashSweepDeposit,
                    item_name: format!("{} Cash Sweep", facility.name),
                    source_id: facility.id,
                    asset_id,
                    deal_id: None,
                    entity_id: Some(facility.id),
                    entity_type: Some("Construction Facility".into()),
                    pass_num,
                },
            )?;
            scope.append_series(
                &CashFlowSeries::new(releases),
                &TransactionMetadata {
                    category: Category::Financing,
                    subcategory: Subcategory::CashSweepRelease,
                    item_name: format!("{} Cash Sweep Release", facility.name),
                    source_id: facility.id,
                    asset_id,
                    deal_id: None,
                    entity_id: Some(facility.id),
                    entity_type: Some("Construction Facility".into()),
                    pass_num,
                },
            )?;
            scope.append_series(
                &CashFlowSeries::new(prepayments),
                &TransactionMetadata {
                    category: Category::Financing,
                    subcategory: Subcategory::SweepPrepayment,
                    item_name: format!("{} Sweep Prepayment", facility.name),
                    source_id: facility.id,
                    asset_id,
                    deal_id: None,
                    entity_id: Some(facility.id),
                    entity_type: Some("Construction Facility".into()),
                    pass_num,
                },
            )?;
            Ok(())
        })
    }

    /// The property value the `ValuationEngine` already posted for month
    /// `idx`, read off the ledger's `Valuation`-category records rather than
    /// recomputed from a hardcoded cap rate.
    fn property_value_at(&self, ledger: &Ledger, idx: usize) -> f64 {
        let records = ledger.query("category=Valuation").unwrap_or_default();
        records
            .iter()
            .find(|r| self.timeline.index_of(r.date) == Some(idx))
            .map(|r| r.amount)
            .unwrap_or(0.0)
    }

    fn process_permanent(
        &self,
        ledger: &mut Ledger,
        facility: &PermanentFacility,
        asset_id: Uuid,
        pass_num: u8,
        exit_month_idx: usize,
    ) -> PerformaResult<()> {
        let length = self.timeline.length();
        let refi_idx = (facility.refinance_month as usize).min(length.saturating_sub(1));

        let principal = match facility.sizing {
            PermanentSizing::Ltv { loan_to_value } => {
                self.property_value_at(ledger, refi_idx) * loan_to_value
            }
            PermanentSizing::ExplicitAmount { amount } => amount,
        };

        let monthly_rate = facility.rate / 12.0;
        let amort_months = facility.amortization_months.max(1) as f64;
        let level_payment = if monthly_rate > 0.0 {
            principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powf(-amort_months))
        } else {
            principal / amort_months
        };

        let payoff_idx = (refi_idx + facility.term_months as usize).min(exit_month_idx);

        let mut proceeds = vec![0.0; length];
        let mut interest = vec![0.0; length];
        let mut principal_payments = vec![0.0; length];
        let mut refinancing_payoff = vec![0.0; length];
        let mut prepayment_payoff = vec![0.0; length];

        // A payoff at the deal's own exit month is a sale-driven prepayment;
        // anywhere else along the term it's this facility itself being
        // refinanced away.
        let payoff_is_exit = payoff_idx == exit_month_idx;

        proceeds[refi_idx] = principal;

        let mut balance = principal;
        for month_idx in (refi_idx + 1)..=payoff_idx.min(length - 1) {
            if balance <= 0.0 {
                break;
            }
            let interest_due = balance * monthly_rate;
            let mut principal_due = (level_payment - interest_due).max(0.0);
            if principal_due > balance {
                principal_due = balance;
            }
            interest[month_idx] = -interest_due;
            principal_payments[month_idx] = -principal_due;
            balance -= principal_due;

            if month_idx == payoff_idx && balance > 0.0 {
                if payoff_is_exit {
                    prepayment_payoff[month_idx] = -balance;
                } else {
                    refinancing_payoff[month_idx] = -balance;
                }
                balance = 0.0;
            }
        }

        ledger.transaction(|scope| {
            scope.append_series(
                &CashFlowSeries::new(proceeds),
                &TransactionMetadata {
                    category: Category::Financing,
                    subcategory: Subcategory::RefinancingProceeds,
                    item_name: format!("{} Proceeds", facility.name),
                    source_id: facility.id,
                    asset_id,
                    deal_id: None,
                    entity_id: Some(facility.id),
                    entity_type: Some("Permanent Facility".into()),
                    pass_num,
                },
            )?;
            scope.append_series(
                &CashFlowSeries::new(interest),
                &TransactionMetadata {
                    category: Category::Financing,
                    subcategory: Subcategory::InterestPayment,
                    item_name: format!("{} Interest", facility.name),
                    source_id: facility.id,
                    asset_id,
                    deal_id: None,
                    entity_id: Some(facility.id),
                    entity_type: Some("Permanent Facility".into()),
                    pass_num,
                },
            )?;
            scope.append_series(
                &CashFlowSeries::new(principal_payments),
                &TransactionMetadata {
                    category: Category::Financing,
                    subcategory: Subcategory::PrincipalPayment,
                    item_name: format!("{} Amortization", facility.name),
                    source_id: facility.id,
                    asset_id,
                    deal_id: None,
                    entity_id: Some(facility.id),
                    entity_type: Some("Permanent Facility".into()),
                    pass_num,
                },
            )?;
            scope.append_series(
                &CashFlowSeries::new(refinancing_payoff),
                &TransactionMetadata {
                    category: Category::Financing,
                    subcategory: Subcategory::RefinancingPayoff,
                    item_name: format!("{} Payoff", facility.name),
                    source_id: facility.id,
                    asset_id,
                    deal_id: None,
                    entity_id: Some(facility.id),
                    entity_type: Some("Permanent Facility".into()),
                    pass_num,
                },
            )?;
            scope.append_series(
                &CashFlowSeries::new(prepayment_payoff),
                &TransactionMetadata {
                    category: Category::Financing,
                    subcategory: Subcategory::Prepayment,
                    item_name: format!("{} Payoff", facility.name),
                    source_id: facility.id,
                    asset_id,
                    deal_id: None,
                    entity_id: Some(facility.id),
                    entity_type: Some("Permanent Facility".into()),
                    pass_num,
                },
            )?;
            Ok(())
        })?;

        tracing::info!(facility = %facility.name, principal, "refinanced with permanent facility");
        Ok(())
    }
}
