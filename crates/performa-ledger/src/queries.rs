//! Canonical ledger aggregations.
//!
//! Every query here is defined by a filter on `flow_purpose` plus optional
//! category/subcategory constraints — never by arithmetic across other
//! queries. Computing e.g. `levered_cf = project_cf + debt_draws +
//! debt_service` double-counts when LTC != 100% or refinancings occur;
//! `levered_cash_flow` is defined by sign-flipping `equity_partner_flows`.

use std::collections::HashMap;

use performa_core::error::{PerformaError, PerformaResult};
use performa_core::series::CashFlowSeries;
use uuid::Uuid;

use crate::ledger::Ledger;
use crate::record::TransactionRecord;
use crate::taxonomy::{Category, FlowPurpose, Subcategory};

/// Canonical read side of a [`Ledger`]: every reported metric is a
/// composition of these methods, never of raw ledger arithmetic.
pub struct LedgerQueries<'a> {
    ledger: &'a Ledger,
}

impl<'a> LedgerQueries<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    fn aligned_sum(&self, predicate: impl Fn(&TransactionRecord) -> bool) -> CashFlowSeries {
        let timeline = self.ledger.timeline();
        let mut values = vec![0.0; timeline.length()];
        for record in self.ledger.records() {
            if predicate(record) {
                if let Some(idx) = timeline.index_of(record.date) {
                    values[idx] += record.amount;
                }
            }
        }
        CashFlowSeries::new(values)
    }

    /// `purpose=Operating ∧ category=Revenue ∧ sub∈{Lease, Misc, Recovery}`.
    pub fn gross_revenue(&self) -> CashFlowSeries {
        self.aligned_sum(|r| {
            r.flow_purpose == FlowPurpose::Operating
                && r.category == Category::Revenue
                && matches!(
                    r.subcategory,
                    Subcategory::Lease | Subcategory::Misc | Subcategory::Recovery
                )
        })
    }

    /// `purpose=Operating ∧ category=Expense ∧ sub=OpEx`.
    pub fn opex(&self) -> CashFlowSeries {
        self.aligned_sum(|r| {
            r.flow_purpose == FlowPurpose::Operating
                && r.category == Category::Expense
                && r.subcategory == Subcategory::OpEx
        })
    }

    /// `purpose=Operating`.
    pub fn noi(&self) -> CashFlowSeries {
        self.aligned_sum(|r| r.flow_purpose == FlowPurpose::Operating)
    }

    /// Alias of [`Self::noi`] — no recurring CapEx distinct from OpEx is
    /// modeled, per the Operating-by-default rule for `Expense/CapEx`.
    pub fn operational_cash_flow(&self) -> CashFlowSeries {
        self.noi()
    }

    /// `purpose=CapitalUse` (includes capitalized interest).
    pub fn capital_uses(&self) -> CashFlowSeries {
        self.aligned_sum(|r| r.flow_purpose == FlowPurpose::CapitalUse)
    }

    /// `purpose=CapitalSource`.
    pub fn capital_sources(&self) -> CashFlowSeries {
        self.aligned_sum(|r| r.flow_purpose == FlowPurpose::CapitalSource)
    }

    /// `category=Financing ∧ sub∈{Loan Proceeds, Refinancing Proceeds}`.
    pub fn debt_draws(&self) -> CashFlowSeries {
        self.aligned_sum(|r| {
            r.category == Category::Financing
                && matches!(
                    r.subcategory,
                    Subcategory::LoanProceeds | Subcategory::RefinancingProceeds
                )
        })
    }

    /// `category=Financing ∧ sub∈{Interest Payment, Principal Payment,
    /// Refinancing Payoff, Prepayment}`. Excludes capitalized interest
    /// (`Interest Reserve`), which lives in [`Self::capital_uses`].
    pub fn debt_service(&self) -> CashFlowSeries {
        self.aligned_sum(|r| {
            r.category == Category::Financing
                && matches!(
                    r.subcategory,
                    Subcategory::InterestPayment
                        | Subcategory::PrincipalPayment
                        | Subcategory::RefinancingPayoff
                        | Subcategory::Prepayment
                )
        })
    }

    /// `sub=Equity Contribution`.
    pub fn equity_contributions(&self) -> CashFlowSeries {
        self.aligned_sum(|r| r.subcategory == Subcategory::EquityContribution)
    }

    /// `sub∈{Equity Distribution, Preferred Return, Promote}`.
    pub fn equity_distributions(&self) -> CashFlowSeries {
        self.aligned_sum(|r| {
            matches!(
                r.subcategory,
                Subcategory::EquityDistribution | Subcategory::PreferredReturn | Subcategory::Promote
            )
        })
    }

    /// Union of [`Self::equity_contributions`] and [`Self::equity_distributions`].
    pub fn equity_partner_flows(&self) -> CashFlowSeries {
        self.equity_contributions().elementwise_add(&self.equity_distributions())
    }

    /// `purpose∈{Operating, CapitalUse} ∪ (CapitalSource ∧ sub=Sale)` — the
    /// unlevered project cash flow.
    pub fn project_cash_flow(&self) -> CashFlowSeries {
        self.aligned_sum(|r| {
            matches!(r.flow_purpose, FlowPurpose::Operating | FlowPurpose::CapitalUse)
                || (r.flow_purpose == FlowPurpose::CapitalSource && r.subcategory == Subcategory::Sale)
        })
    }

    /// `sub=Cash Sweep Deposit`.
    pub fn sweep_deposits(&self) -> CashFlowSeries {
        self.aligned_sum(|r| r.subcategory == Subcategory::CashSweepDeposit)
    }

    /// `sub=Cash Sweep Release`.
    pub fn sweep_releases(&self) -> CashFlowSeries {
        self.aligned_sum(|r| r.subcategory == Subcategory::CashSweepRelease)
    }

    /// `sub=Sweep Prepayment`.
    pub fn sweep_prepayments(&self) -> CashFlowSeries {
        self.aligned_sum(|r| r.subcategory == Subcategory::SweepPrepayment)
    }

    /// Investor-perspective levered cash flow: the sign-flip of
    /// [`Self::equity_partner_flows`]. Never computed as
    /// `project_cash_flow + debt_draws + debt_service` — see the module
    /// doc comment.
    pub fn levered_cash_flow(&self) -> CashFlowSeries {
        -&self.equity_partner_flows()
    }

    /// Alias of [`Self::levered_cash_flow`], exactly equal.
    pub fn equity_cash_flow(&self) -> CashFlowSeries {
        self.levered_cash_flow()
    }

    /// All records tagged with `entity_id`, e.g. a single partner or
    /// facility.
    pub fn by_entity(&self, entity_id: Uuid) -> CashFlowSeries {
        self.aligned_sum(|r| r.entity_id == Some(entity_id))
    }

    /// Total debits/credits per category — presentation sugar over the
    /// canonical filters above, not a new source of truth for aggregation.
    pub fn summary(&self) -> HashMap<Category, f64> {
        let mut totals = HashMap::new();
        for record in self.ledger.records() {
            *totals.entry(record.category).or_insert(0.0) += record.amount;
        }
        totals
    }
}

/// Parse a small conjunctive filter expression (`field=value,field=value`)
/// into a predicate over [`TransactionRecord`]s. Supported fields:
/// `category`, `subcategory`, `flow_purpose`, `entity_id`.
pub(crate) fn parse_query_expr(
    expr: &str,
) -> PerformaResult<Box<dyn Fn(&TransactionRecord) -> bool>> {
    let mut clauses: Vec<Box<dyn Fn(&TransactionRecord) -> bool>> = Vec::new();

    for clause in expr.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let (field, value) = clause
            .split_once('=')
            .ok_or_else(|| PerformaError::query(format!("malformed clause '{clause}'")))?;
        let field = field.trim();
        let value = value.trim();

        match field {
            "category" => {
                let category = parse_category(value)?;
                clauses.push(Box::new(move |r: &TransactionRecord| r.category == category));
            }
            "subcategory" => {
                let subcategory = parse_subcategory(value)?;
                clauses.push(Box::new(move |r: &TransactionRecord| {
                    r.subcategory == subcategory
                }));
            }
            "flow_purpose" => {
                let purpose = parse_flow_purpose(value)?;
                clauses.push(Box::new(move |r: &TransactionRecord| {
                    r.flow_purpose == purpose
                }));
            }
            "entity_id" => {
                let entity_id: Uuid = value
                    .parse()
                    .map_err(|_| PerformaError::query(format!("invalid entity_id '{value}'")))?;
                clauses.push(Box::new(move |r: &TransactionRecord| {
                    r.entity_id == Some(entity_id)
                }));
            }
            other => return Err(PerformaError::query(format!("unknown query field '{other}'"))),
        }
    }

    Ok(Box::new(move |r: &TransactionRecord| {
        clauses.iter().all(|clause| clause(r))
    }))
}

fn parse_category(value: &str) -> PerformaResult<Category> {
    [
        Category::Revenue,
        Category::Expense,
        Category::Capital,
        Category::Financing,
        Category::Valuation,
    ]
    .into_iter()
    .find(|c| c.as_str() == value)
    .ok_or_else(|| PerformaError::query(format!("unknown category '{value}'")))
}

fn parse_flow_purpose(value: &str) -> PerformaResult<FlowPurpose> {
    [
        FlowPurpose::Operating,
        FlowPurpose::CapitalUse,
        FlowPurpose::CapitalSource,
        FlowPurpose::FinancingService,
        FlowPurpose::Valuation,
    ]
    .into_iter()
    .find(|p| p.as_str() == value)
    .ok_or_else(|| PerformaError::query(format!("unknown flow_purpose '{value}'")))
}

fn parse_subcategory(value: &str) -> PerformaResult<Subcategory> {
    use Subcategory::*;
    const ALL: &[Subcategory] = &[
        Lease,
        Misc,
        Recovery,
        Sale,
        VacancyLoss,
        CreditLoss,
        Abatement,
        SecurityDeposit,
        OpEx,
        CapEx,
        PurchasePrice,
        ClosingCosts,
        DueDiligence,
        HardCosts,
        SoftCosts,
        SiteWork,
        TransactionCosts,
        Other,
        LoanProceeds,
        RefinancingProceeds,
        PrincipalPayment,
        InterestPayment,
        InterestReserve,
        Prepayment,
        RefinancingPayoff,
        EquityContribution,
        EquityDistribution,
        PreferredReturn,
        Promote,
        OriginationFee,
        ExitFee,
        PrepaymentPenalty,
        CashSweepDeposit,
        CashSweepRelease,
        SweepPrepayment,
        AssetValuation,
        ComparableSales,
        Dcf,
        DirectCap,
        CostApproach,
        BrokerOpinion,
    ];
    ALL.iter()
        .copied()
        .find(|s| s.as_str() == value)
        .ok_or_else(|| PerformaError::query(format!("unknown subcategory '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use crate::record::{TransactionMetadata, TransactionRecord};
    use performa_core::timeline::{Timeline, YearMonth};

    fn ledger_with_operating_and_capital() -> Ledger {
        let mut ledger = Ledger::new(Timeline::new(YearMonth::new(2026, 1).unwrap(), 3).unwrap());
        let revenue_meta = TransactionMetadata {
            category: Category::Revenue,
            subcategory: Subcategory::Lease,
            item_name: "rent".into(),
            source_id: Uuid::new_v4(),
            asset_id: Uuid::new_v4(),
            deal_id: None,
            entity_id: None,
            entity_type: None,
            pass_num: 1,
        };
        let capital_meta = TransactionMetadata {
            category: Category::Capital,
            subcategory: Subcategory::HardCosts,
            item_name: "construction".into(),
            source_id: Uuid::new_v4(),
            asset_id: Uuid::new_v4(),
            deal_id: None,
            entity_id: None,
            entity_type: None,
            pass_num: 1,
        };
        ledger
            .append(TransactionRecord::new(
                YearMonth::new(2026, 1).unwrap(),
                10_000.0,
                &revenue_meta,
            ))
            .unwrap();
        ledger
            .append(TransactionRecord::new(
                YearMonth::new(2026, 1).unwrap(),
                -50_000.0,
                &capital_meta,
            ))
            .unwrap();
        ledger
    }

    #[test]
    fn project_cash_flow_never_double_counts_sale_and_capital_use() {
        let ledger = ledger_with_operating_and_capital();
        let queries = LedgerQueries::new(&ledger);
        let project_cf = queries.project_cash_flow();
        let noi = queries.noi();
        let capital_uses = queries.capital_uses();
        assert!(project_cf.reconciles_with(&noi.elementwise_add(&capital_uses)));
    }

    #[test]
    fn levered_cash_flow_is_negated_equity_partner_flows() {
        let ledger = ledger_with_operating_and_capital();
        let queries = LedgerQueries::new(&ledger);
        assert!(queries
            .levered_cash_flow()
            .reconciles_with(&(-&queries.equity_partner_flows())));
    }

    #[test]
    fn query_expr_rejects_unknown_field() {
        assert!(parse_query_expr("foo=bar").is_err());
    }

    #[test]
    fn query_expr_filters_conjunctively() {
        let ledger = ledger_with_operating_and_capital();
        let matches = ledger.query("category=Capital,subcategory=Hard Costs").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].amount, -50_000.0);
    }
}
