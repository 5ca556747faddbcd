//! The facade a caller of [`crate::analyze`] actually interacts with.

use std::collections::HashMap;

use performa_core::irr::{irr_annualized_with_basis, irr_monthly};
use performa_core::series::CashFlowSeries;
use performa_ledger::{Ledger, LedgerQueries, TransactionRecord};
use performa_types::{IrrAnnualizationBasis, Partner};
use uuid::Uuid;

/// IRR, equity multiple, and cash flow series for a single partner.
pub struct PartnerResult {
    pub partner_id: Uuid,
    pub name: String,
    pub cash_flow: CashFlowSeries,
    pub irr_annualized: f64,
    pub equity_multiple: f64,
}

/// The completed analysis of one deal: unlevered/levered cash flow, IRRs,
/// equity multiples, and per-partner results, all backed by the sealed
/// ledger underneath.
pub struct DealResults {
    ledger: Ledger,
    irr_annualization_basis: IrrAnnualizationBasis,
}

impl DealResults {
    pub fn new(ledger: Ledger, irr_annualization_basis: IrrAnnualizationBasis) -> Self {
        Self {
            ledger,
            irr_annualization_basis,
        }
    }

    fn annualize(&self, cash_flow: &[f64]) -> f64 {
        let simple = matches!(self.irr_annualization_basis, IrrAnnualizationBasis::Simple);
        irr_annualized_with_basis(cash_flow, simple)
    }

    /// Direct read access to the ledger's canonical queries, for callers
    /// that need a metric this facade doesn't expose directly.
    pub fn ledger_queries(&self) -> LedgerQueries<'_> {
        LedgerQueries::new(&self.ledger)
    }

    /// Every record the deal posted, for callers that need full
    /// traceability rather than an aggregate query.
    pub fn records(&self) -> &[TransactionRecord] {
        self.ledger.records()
    }

    pub fn unlevered_cash_flow(&self) -> CashFlowSeries {
        self.ledger_queries().project_cash_flow()
    }

    pub fn levered_cash_flow(&self) -> CashFlowSeries {
        self.ledger_queries().levered_cash_flow()
    }

    /// Identical to [`Self::levered_cash_flow`] — the investor-perspective
    /// view of the same series.
    pub fn equity_cash_flow(&self) -> CashFlowSeries {
        self.ledger_queries().equity_cash_flow()
    }

    pub fn unlevered_irr(&self) -> f64 {
        self.annualize(self.unlevered_cash_flow().as_slice())
    }

    pub fn levered_irr(&self) -> f64 {
        self.annualize(self.levered_cash_flow().as_slice())
    }

    pub fn equity_multiple(&self) -> f64 {
        equity_multiple_of(&self.levered_cash_flow())
    }

    /// Debt-service coverage ratio for each month debt service is owed;
    /// `None` where no debt service is due that month.
    pub fn dscr(&self) -> Vec<Option<f64>> {
        let queries = self.ledger_queries();
        let noi = queries.noi();
        let service = queries.debt_service();
        noi.iter()
            .zip(service.iter())
            .map(|(n, s)| if *s == 0.0 { None } else { Some(n / -s) })
            .collect()
    }

    /// IRR, equity multiple, and cash flow series for each partner.
    pub fn per_partner(&self, partners: &[Partner]) -> Vec<PartnerResult> {
        let queries = self.ledger_queries();
        partners
            .iter()
            .map(|partner| {
                let contributions = queries.by_entity(partner.id);
                let cash_flow = -&contributions;
                PartnerResult {
                    partner_id: partner.id,
                    name: partner.name.clone(),
                    irr_annualized: self.annualize(cash_flow.as_slice()),
                    equity_multiple: equity_multiple_of(&cash_flow),
                    cash_flow,
                }
            })
            .collect()
    }

    /// Per-category totals, for a quick headline summary of the deal.
    pub fn summary(&self) -> HashMap<performa_ledger::Category, f64> {
        self.ledger_queries().summary()
    }
}

fn equity_multiple_of(cash_flow: &CashFlowSeries) -> f64 {
    let invested: f64 = cash_flow.iter().filter(|v| **v < 0.0).map(|v| -v).sum();
    let returned: f64 = cash_flow.iter().filter(|v| **v > 0.0).sum();
    if invested <= 0.0 {
        0.0
    } else {
        returned / invested
    }
}

/// Re-exported for callers that want the raw monthly (non-annualized) rate.
pub fn monthly_irr(cash_flow: &CashFlowSeries) -> Option<f64> {
    irr_monthly(cash_flow.as_slice())
}
