use std::collections::HashMap;

use performa_core::error::PerformaResult;
use performa_core::series::CashFlowSeries;

use crate::model::{CashFlowModel, Context, PostingSpec};
use performa_ledger::{Category, Subcategory};

/// Post-construction revenue and operating expense ramp for a development
/// project: zero during construction, then a straight-line ramp from zero
/// to the stabilized monthly amount over `lease_up_months`, then flat.
/// `lease_up_months == 0` means the asset stabilizes immediately once
/// construction finishes.
pub struct DevelopmentStabilizationModel {
    id: String,
    stabilized_revenue_monthly: f64,
    stabilized_opex_monthly: f64,
    construction_months: u32,
    lease_up_months: u32,
}

impl DevelopmentStabilizationModel {
    pub fn new(
        id: impl Into<String>,
        stabilized_revenue_monthly: f64,
        stabilized_opex_monthly: f64,
        construction_months: u32,
        lease_up_months: u32,
    ) -> Self {
        Self {
            id: id.into(),
            stabilized_revenue_monthly,
            stabilized_opex_monthly,
            construction_months,
            lease_up_months,
        }
    }

    /// Fraction of stabilized NOI realized at `month_idx`, ramping linearly
    /// across the lease-up window that follows construction.
    fn ramp_fraction(&self, month_idx: usize) -> f64 {
        let construction_months = self.construction_months as usize;
        if month_idx < construction_months {
            return 0.0;
        }
        if self.lease_up_months == 0 {
            return 1.0;
        }
        let months_since_delivery = (month_idx - construction_months + 1) as f64;
        (months_since_delivery / self.lease_up_months as f64).min(1.0)
    }
}

impl CashFlowModel for DevelopmentStabilizationModel {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn postings(&self) -> Vec<PostingSpec> {
        vec![
            PostingSpec::new("revenue", Category::Revenue, Subcategory::Lease, "Stabilized Revenue"),
            PostingSpec::new("opex", Category::Expense, Subcategory::OpEx, "Stabilized Operating Expenses"),
        ]
    }

    fn compute_cf(&self, context: &Context) -> PerformaResult<HashMap<String, CashFlowSeries>> {
        let length = context.timeline.length();
        let mut revenue = vec![0.0; length];
        let mut opex = vec![0.0; length];

        for month_idx in 0..length {
            let fraction = self.ramp_fraction(month_idx);
            revenue[month_idx] = self.stabilized_revenue_monthly * fraction;
            opex[month_idx] = -self.stabilized_opex_monthly * fraction;
        }

        let mut out = HashMap::new();
        out.insert("revenue".to_string(), CashFlowSeries::new(revenue));
        out.insert("opex".to_string(), CashFlowSeries::new(opex));
        Ok(out)
    }
}
