use std::collections::HashMap;

use performa_core::error::PerformaResult;
use performa_core::series::CashFlowSeries;

use crate::model::{CashFlowModel, Context, PostingSpec};
use performa_ledger::{Category, Subcategory};

/// Straight-line hard/soft cost spend over the development's construction
/// period, starting at the analysis start month.
pub struct ConstructionCostModel {
    id: String,
    total_hard_costs: f64,
    total_soft_costs: f64,
    construction_months: u32,
}

impl ConstructionCostModel {
    pub fn new(
        id: impl Into<String>,
        total_hard_costs: f64,
        total_soft_costs: f64,
        construction_months: u32,
    ) -> Self {
        Self {
            id: id.into(),
            total_hard_costs,
            total_soft_costs,
            construction_months,
        }
    }
}

impl CashFlowModel for ConstructionCostModel {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn postings(&self) -> Vec<PostingSpec> {
        vec![
            PostingSpec::new("hard_costs", Category::Capital, Subcategory::HardCosts, "Hard Costs"),
            PostingSpec::new("soft_costs", Category::Capital, Subcategory::SoftCosts, "Soft Costs"),
        ]
    }

    fn compute_cf(&self, context: &Context) -> PerformaResult<HashMap<String, CashFlowSeries>> {
        let length = context.timeline.length();
        let months = self.construction_months.max(1) as usize;
        let monthly_hard = -self.total_hard_costs / months as f64;
        let monthly_soft = -self.total_soft_costs / months as f64;

        let mut hard = vec![0.0; length];
        let mut soft = vec![0.0; length];
        for month_idx in 0..months.min(length) {
            hard[month_idx] = monthly_hard;
            soft[month_idx] = monthly_soft;
        }

        let mut out = HashMap::new();
        out.insert("hard_costs".to_string(), CashFlowSeries::new(hard));
        out.insert("soft_costs".to_string(), CashFlowSeries::new(soft));
        Ok(out)
    }
}
