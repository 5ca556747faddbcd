use std::collections::HashMap;

use performa_core::error::PerformaResult;
use performa_core::series::CashFlowSeries;

use crate::model::{CashFlowModel, Context, PostingSpec};
use performa_ledger::{Category, Subcategory};

/// Expense recoveries billed back to tenants as a fixed percentage of the
/// same month's operating expenses, escalated on the same anniversary
/// schedule as the opex it recovers. No lease-by-lease reconciliation or
/// recovery cap is modeled.
pub struct RecoveryRevenueModel {
    id: String,
    monthly_opex: f64,
    annual_escalation_pct: f64,
    recovery_pct: f64,
}

impl RecoveryRevenueModel {
    pub fn new(
        id: impl Into<String>,
        monthly_opex: f64,
        annual_escalation_pct: f64,
        recovery_pct: f64,
    ) -> Self {
        Self {
            id: id.into(),
            monthly_opex,
            annual_escalation_pct,
            recovery_pct,
        }
    }
}

impl CashFlowModel for RecoveryRevenueModel {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn postings(&self) -> Vec<PostingSpec> {
        vec![PostingSpec::new(
            "recovery_revenue",
            Category::Revenue,
            Subcategory::Recovery,
            "Expense Recoveries",
        )]
    }

    fn compute_cf(&self, context: &Context) -> PerformaResult<HashMap<String, CashFlowSeries>> {
        let length = context.timeline.length();
        let values: Vec<f64> = (0..length)
            .map(|month_idx| {
                let year_offset = (month_idx / 12) as i32;
                let escalated_opex =
                    self.monthly_opex * (1.0 + self.annual_escalation_pct).powi(year_offset);
                escalated_opex * self.recovery_pct
            })
            .collect();

        let mut out = HashMap::new();
        out.insert("recovery_revenue".to_string(), CashFlowSeries::new(values));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use performa_core::timeline::{Timeline, YearMonth};
    use performa_types::{
        Acquisition, AssetConfig, Deal, ExitStrategy, OfficePropertyConfig, Partner, Partnership,
        Settings, Tier,
    };
    use uuid::Uuid;

    fn deal_fixture() -> Deal {
        Deal {
            asset: AssetConfig::OfficeProperty(OfficePropertyConfig {
                rentable_sf: 1000.0,
                starting_rent_psf_annual: 30.0,
                annual_escalation_pct: 0.0,
                occupancy_pct: 1.0,
                opex_psf_annual: 5.0,
                recovery_pct: 0.5,
            }),
            acquisition: Acquisition {
                date: YearMonth::new(2026, 1).unwrap(),
                purchase_price: 100.0,
                closing_costs_rate: 0.0,
            },
            financing: vec![],
            partnership: Partnership {
                partners: vec![Partner {
                    id: Uuid::new_v4(),
                    name: "LP".into(),
                    entity_type: "LP".into(),
                    share_of_equity: 1.0,
                    committed_capital: 100.0,
                }],
                waterfall: vec![Tier::ReturnOfCapital],
            },
            exit: ExitStrategy::DirectEntry {
                price: 100.0,
                hold_months: 12,
            },
        }
    }

    #[test]
    fn recovers_a_fixed_percentage_of_opex() {
        let timeline = Timeline::new(YearMonth::new(2026, 1).unwrap(), 1).unwrap();
        let deal = deal_fixture();
        let settings = Settings {
            analysis_start_date: YearMonth::new(2026, 1).unwrap(),
            period_count: 1,
            inflation_month: 1,
            valuation_method_default: Default::default(),
            irr_annualization_basis: Default::default(),
            funding_priority: Default::default(),
            sweep_default_mode: Default::default(),
            ledger_memory_limit_bytes: 1024,
        };
        let context = Context::new(&timeline, &settings, &deal);
        let model = RecoveryRevenueModel::new("recovery", 500.0, 0.0, 0.5);
        let out = model.compute_cf(&context).unwrap();
        assert_eq!(out["recovery_revenue"][0], 250.0);
    }

    #[test]
    fn recovery_escalates_with_the_opex_it_recovers() {
        let timeline = Timeline::new(YearMonth::new(2026, 1).unwrap(), 13).unwrap();
        let deal = deal_fixture();
        let settings = Settings {
            analysis_start_date: YearMonth::new(2026, 1).unwrap(),
            period_count: 13,
            inflation_month: 1,
            valuation_method_default: Default::default(),
            irr_annualization_basis: Default::default(),
            funding_priority: Default::default(),
            sweep_default_mode: Default::default(),
            ledger_memory_limit_bytes: 1024,
        };
        let context = Context::new(&timeline, &settings, &deal);
        let model = RecoveryRevenueModel::new("recovery", 500.0, 0.03, 0.5);
        let out = model.compute_cf(&context).unwrap();
        assert!((out["recovery_revenue"][12] - 250.0 * 1.03).abs() < 1e-9);
    }
}
