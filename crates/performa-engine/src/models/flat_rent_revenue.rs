use std::collections::HashMap;

use performa_core::error::PerformaResult;
use performa_core::series::CashFlowSeries;

use crate::model::{CashFlowModel, Context, PostingSpec};
use performa_ledger::{Category, Subcategory};

/// Flat monthly base rent with a fixed annual escalation applied on each
/// 12-month anniversary of the analysis start, net of a constant occupancy
/// factor. No re-leasing, concessions, or rollover are modeled.
pub struct FlatRentRevenueModel {
    id: String,
    monthly_base_rent: f64,
    annual_escalation_pct: f64,
    occupancy_pct: f64,
}

impl FlatRentRevenueModel {
    pub fn new(
        id: impl Into<String>,
        monthly_base_rent: f64,
        annual_escalation_pct: f64,
        occupancy_pct: f64,
    ) -> Self {
        Self {
            id: id.into(),
            monthly_base_rent,
            annual_escalation_pct,
            occupancy_pct,
        }
    }
}

impl CashFlowModel for FlatRentRevenueModel {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn postings(&self) -> Vec<PostingSpec> {
        vec![PostingSpec::new(
            "lease_revenue",
            Category::Revenue,
            Subcategory::Lease,
            "Base Rent",
        )]
    }

    fn compute_cf(&self, context: &Context) -> PerformaResult<HashMap<String, CashFlowSeries>> {
        let length = context.timeline.length();
        let values: Vec<f64> = (0..length)
            .map(|month_idx| {
                let year_offset = (month_idx / 12) as i32;
                let escalated = self.monthly_base_rent
                    * (1.0 + self.annual_escalation_pct).powi(year_offset);
                escalated * self.occupancy_pct
            })
            .collect();

        let mut out = HashMap::new();
        out.insert("lease_revenue".to_string(), CashFlowSeries::new(values));
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
                annual_escalation_pct: 0.03,
                occupancy_pct: 1.0,
                opex_psf_annual: 5.0,
                recovery_pct: 0.0,
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
    fn escalates_once_per_anniversary_year() {
        let timeline = Timeline::new(YearMonth::new(2026, 1).unwrap(), 25).unwrap();
        let deal = deal_fixture();
        let settings = Settings {
            analysis_start_date: YearMonth::new(2026, 1).unwrap(),
            period_count: 25,
            inflation_month: 1,
            valuation_method_default: Default::default(),
            irr_annualization_basis: Default::default(),
            funding_priority: Default::default(),
            sweep_default_mode: Default::default(),
            ledger_memory_limit_bytes: 1024,
        };
        let context = Context::new(&timeline, &settings, &deal);
        let model = FlatRentRevenueModel::new("rent", 1000.0, 0.03, 1.0);
        let out = model.compute_cf(&context).unwrap();
        let series = &out["lease_revenue"];
        assert_eq!(series[0], 1000.0);
        assert_eq!(series[11], 1000.0);
        assert!((series[12] - 1030.0).abs() < 1e-9);
        assert!((series[24] - 1060.9).abs() < 1e-6);
    }

    #[test]
    fn occupancy_scales_gross_potential_rent() {
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
        let model = FlatRentRevenueModel::new("rent", 1000.0, 0.0, 0.9);
        let out = model.compute_cf(&context).unwrap();
        assert_eq!(out["lease_revenue"][0], 900.0);
    }
}
