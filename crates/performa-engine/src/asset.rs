//! Dispatches a deal's [`AssetConfig`] variant to the concrete leaf
//! [`CashFlowModel`]s that produce its revenue/expense cash flows.

use performa_types::AssetConfig;

use crate::model::CashFlowModel;
use crate::models::{
    ConstructionCostModel, DevelopmentStabilizationModel, FlatRentRevenueModel, RecoveryRevenueModel,
    StabilizedOpexModel,
};

/// Builds the set of leaf models an [`crate::Orchestrator`] should run for
/// one asset.
pub struct AssetAnalyzer;

impl AssetAnalyzer {
    /// Construct the leaf `CashFlowModel`s for `asset`, ready to register
    /// with an [`crate::Orchestrator`].
    pub fn build_cash_flow_models(asset: &AssetConfig) -> Vec<Box<dyn CashFlowModel>> {
        match asset {
            AssetConfig::OfficeProperty(config) => {
                let monthly_rent = config.rentable_sf * config.starting_rent_psf_annual / 12.0;
                let monthly_opex = config.rentable_sf * config.opex_psf_annual / 12.0;
                let mut models: Vec<Box<dyn CashFlowModel>> = vec![
                    Box::new(FlatRentRevenueModel::new(
                        "asset.revenue",
                        monthly_rent,
                        config.annual_escalation_pct,
                        config.occupancy_pct,
                    )),
                    Box::new(StabilizedOpexModel::new(
                        "asset.opex",
                        monthly_opex,
                        config.annual_escalation_pct,
                    )),
                ];
                if config.recovery_pct > 0.0 {
                    models.push(Box::new(RecoveryRevenueModel::new(
                        "asset.recovery",
                        monthly_opex,
                        config.annual_escalation_pct,
                        config.recovery_pct,
                    )));
                }
                models
            }
            AssetConfig::ResidentialProperty(config) => {
                let monthly_rent = config.avg_monthly_rent_per_unit * config.unit_count as f64;
                let monthly_opex = monthly_rent * config.opex_ratio;
                vec![
                    Box::new(FlatRentRevenueModel::new(
                        "asset.revenue",
                        monthly_rent,
                        config.annual_escalation_pct,
                        config.occupancy_pct,
                    )),
                    Box::new(StabilizedOpexModel::new(
                        "asset.opex",
                        monthly_opex,
                        config.annual_escalation_pct,
                    )),
                ]
            }
            AssetConfig::DevelopmentProject(config) => {
                // Stabilized NOI is split 65/35 revenue/opex to drive the
                // post-lease-up leaf model; only the construction-period
                // spend has a direct input.
                let stabilized_revenue_annual = config.stabilized_noi_annual / 0.65;
                let stabilized_opex_annual = stabilized_revenue_annual - config.stabilized_noi_annual;
                vec![
                    Box::new(ConstructionCostModel::new(
                        "asset.construction",
                        config.total_hard_costs,
                        config.total_soft_costs,
                        config.construction_months,
                    )),
                    Box::new(DevelopmentStabilizationModel::new(
                        "asset.stabilization",
                        stabilized_revenue_annual / 12.0,
                        stabilized_opex_annual / 12.0,
                        config.construction_months,
                        config.lease_up_months,
                    )),
                ]
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use performa_types::{
        Acquisition, Deal, ExitStrategy, OfficePropertyConfig, Partner, Partnership, Tier,
    };
    use uuid::Uuid;

    pub(crate) fn office_deal() -> Deal {
        Deal {
            asset: AssetConfig::OfficeProperty(OfficePropertyConfig {
                rentable_sf: 1000.0,
                starting_rent_psf_annual: 30.0,
                annual_escalation_pct: 0.03,
                occupancy_pct: 0.95,
                opex_psf_annual: 5.0,
                recovery_pct: 0.0,
            }),
            acquisition: Acquisition {
                date: performa_core::timeline::YearMonth::new(2026, 1).unwrap(),
                purchase_price: 1_000_000.0,
                closing_costs_rate: 0.02,
            },
            financing: vec![],
            partnership: Partnership {
                partners: vec![Partner {
                    id: Uuid::new_v4(),
                    name: "LP".into(),
                    entity_type: "LP".into(),
                    share_of_equity: 1.0,
                    committed_capital: 1_000_000.0,
                }],
                waterfall: vec![Tier::ReturnOfCapital],
            },
            exit: ExitStrategy::DirectEntry {
                price: 1_000_000.0,
                hold_months: 60,
            },
        }
    }

    #[test]
    fn office_property_builds_revenue_and_opex_models() {
        let deal = office_deal();
        let models = AssetAnalyzer::build_cash_flow_models(&deal.asset);
        assert_eq!(models.len(), 2);
    }

    #[test]
    fn development_project_builds_construction_and_stabilization_models() {
        let deal = Deal {
            asset: AssetConfig::DevelopmentProject(performa_types::DevelopmentProjectConfig {
                total_hard_costs: 1_000_000.0,
                total_soft_costs: 200_000.0,
                construction_months: 18,
                stabilized_noi_annual: 400_000.0,
                lease_up_months: 6,
            }),
            ..office_deal()
        };
        let models = AssetAnalyzer::build_cash_flow_models(&deal.asset);
        assert_eq!(models.len(), 2);
    }

    #[test]
    fn office_property_adds_recovery_model_when_recovery_pct_is_set() {
        let deal = Deal {
            asset: AssetConfig::OfficeProperty(performa_types::OfficePropertyConfig {
                rentable_sf: 1000.0,
                starting_rent_psf_annual: 30.0,
                annual_escalation_pct: 0.03,
                occupancy_pct: 0.95,
                opex_psf_annual: 5.0,
                recovery_pct: 0.5,
            }),
            ..office_deal()
        };
        let models = AssetAnalyzer::build_cash_flow_models(&deal.asset);
        assert_eq!(models.len(), 3);
    }
}
