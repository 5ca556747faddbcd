//! Wires every stage together: validate the deal, build the ledger, run
//! asset cash flows through the orchestrator, value and dispose of the
//! property, process debt, fund the equity shortfall, run the waterfall,
//! and seal.

use performa_core::error::PerformaResult;
use performa_core::timeline::Timeline;
use performa_ledger::{Ledger, LedgerQueries};
use performa_types::{validate, Deal, Settings};
use uuid::Uuid;

use crate::asset::AssetAnalyzer;
use crate::cash_flow_engine::CashFlowEngine;
use crate::debt::DebtAnalyzer;
use crate::model::Context;
use crate::orchestrator::Orchestrator;
use crate::partnership::PartnershipAnalyzer;
use crate::results::DealResults;
use crate::valuation::ValuationEngine;

/// Run a complete deal analysis and return its sealed, query-ready results.
pub fn analyze(deal: Deal, settings: Settings) -> PerformaResult<DealResults> {
    validate(&deal, &settings)?;

    let timeline = Timeline::new(settings.analysis_start_date, settings.period_count)?;
    let asset_id = Uuid::new_v4();
    let mut ledger = Ledger::new(timeline.clone());

    post_acquisition(&mut ledger, &deal, &timeline, asset_id)?;

    let mut context = Context::new(&timeline, &settings, &deal);
    let mut orchestrator = Orchestrator::new();
    for model in AssetAnalyzer::build_cash_flow_models(&deal.asset) {
        orchestrator.register(model);
    }
    orchestrator.run(&mut ledger, &mut context, asset_id)?;

    let exit_hold_months = match deal.exit {
        performa_types::ExitStrategy::DirectCap { hold_months, .. }
        | performa_types::ExitStrategy::Dcf { hold_months, .. }
        | performa_types::ExitStrategy::DirectEntry { hold_months, .. } => hold_months,
    };
    let exit_month_idx = (exit_hold_months as usize)
        .saturating_sub(1)
        .min(timeline.length().saturating_sub(1));

    let valuation = ValuationEngine::new(&timeline);
    let noi = LedgerQueries::new(&ledger).noi();
    valuation.post_value_series(&mut ledger, &deal.exit, &noi, asset_id, 7)?;
    let disposition = valuation.disposition(&deal.exit, &noi);
    valuation.post_disposition(&mut ledger, &disposition, asset_id, 8)?;

    let cash_flow_engine = CashFlowEngine::new(&timeline);
    if matches!(settings.funding_priority, performa_types::FundingPriority::EquityFirst) {
        cash_flow_engine.fund_equity_first(&mut ledger, &deal.partnership, asset_id, 9)?;
    }

    let debt_analyzer = DebtAnalyzer::new(&timeline);
    debt_analyzer.process(&mut ledger, &deal.financing, asset_id, exit_month_idx)?;

    cash_flow_engine.fund(&mut ledger, &deal.partnership, asset_id, 15)?;

    let partnership_analyzer = PartnershipAnalyzer::new(&timeline);
    partnership_analyzer.distribute(&mut ledger, &deal.partnership, asset_id, 20)?;

    ledger.seal();
    tracing::info!(asset_id = %asset_id, "deal analysis complete");
    Ok(DealResults::new(ledger, settings.irr_annualization_basis))
}

fn post_acquisition(
    ledger: &mut Ledger,
    deal: &Deal,
    timeline: &Timeline,
    asset_id: Uuid,
) -> PerformaResult<()> {
    use performa_core::series::CashFlowSeries;
    use performa_ledger::{Category, Subcategory, TransactionMetadata};

    let acquisition_idx = timeline.index_of(deal.acquisition.date).unwrap_or(0);
    let mut price_values = vec![0.0; timeline.length()];
    let mut closing_values = vec![0.0; timeline.length()];
    if acquisition_idx < timeline.length() {
        price_values[acquisition_idx] = -deal.acquisition.purchase_price;
        closing_values[acquisition_idx] =
            -deal.acquisition.purchase_price * deal.acquisition.closing_costs_rate;
    }

    ledger.transaction(|scope| {
        scope.append_series(
            &CashFlowSeries::new(price_values),
            &TransactionMetadata {
                category: Category::Capital,
                subcategory: Subcategory::PurchasePrice,
                item_name: "Purchase Price".into(),
                source_id: Uuid::new_v5(&Uuid::NAMESPACE_OID, b"analyze.acquisition"),
                asset_id,
                deal_id: None,
                entity_id: None,
                entity_type: None,
                pass_num: 0,
            },
        )?;
        scope.append_series(
            &CashFlowSeries::new(closing_values),
            &TransactionMetadata {
                category: Category::Capital,
                subcategory: Subcategory::ClosingCosts,
                item_name: "Closing Costs".into(),
                source_id: Uuid::new_v5(&Uuid::NAMESPACE_OID, b"analyze.acquisition"),
                asset_id,
                deal_id: None,
                entity_id: None,
                entity_type: None,
                pass_num: 0,
            },
        )?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use performa_core::timeline::YearMonth;
    use performa_types::{
        Acquisition, AssetConfig, ExitStrategy, OfficePropertyConfig, Partner, Partnership, Tier,
    };

    fn office_deal() -> Deal {
        Deal {
            asset: AssetConfig::OfficeProperty(OfficePropertyConfig {
                rentable_sf: 50_000.0,
                starting_rent_psf_annual: 28.0,
                annual_escalation_pct: 0.03,
                occupancy_pct: 0.92,
                opex_psf_annual: 8.0,
                recovery_pct: 0.0,
            }),
            acquisition: Acquisition {
                date: YearMonth::new(2026, 1).unwrap(),
                purchase_price: 10_000_000.0,
                closing_costs_rate: 0.02,
            },
            financing: vec![],
            partnership: Partnership {
                partners: vec![
                    Partner {
                        id: Uuid::new_v4(),
                        name: "Sponsor".into(),
                        entity_type: "GP".into(),
                        share_of_equity: 0.1,
                        committed_capital: 1_000_000.0,
                    },
                    Partner {
                        id: Uuid::new_v4(),
                        name: "Investor".into(),
                        entity_type: "LP".into(),
                        share_of_equity: 0.9,
                        committed_capital: 9_000_000.0,
                    },
                ],
                waterfall: vec![
                    Tier::ReturnOfCapital,
                    Tier::PreferredReturn { pref_rate: 0.08 },
                    Tier::Split {
                        gp_pct: 0.2,
                        lp_pct: 0.8,
                        hurdle_irr: 0.12,
                    },
                ],
            },
            exit: ExitStrategy::DirectCap {
                cap_rate: 0.055,
                hold_months: 60,
            },
        }
    }

    fn settings() -> Settings {
        Settings {
            analysis_start_date: YearMonth::new(2026, 1).unwrap(),
            period_count: 60,
            inflation_month: 1,
            valuation_method_default: Default::default(),
            irr_annualization_basis: Default::default(),
            funding_priority: Default::default(),
            sweep_default_mode: Default::default(),
            ledger_memory_limit_bytes: 512 * 1024 * 1024,
        }
    }

    #[test]
    fn full_deal_analysis_produces_a_sealed_ledger_with_results() {
        let results = analyze(office_deal(), settings()).unwrap();
        assert!(results.ledger_queries().noi().total() > 0.0);
        let levered = results.levered_cash_flow();
        assert_eq!(levered.len(), 60);
        let partners = office_deal().partnership.partners;
        let per_partner = results.per_partner(&partners);
        assert_eq!(per_partner.len(), 2);
    }
}
