//! Deal and Settings validation.

use performa_core::error::{PerformaError, PerformaResult};

use crate::schema::{
    Acquisition, AssetConfig, Deal, ExitStrategy, Facility, Partnership, Settings, Tier,
};

/// Tolerance for partnership equity shares summing to 1.0, per the
/// configuration error contract.
const SHARE_SUM_TOLERANCE: f64 = 1e-9;

/// Validate a `Deal`/`Settings` pair before an analysis run starts.
///
/// Returns the first violation found; callers get a single
/// `ConfigurationError`, never a partial-state run.
pub fn validate(deal: &Deal, settings: &Settings) -> PerformaResult<()> {
    validate_asset(&deal.asset)?;
    validate_acquisition(&deal.acquisition)?;
    validate_financing(&deal.financing)?;
    validate_partnership(&deal.partnership)?;
    validate_exit(&deal.exit)?;
    validate_settings(settings)?;
    Ok(())
}

fn validate_asset(asset: &AssetConfig) -> PerformaResult<()> {
    match asset {
        AssetConfig::OfficeProperty(cfg) => {
            if cfg.rentable_sf <= 0.0 {
                return Err(PerformaError::config("rentable_sf must be positive"));
            }
            if !(0.0..=1.0).contains(&cfg.occupancy_pct) {
                return Err(PerformaError::config("occupancy_pct must be in [0, 1]"));
            }
        }
        AssetConfig::ResidentialProperty(cfg) => {
            if cfg.unit_count == 0 {
                return Err(PerformaError::config("unit_count must be at least 1"));
            }
            if !(0.0..=1.0).contains(&cfg.occupancy_pct) {
                return Err(PerformaError::config("occupancy_pct must be in [0, 1]"));
            }
        }
        AssetConfig::DevelopmentProject(cfg) => {
            if cfg.total_hard_costs < 0.0 || cfg.total_soft_costs < 0.0 {
                return Err(PerformaError::config(
                    "development project costs cannot be negative",
                ));
            }
            if cfg.construction_months == 0 {
                return Err(PerformaError::config(
                    "construction_months must be at least 1",
                ));
            }
        }
    }
    Ok(())
}

fn validate_acquisition(acquisition: &Acquisition) -> PerformaResult<()> {
    if acquisition.purchase_price <= 0.0 {
        return Err(PerformaError::config("purchase_price must be positive"));
    }
    if !(0.0..=1.0).contains(&acquisition.closing_costs_rate) {
        return Err(PerformaError::config(
            "closing_costs_rate must be in [0, 1]",
        ));
    }
    Ok(())
}

fn validate_financing(facilities: &[Facility]) -> PerformaResult<()> {
    for facility in facilities {
        match facility {
            Facility::Construction(c) => {
                if !(0.0..=1.0).contains(&c.ltc_threshold) {
                    return Err(PerformaError::config(format!(
                        "facility '{}': ltc_threshold must be in [0, 1]",
                        c.name
                    )));
                }
                if c.rate < 0.0 {
                    return Err(PerformaError::config(format!(
                        "facility '{}': rate cannot be negative",
                        c.name
                    )));
                }
                if let Some(sweep) = &c.cash_sweep {
                    if sweep.end_month == 0 {
                        return Err(PerformaError::config(format!(
                            "facility '{}': cash sweep end_month must be at least 1",
                            c.name
                        )));
                    }
                }
            }
            Facility::Permanent(p) => {
                if p.rate < 0.0 {
                    return Err(PerformaError::config(format!(
                        "facility '{}': rate cannot be negative",
                        p.name
                    )));
                }
                if p.term_months == 0 || p.amortization_months == 0 {
                    return Err(PerformaError::config(format!(
                        "facility '{}': term_months and amortization_months must be at least 1",
                        p.name
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_partnership(partnership: &Partnership) -> PerformaResult<()> {
    if partnership.partners.is_empty() {
        return Err(PerformaError::config(
            "partnership must have at least one partner",
        ));
    }

    let share_sum: f64 = partnership.partners.iter().map(|p| p.share_of_equity).sum();
    if (share_sum - 1.0).abs() > SHARE_SUM_TOLERANCE {
        return Err(PerformaError::config(format!(
            "partner share_of_equity must sum to 1.0 within {:.0e}, got {}",
            SHARE_SUM_TOLERANCE, share_sum
        )));
    }

    for partner in &partnership.partners {
        if partner.committed_capital < 0.0 {
            return Err(PerformaError::config(format!(
                "partner '{}': committed_capital cannot be negative",
                partner.name
            )));
        }
    }

    for tier in &partnership.waterfall {
        if let Tier::Split {
            gp_pct, lp_pct, ..
        } = tier
        {
            if ((gp_pct + lp_pct) - 1.0).abs() > 1e-6 {
                return Err(PerformaError::config(
                    "waterfall split tier gp_pct + lp_pct must sum to 1.0",
                ));
            }
        }
    }

    Ok(())
}

fn validate_exit(exit: &ExitStrategy) -> PerformaResult<()> {
    match exit {
        ExitStrategy::DirectCap {
            cap_rate,
            hold_months,
        } => {
            if *cap_rate <= 0.0 {
                return Err(PerformaError::config("cap_rate must be positive"));
            }
            if *hold_months == 0 {
                return Err(PerformaError::config("hold_months must be at least 1"));
            }
        }
        ExitStrategy::Dcf {
            discount_rate,
            hold_months,
            ..
        } => {
            if *discount_rate <= 0.0 {
                return Err(PerformaError::config("discount_rate must be positive"));
            }
            if *hold_months == 0 {
                return Err(PerformaError::config("hold_months must be at least 1"));
            }
        }
        ExitStrategy::DirectEntry {
            price, hold_months, ..
        } => {
            if *price <= 0.0 {
                return Err(PerformaError::config("direct-entry price must be positive"));
            }
            if *hold_months == 0 {
                return Err(PerformaError::config("hold_months must be at least 1"));
            }
        }
    }
    Ok(())
}

fn validate_settings(settings: &Settings) -> PerformaResult<()> {
    if settings.period_count == 0 {
        return Err(PerformaError::config("period_count must be at least 1"));
    }
    if !(1..=12).contains(&settings.inflation_month) {
        return Err(PerformaError::config("inflation_month must be in 1..=12"));
    }
    if settings.ledger_memory_limit_bytes == 0 {
        return Err(PerformaError::config(
            "ledger_memory_limit_bytes must be positive",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use performa_core::timeline::YearMonth;
    use crate::schema::{
        FundingPriority, IrrAnnualizationBasis, OfficePropertyConfig, Partner,
        SweepMode, ValuationMethodDefault,
    };

    fn valid_deal() -> Deal {
        Deal {
            asset: AssetConfig::OfficeProperty(OfficePropertyConfig {
                rentable_sf: 100_000.0,
                starting_rent_psf_annual: 30.0,
                annual_escalation_pct: 0.03,
                occupancy_pct: 0.95,
                opex_psf_annual: 8.0,
                recovery_pct: 0.8,
            }),
            acquisition: Acquisition {
                date: YearMonth::new(2026, 1).unwrap(),
                purchase_price: 12_000_000.0,
                closing_costs_rate: 0.02,
            },
            financing: vec![],
            partnership: Partnership {
                partners: vec![
                    Partner {
                        id: uuid::Uuid::new_v4(),
                        name: "GP".into(),
                        entity_type: "GP".into(),
                        share_of_equity: 0.1,
                        committed_capital: 300_000.0,
                    },
                    Partner {
                        id: uuid::Uuid::new_v4(),
                        name: "LP".into(),
                        entity_type: "LP".into(),
                        share_of_equity: 0.9,
                        committed_capital: 2_700_000.0,
                    },
                ],
                waterfall: vec![Tier::ReturnOfCapital],
            },
            exit: ExitStrategy::DirectCap {
                cap_rate: 0.055,
                hold_months: 60,
            },
        }
    }

    fn valid_settings() -> Settings {
        Settings {
            analysis_start_date: YearMonth::new(2026, 1).unwrap(),
            period_count: 60,
            inflation_month: 1,
            valuation_method_default: ValuationMethodDefault::DirectCap,
            irr_annualization_basis: IrrAnnualizationBasis::Compounded,
            funding_priority: FundingPriority::EquityFirst,
            sweep_default_mode: SweepMode::Trap,
            ledger_memory_limit_bytes: 512 * 1024 * 1024,
        }
    }

    #[test]
    fn valid_deal_and_settings_pass() {
        assert!(validate(&valid_deal(), &valid_settings()).is_ok());
    }

    #[test]
    fn partner_shares_must_sum_to_one() {
        let mut deal = valid_deal();
        deal.partnership.partners[0].share_of_equity = 0.2;
        let err = validate(&deal, &valid_settings()).unwrap_err();
        assert!(matches!(err, PerformaError::ConfigurationError(_)));
    }

    #[test]
    fn zero_period_count_is_rejected() {
        let mut settings = valid_settings();
        settings.period_count = 0;
        assert!(validate(&valid_deal(), &settings).is_err());
    }

    #[test]
    fn inflation_month_out_of_range_is_rejected() {
        let mut settings = valid_settings();
        settings.inflation_month = 13;
        assert!(validate(&valid_deal(), &settings).is_err());
    }
}
