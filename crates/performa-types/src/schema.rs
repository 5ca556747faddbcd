//! Deal and Settings schema.
//!
//! These are plain data records: field defaults live here via
//! `#[serde(default = "fn")]`, but no constructor does cross-field checking.
//! All of that lives in [`crate::validation`].

use performa_core::timeline::YearMonth;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Root description of a real-estate deal, handed to `analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub asset: AssetConfig,
    pub acquisition: Acquisition,
    #[serde(default)]
    pub financing: Vec<Facility>,
    pub partnership: Partnership,
    pub exit: ExitStrategy,
}

/// Opaque-to-the-core asset description. Each variant is handed to the
/// asset-specific `build_cash_flow_models` dispatch in `performa-engine`;
/// the core never inspects the fields itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AssetConfig {
    OfficeProperty(OfficePropertyConfig),
    ResidentialProperty(ResidentialPropertyConfig),
    DevelopmentProject(DevelopmentProjectConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficePropertyConfig {
    pub rentable_sf: f64,
    pub starting_rent_psf_annual: f64,
    #[serde(default)]
    pub annual_escalation_pct: f64,
    pub occupancy_pct: f64,
    pub opex_psf_annual: f64,
    #[serde(default)]
    pub recovery_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidentialPropertyConfig {
    pub unit_count: u32,
    pub avg_monthly_rent_per_unit: f64,
    #[serde(default)]
    pub annual_escalation_pct: f64,
    pub occupancy_pct: f64,
    pub opex_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentProjectConfig {
    pub total_hard_costs: f64,
    pub total_soft_costs: f64,
    pub construction_months: u32,
    pub stabilized_noi_annual: f64,
    #[serde(default)]
    pub lease_up_months: u32,
}

/// Acquisition terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acquisition {
    pub date: YearMonth,
    pub purchase_price: f64,
    #[serde(default)]
    pub closing_costs_rate: f64,
}

/// A single debt facility participating in the deal's capital stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Facility {
    Construction(ConstructionFacility),
    Permanent(PermanentFacility),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionFacility {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    /// Maximum draw as a fraction of total project cost to date.
    pub ltc_threshold: f64,
    /// Annual interest rate, e.g. 0.07 for 7%.
    pub rate: f64,
    #[serde(default)]
    pub interest_method: InterestMethod,
    #[serde(default)]
    pub origination_fee_pct: f64,
    #[serde(default)]
    pub cash_sweep: Option<CashSweep>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum InterestMethod {
    None,
    Simple,
    #[default]
    Scheduled,
    /// Fixed-point iteration of `Scheduled` until balance/reserve converge.
    /// Declared per spec but not implemented; see `DESIGN.md`.
    Iterative,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SweepMode {
    Trap,
    Prepay,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CashSweep {
    pub mode: SweepMode,
    pub end_month: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermanentFacility {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub refinance_month: u32,
    pub sizing: PermanentSizing,
    pub rate: f64,
    pub term_months: u32,
    pub amortization_months: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "basis")]
pub enum PermanentSizing {
    Ltv { loan_to_value: f64 },
    ExplicitAmount { amount: f64 },
}

/// Ownership and waterfall structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partnership {
    pub partners: Vec<Partner>,
    pub waterfall: Vec<Tier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    /// e.g. "GP", "LP".
    pub entity_type: String,
    pub share_of_equity: f64,
    pub committed_capital: f64,
}

/// A single tier in the distribution waterfall, evaluated top to bottom.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tier")]
pub enum Tier {
    ReturnOfCapital,
    PreferredReturn { pref_rate: f64 },
    CatchUp { catch_up_pct: f64 },
    Split {
        gp_pct: f64,
        lp_pct: f64,
        hurdle_irr: f64,
    },
}

/// Exit / disposition assumption.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum ExitStrategy {
    DirectCap { cap_rate: f64, hold_months: u32 },
    Dcf {
        discount_rate: f64,
        terminal_cap: f64,
        hold_months: u32,
    },
    DirectEntry { price: f64, hold_months: u32 },
}

/// Run-level configuration independent of the deal's own terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub analysis_start_date: YearMonth,
    pub period_count: usize,
    #[serde(default = "default_inflation_month")]
    pub inflation_month: u32,
    #[serde(default)]
    pub valuation_method_default: ValuationMethodDefault,
    #[serde(default)]
    pub irr_annualization_basis: IrrAnnualizationBasis,
    #[serde(default)]
    pub funding_priority: FundingPriority,
    #[serde(default)]
    pub sweep_default_mode: SweepMode,
    #[serde(default = "default_ledger_memory_limit_bytes")]
    pub ledger_memory_limit_bytes: usize,
}

impl Default for SweepMode {
    fn default() -> Self {
        SweepMode::Trap
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValuationMethodDefault {
    #[default]
    DirectCap,
    Dcf,
    DirectEntry,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum IrrAnnualizationBasis {
    #[default]
    Compounded,
    Simple,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum FundingPriority {
    #[default]
    EquityFirst,
    DebtFirst,
}

fn default_inflation_month() -> u32 {
    1
}

fn default_ledger_memory_limit_bytes() -> usize {
    512 * 1024 * 1024
}
