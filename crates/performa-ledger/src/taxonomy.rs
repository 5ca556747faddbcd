//! The categorization taxonomy and its pure `flow_purpose` derivation.
//!
//! `FlowPurpose` is always re-derivable from `(category, subcategory, sign)`;
//! it is stored on each [`crate::TransactionRecord`] for query speed, never
//! as an independent input. This module is the **only** place the
//! Interest-Reserve/CapitalUse exception lives.

use serde::{Deserialize, Serialize};

/// Top-level ledger category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Revenue,
    Expense,
    Capital,
    Financing,
    Valuation,
}

impl Category {
    /// Canonical string persisted on export and used for query filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Revenue => "Revenue",
            Category::Expense => "Expense",
            Category::Capital => "Capital",
            Category::Financing => "Financing",
            Category::Valuation => "Valuation",
        }
    }

    /// Whether `sub` is an allowed subcategory for this category, per §3.5.
    pub fn allows(&self, sub: Subcategory) -> bool {
        matches!(
            (self, sub),
            (
                Category::Revenue,
                Subcategory::Lease
                    | Subcategory::Misc
                    | Subcategory::Recovery
                    | Subcategory::Sale
                    | Subcategory::VacancyLoss
                    | Subcategory::CreditLoss
                    | Subcategory::Abatement
                    | Subcategory::SecurityDeposit,
            ) | (Category::Expense, Subcategory::OpEx | Subcategory::CapEx)
                | (
                    Category::Capital,
                    Subcategory::PurchasePrice
                        | Subcategory::ClosingCosts
                        | Subcategory::DueDiligence
                        | Subcategory::HardCosts
                        | Subcategory::SoftCosts
                        | Subcategory::SiteWork
                        | Subcategory::TransactionCosts
                        | Subcategory::Other,
                )
                | (
                    Category::Financing,
                    Subcategory::LoanProceeds
                        | Subcategory::RefinancingProceeds
                        | Subcategory::PrincipalPayment
                        | Subcategory::InterestPayment
                        | Subcategory::InterestReserve
                        | Subcategory::Prepayment
                        | Subcategory::RefinancingPayoff
                        | Subcategory::EquityContribution
                        | Subcategory::EquityDistribution
                        | Subcategory::PreferredReturn
                        | Subcategory::Promote
                        | Subcategory::OriginationFee
                        | Subcategory::ExitFee
                        | Subcategory::PrepaymentPenalty
                        | Subcategory::CashSweepDeposit
                        | Subcategory::CashSweepRelease
                        | Subcategory::SweepPrepayment,
                )
                | (
                    Category::Valuation,
                    Subcategory::AssetValuation
                        | Subcategory::ComparableSales
                        | Subcategory::Dcf
                        | Subcategory::DirectCap
                        | Subcategory::CostApproach
                        | Subcategory::BrokerOpinion,
                )
        )
    }
}

/// Subcategory, tagged to exactly one [`Category`] by [`Category::allows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subcategory {
    // Revenue
    Lease,
    Misc,
    Recovery,
    Sale,
    VacancyLoss,
    CreditLoss,
    Abatement,
    SecurityDeposit,
    // Expense
    OpEx,
    CapEx,
    // Capital
    PurchasePrice,
    ClosingCosts,
    DueDiligence,
    HardCosts,
    SoftCosts,
    SiteWork,
    TransactionCosts,
    Other,
    // Financing
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
    // Valuation
    AssetValuation,
    ComparableSales,
    Dcf,
    DirectCap,
    CostApproach,
    BrokerOpinion,
}

impl Subcategory {
    /// Canonical string persisted on export.
    pub fn as_str(&self) -> &'static str {
        match self {
            Subcategory::Lease => "Lease",
            Subcategory::Misc => "Misc",
            Subcategory::Recovery => "Recovery",
            Subcategory::Sale => "Sale",
            Subcategory::VacancyLoss => "Vacancy Loss",
            Subcategory::CreditLoss => "Credit Loss",
            Subcategory::Abatement => "Abatement",
            Subcategory::SecurityDeposit => "Security Deposit",
            Subcategory::OpEx => "OpEx",
            Subcategory::CapEx => "CapEx",
            Subcategory::PurchasePrice => "Purchase Price",
            Subcategory::ClosingCosts => "Closing Costs",
            Subcategory::DueDiligence => "Due Diligence",
            Subcategory::HardCosts => "Hard Costs",
            Subcategory::SoftCosts => "Soft Costs",
            Subcategory::SiteWork => "Site Work",
            Subcategory::TransactionCosts => "Transaction Costs",
            Subcategory::Other => "Other",
            Subcategory::LoanProceeds => "Loan Proceeds",
            Subcategory::RefinancingProceeds => "Refinancing Proceeds",
            Subcategory::PrincipalPayment => "Principal Payment",
            Subcategory::InterestPayment => "Interest Payment",
            Subcategory::InterestReserve => "Interest Reserve",
            Subcategory::Prepayment => "Prepayment",
            Subcategory::RefinancingPayoff => "Refinancing Payoff",
            Subcategory::EquityContribution => "Equity Contribution",
            Subcategory::EquityDistribution => "Equity Distribution",
            Subcategory::PreferredReturn => "Preferred Return",
            Subcategory::Promote => "Promote",
            Subcategory::OriginationFee => "Origination Fee",
            Subcategory::ExitFee => "Exit Fee",
            Subcategory::PrepaymentPenalty => "Prepayment Penalty",
            Subcategory::CashSweepDeposit => "Cash Sweep Deposit",
            Subcategory::CashSweepRelease => "Cash Sweep Release",
            Subcategory::SweepPrepayment => "Sweep Prepayment",
            Subcategory::AssetValuation => "Asset Valuation",
            Subcategory::ComparableSales => "Comparable Sales",
            Subcategory::Dcf => "DCF",
            Subcategory::DirectCap => "Direct Cap",
            Subcategory::CostApproach => "Cost Approach",
            Subcategory::BrokerOpinion => "Broker Opinion",
        }
    }
}

/// The five mutually-exclusive purposes a record can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowPurpose {
    Operating,
    CapitalUse,
    CapitalSource,
    FinancingService,
    Valuation,
}

impl FlowPurpose {
    /// Canonical string persisted on export.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowPurpose::Operating => "Operating",
            FlowPurpose::CapitalUse => "CapitalUse",
            FlowPurpose::CapitalSource => "CapitalSource",
            FlowPurpose::FinancingService => "FinancingService",
            FlowPurpose::Valuation => "Valuation",
        }
    }
}

/// Pure derivation of `flow_purpose` from `(category, subcategory, sign)`.
///
/// `sign` is the signed amount the purpose is being derived for; no
/// subcategory in the current taxonomy needs it to disambiguate, but it is
/// threaded through so a future subcategory can split on direction without
/// changing every call site.
pub fn derive_flow_purpose(category: Category, sub: Subcategory, _sign: f64) -> FlowPurpose {
    use Category::*;
    use Subcategory::*;

    match category {
        Valuation => FlowPurpose::Valuation,
        Capital => FlowPurpose::CapitalUse,
        Revenue => match sub {
            Sale => FlowPurpose::CapitalSource,
            _ => FlowPurpose::Operating,
        },
        Expense => FlowPurpose::Operating,
        Financing => match sub {
            LoanProceeds | RefinancingProceeds | EquityContribution => FlowPurpose::CapitalSource,
            InterestReserve => FlowPurpose::CapitalUse,
            CashSweepRelease => FlowPurpose::FinancingService,
            _ => FlowPurpose::FinancingService,
        },
    }
}
