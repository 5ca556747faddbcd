//! Illustrative leaf [`crate::CashFlowModel`] implementations dispatched by
//! [`crate::AssetAnalyzer`]. These are deliberately simple per-asset-type
//! revenue/expense/cost calculators, not a full market-rent engine.

mod construction_cost;
mod development_stabilization;
mod flat_rent_revenue;
mod recovery_revenue;
mod stabilized_opex;

pub use construction_cost::ConstructionCostModel;
pub use development_stabilization::DevelopmentStabilizationModel;
pub use flat_rent_revenue::FlatRentRevenueModel;
pub use recovery_revenue::RecoveryRevenueModel;
pub use stabilized_opex::StabilizedOpexModel;
