//! Derived analytics for a stored energy record.
//!
//! Everything in this module is pure and deterministic: the same record and
//! configuration always produce the same report.

pub mod common;
pub mod footprint;
pub mod report;
pub mod tips;

pub use footprint::{CarbonFootprint, ConsumptionLevel};
pub use report::{
    Analytics, AnalyticsConfig, AnalyticsError, ApplianceUsage, CO2_KG_PER_KWH,
    DEFAULT_PRICE_PER_KWH, EnergyAnalyzer, EnergyReport,
};
pub use tips::{MAX_TIPS, Tip, generate_tips};
