//! Cost- and carbon-derived metrics for a single energy record.
//!
//! | Metric | Formula |
//! |--------|---------|
//! | Estimated kWh | `monthly_bill / price_per_kwh` |
//! | Carbon footprint | `round(estimated_kwh × co2_kg_per_kwh)` whole kg |
//! | Energy intensity | `round2(monthly_bill / building_size)`, 0 without a size |
//! | Consumption level | cost per sq ft: `< 5` low, `< 10` moderate, else high |

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::common::{ratio_or_zero, round_half_up, round_whole};

/// Cost per square foot below which consumption is [`ConsumptionLevel::Low`].
pub const MODERATE_THRESHOLD: Decimal = dec!(5);

/// Cost per square foot at or above which consumption is [`ConsumptionLevel::High`].
pub const HIGH_THRESHOLD: Decimal = dec!(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumptionLevel {
    Low,
    Moderate,
    High,
}

impl ConsumptionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarbonFootprint {
    /// Monthly consumption implied by the bill, unrounded.
    pub estimated_kwh: Decimal,
    /// Whole kilograms of CO₂ per month.
    pub footprint_kg: Decimal,
}

/// Estimate monthly CO₂ from the bill.
///
/// `price_per_kwh` must be positive; [`super::EnergyAnalyzer::new`] enforces
/// this for configured values. `None` when the estimate overflows.
pub fn carbon_footprint(
    monthly_bill: Decimal,
    price_per_kwh: Decimal,
    co2_kg_per_kwh: Decimal,
) -> Option<CarbonFootprint> {
    let estimated_kwh = ratio_or_zero(monthly_bill, price_per_kwh)?;
    let footprint_kg = round_whole(estimated_kwh.checked_mul(co2_kg_per_kwh)?);
    Some(CarbonFootprint {
        estimated_kwh,
        footprint_kg,
    })
}

/// Bill per square foot, rounded to cents.
pub fn energy_intensity(
    monthly_bill: Decimal,
    building_size: Decimal,
) -> Option<Decimal> {
    ratio_or_zero(monthly_bill, building_size).map(round_half_up)
}

pub fn consumption_level(
    monthly_bill: Decimal,
    building_size: Decimal,
) -> Option<ConsumptionLevel> {
    let per_sq_ft = ratio_or_zero(monthly_bill, building_size)?;
    let level = if per_sq_ft < MODERATE_THRESHOLD {
        ConsumptionLevel::Low
    } else if per_sq_ft < HIGH_THRESHOLD {
        ConsumptionLevel::Moderate
    } else {
        ConsumptionLevel::High
    };
    Some(level)
}
