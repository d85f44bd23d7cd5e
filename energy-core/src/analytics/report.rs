//! The analytics summary shown after a record has been submitted.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//!
//! use chrono::Utc;
//! use rust_decimal_macros::dec;
//! use energy_core::analytics::{Analytics, AnalyticsConfig, ConsumptionLevel, EnergyAnalyzer};
//! use energy_core::{Appliance, EnergyRecord, EnergySource, PeakUsageTime, Season, UserId, UserType};
//!
//! let record = EnergyRecord {
//!     user_id: UserId::new("user-1"),
//!     user_type: UserType::Household,
//!     location: "Pune".to_string(),
//!     building_size: dec!(1000),
//!     occupants: 4,
//!     energy_sources: BTreeSet::from([EnergySource::Electricity]),
//!     energy_provider: "MSEDCL".to_string(),
//!     appliances: vec![Appliance {
//!         name: "Refrigerator".to_string(),
//!         power_watts: dec!(150),
//!         usage_hours_per_day: dec!(24),
//!     }],
//!     peak_usage_time: PeakUsageTime::Evening,
//!     high_consumption_season: Season::Summer,
//!     monthly_bill: dec!(2400),
//!     created_at: Utc::now(),
//!     updated_at: Utc::now(),
//! };
//!
//! let analyzer = EnergyAnalyzer::new(AnalyticsConfig::default()).unwrap();
//! let Analytics::Report(report) = analyzer.analyze(Some(&record)).unwrap() else {
//!     panic!("record is present");
//! };
//!
//! assert_eq!(report.carbon_footprint.footprint_kg, dec!(120));
//! assert_eq!(report.consumption_level, ConsumptionLevel::Low);
//! assert!(matches!(analyzer.analyze(None), Ok(Analytics::NoData)));
//! ```

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::common::round_half_up;
use super::footprint::{
    CarbonFootprint, ConsumptionLevel, carbon_footprint, consumption_level, energy_intensity,
};
use super::tips::{Tip, generate_tips};
use crate::models::{EnergyRecord, PeakUsageTime, Season};

/// Price per kWh in the record's currency (₹).
pub const DEFAULT_PRICE_PER_KWH: Decimal = dec!(8);

/// Average kilograms of CO₂ emitted per kWh of grid electricity.
pub const CO2_KG_PER_KWH: Decimal = dec!(0.4);

const WATT_HOURS_PER_KWH: Decimal = dec!(1000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub price_per_kwh: Decimal,
    pub co2_kg_per_kwh: Decimal,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            price_per_kwh: DEFAULT_PRICE_PER_KWH,
            co2_kg_per_kwh: CO2_KG_PER_KWH,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("price per kWh must be positive, got {0}")]
    InvalidPricePerKwh(Decimal),

    #[error("CO₂ per kWh must not be negative, got {0}")]
    InvalidEmissionFactor(Decimal),

    #[error("{0} is too large to compute; please update your energy information")]
    Overflow(&'static str),
}

/// Daily energy drawn by one appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplianceUsage {
    pub name: String,
    pub power_watts: Decimal,
    pub usage_hours_per_day: Decimal,
    pub daily_kwh: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyReport {
    pub monthly_bill: Decimal,
    pub carbon_footprint: CarbonFootprint,
    /// Bill per square foot, rounded to cents.
    pub energy_intensity: Decimal,
    pub consumption_level: ConsumptionLevel,
    pub active_sources: usize,
    pub peak_usage_time: PeakUsageTime,
    pub high_consumption_season: Season,
    pub occupants: u32,
    pub appliances: Vec<ApplianceUsage>,
    pub total_appliance_daily_kwh: Decimal,
    pub tips: Vec<Tip>,
}

/// Outcome of analysing whatever the store returned for an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analytics {
    /// No record has been submitted yet; callers should prompt for one.
    NoData,
    Report(EnergyReport),
}

impl Analytics {
    pub fn report(&self) -> Option<&EnergyReport> {
        match self {
            Self::NoData => None,
            Self::Report(report) => Some(report),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnergyAnalyzer {
    config: AnalyticsConfig,
}

impl EnergyAnalyzer {
    pub fn new(config: AnalyticsConfig) -> Result<Self, AnalyticsError> {
        if config.price_per_kwh <= Decimal::ZERO {
            return Err(AnalyticsError::InvalidPricePerKwh(config.price_per_kwh));
        }
        if config.co2_kg_per_kwh < Decimal::ZERO {
            return Err(AnalyticsError::InvalidEmissionFactor(config.co2_kg_per_kwh));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// # Errors
    /// [`AnalyticsError::Overflow`] when a stored value is too large for a
    /// derived metric to be represented.
    pub fn analyze(
        &self,
        record: Option<&EnergyRecord>,
    ) -> Result<Analytics, AnalyticsError> {
        match record {
            None => Ok(Analytics::NoData),
            Some(record) => self.report(record).map(Analytics::Report),
        }
    }

    pub fn report(
        &self,
        record: &EnergyRecord,
    ) -> Result<EnergyReport, AnalyticsError> {
        let appliances = record
            .appliances
            .iter()
            .map(|appliance| {
                let daily_kwh = appliance
                    .power_watts
                    .checked_mul(appliance.usage_hours_per_day)
                    .and_then(|watt_hours| watt_hours.checked_div(WATT_HOURS_PER_KWH))
                    .ok_or(AnalyticsError::Overflow("appliance energy use"))?;
                Ok(ApplianceUsage {
                    name: appliance.name.clone(),
                    power_watts: appliance.power_watts,
                    usage_hours_per_day: appliance.usage_hours_per_day,
                    daily_kwh: round_half_up(daily_kwh),
                })
            })
            .collect::<Result<Vec<_>, AnalyticsError>>()?;
        let total_appliance_daily_kwh = appliances
            .iter()
            .try_fold(Decimal::ZERO, |total, usage| total.checked_add(usage.daily_kwh))
            .ok_or(AnalyticsError::Overflow("total appliance energy use"))?;

        let footprint = carbon_footprint(
            record.monthly_bill,
            self.config.price_per_kwh,
            self.config.co2_kg_per_kwh,
        )
        .ok_or(AnalyticsError::Overflow("carbon footprint"))?;
        let intensity = energy_intensity(record.monthly_bill, record.building_size)
            .ok_or(AnalyticsError::Overflow("energy intensity"))?;
        let level = consumption_level(record.monthly_bill, record.building_size)
            .ok_or(AnalyticsError::Overflow("consumption level"))?;

        Ok(EnergyReport {
            monthly_bill: record.monthly_bill,
            carbon_footprint: footprint,
            energy_intensity: intensity,
            consumption_level: level,
            active_sources: record.energy_sources.len(),
            peak_usage_time: record.peak_usage_time,
            high_consumption_season: record.high_consumption_season,
            occupants: record.occupants,
            appliances,
            total_appliance_daily_kwh,
            tips: generate_tips(record),
        })
    }
}

impl fmt::Display for EnergyReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "Monthly energy cost:  {}", self.monthly_bill)?;
        writeln!(
            f,
            "Carbon footprint:     {} kg CO2 (~{} kWh)",
            self.carbon_footprint.footprint_kg,
            round_half_up(self.carbon_footprint.estimated_kwh)
        )?;
        writeln!(f, "Energy intensity:     {}/sq ft", self.energy_intensity)?;
        writeln!(f, "Consumption level:    {}", self.consumption_level.as_str())?;
        writeln!(f, "Energy sources:       {} active", self.active_sources)?;
        writeln!(f, "Peak usage time:      {}", self.peak_usage_time.label())?;
        writeln!(f, "High season:          {}", self.high_consumption_season.label())?;
        writeln!(f, "Occupants:            {}", self.occupants)?;
        writeln!(f, "Appliances:")?;
        if self.appliances.is_empty() {
            writeln!(f, "  No appliances specified")?;
        }
        for usage in &self.appliances {
            writeln!(
                f,
                "  {:<20} {:>8} W  {:>5} hrs/day  {:>8} kWh/day",
                usage.name, usage.power_watts, usage.usage_hours_per_day, usage.daily_kwh
            )?;
        }
        writeln!(f, "  Total: {} kWh/day", self.total_appliance_daily_kwh)?;
        writeln!(f, "Tips:")?;
        for (n, tip) in self.tips.iter().enumerate() {
            writeln!(f, "  {}. {}", n + 1, tip.message())?;
        }
        Ok(())
    }
}
