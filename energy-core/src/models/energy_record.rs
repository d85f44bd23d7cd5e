use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EnergySource, PeakUsageTime, Season, UserId, UserType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appliance {
    pub name: String,
    pub power_watts: Decimal,
    pub usage_hours_per_day: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyRecord {
    pub user_id: UserId,

    // General information
    pub user_type: UserType,
    pub location: String,
    pub building_size: Decimal,
    pub occupants: u32,

    // Energy sources
    pub energy_sources: BTreeSet<EnergySource>,
    pub energy_provider: String,

    pub appliances: Vec<Appliance>,

    // Usage patterns
    pub peak_usage_time: PeakUsageTime,
    pub high_consumption_season: Season,

    pub monthly_bill: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// For submitting a record (no timestamps; the store assigns them)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEnergyRecord {
    pub user_id: UserId,
    pub user_type: UserType,
    pub location: String,
    pub building_size: Decimal,
    pub occupants: u32,
    pub energy_sources: BTreeSet<EnergySource>,
    pub energy_provider: String,
    pub appliances: Vec<Appliance>,
    pub peak_usage_time: PeakUsageTime,
    pub high_consumption_season: Season,
    pub monthly_bill: Decimal,
}

impl EnergyRecord {
    /// Combine submitted values with store-assigned timestamps.
    pub fn from_new(
        record: NewEnergyRecord,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: record.user_id,
            user_type: record.user_type,
            location: record.location,
            building_size: record.building_size,
            occupants: record.occupants,
            energy_sources: record.energy_sources,
            energy_provider: record.energy_provider,
            appliances: record.appliances,
            peak_usage_time: record.peak_usage_time,
            high_consumption_season: record.high_consumption_season,
            monthly_bill: record.monthly_bill,
            created_at,
            updated_at,
        }
    }
}
