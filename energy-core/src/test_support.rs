//! Fixtures shared by the unit tests in this crate.

use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use crate::models::{
    Appliance, EnergyRecord, EnergySource, PeakUsageTime, Season, UserId, UserType,
};

pub fn sample_record() -> EnergyRecord {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
    EnergyRecord {
        user_id: UserId::new("user-1"),
        user_type: UserType::Household,
        location: "Pune".to_string(),
        building_size: dec!(1000),
        occupants: 4,
        energy_sources: BTreeSet::from([EnergySource::Electricity, EnergySource::Solar]),
        energy_provider: "MSEDCL".to_string(),
        appliances: vec![
            Appliance {
                name: "Refrigerator".to_string(),
                power_watts: dec!(150),
                usage_hours_per_day: dec!(24),
            },
            Appliance {
                name: "Air conditioner".to_string(),
                power_watts: dec!(1500),
                usage_hours_per_day: dec!(6),
            },
        ],
        peak_usage_time: PeakUsageTime::Evening,
        high_consumption_season: Season::Summer,
        monthly_bill: dec!(2400),
        created_at: at,
        updated_at: at,
    }
}
