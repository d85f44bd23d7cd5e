//! Usage tips derived from an energy record.
//!
//! Rules are checked in a fixed order and each contributes at most one tip.
//! When fewer than [`MAX_TIPS`] rule tips apply, general tips fill the
//! remaining slots in their listed order.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::{EnergyRecord, PeakUsageTime, Season};

pub const MAX_TIPS: usize = 3;

/// Monthly bill above which the LED tip applies, in the record's currency.
pub const LED_BILL_THRESHOLD: Decimal = dec!(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tip {
    NaturalLight,
    FanWithAirConditioning,
    LedBulbs,
    PhantomLoad,
    EnergyAudit,
    EfficientAppliances,
    SealDraughts,
}

/// Fallback tips, in the order they are appended.
pub const GENERAL_TIPS: [Tip; 3] = [Tip::EnergyAudit, Tip::EfficientAppliances, Tip::SealDraughts];

impl Tip {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NaturalLight => {
                "Make the most of natural light in the afternoon and switch off lights you don't need."
            }
            Self::FanWithAirConditioning => {
                "Run ceiling fans alongside your AC in summer and set the thermostat to 24°C or higher."
            }
            Self::LedBulbs => "Switch to LED bulbs; they use up to 75% less energy than incandescent ones.",
            Self::PhantomLoad => {
                "Unplug appliances or use smart power strips to cut standby (phantom) power draw."
            }
            Self::EnergyAudit => "Schedule an energy audit to find hidden inefficiencies in your building.",
            Self::EfficientAppliances => "Choose appliances with a high efficiency rating when replacing old ones.",
            Self::SealDraughts => "Seal gaps around doors and windows to keep conditioned air inside.",
        }
    }
}

fn rule_tips(record: &EnergyRecord) -> Vec<Tip> {
    let mut tips = Vec::new();
    if record.peak_usage_time == PeakUsageTime::Afternoon {
        tips.push(Tip::NaturalLight);
    }
    if record.high_consumption_season == Season::Summer {
        tips.push(Tip::FanWithAirConditioning);
    }
    if record.monthly_bill > LED_BILL_THRESHOLD {
        tips.push(Tip::LedBulbs);
    }
    if !record.appliances.is_empty() {
        tips.push(Tip::PhantomLoad);
    }
    tips
}

/// Up to [`MAX_TIPS`] tips: matching rules first, then general tips.
pub fn generate_tips(record: &EnergyRecord) -> Vec<Tip> {
    rule_tips(record)
        .into_iter()
        .chain(GENERAL_TIPS)
        .take(MAX_TIPS)
        .collect()
}
