//! Per-step presence checks for the intake form.
//!
//! | Step | Required |
//! |------|----------|
//! | General Information | location, building size, occupants |
//! | Energy Sources | at least one source, provider |
//! | Appliances | at least one appliance; name, power and usage on each |
//! | Usage Patterns | peak usage time, high consumption season |
//! | Summary | monthly bill |

use thiserror::Error;

use super::draft::{ApplianceId, EnergyRecordDraft};
use super::step::FormStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Location,
    BuildingSize,
    Occupants,
    EnergySources,
    EnergyProvider,
    Appliances,
    ApplianceName(ApplianceId),
    AppliancePower(ApplianceId),
    ApplianceUsage(ApplianceId),
    PeakUsageTime,
    HighConsumptionSeason,
    MonthlyBill,
}

impl MissingField {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::BuildingSize => "building size",
            Self::Occupants => "occupants",
            Self::EnergySources => "energy sources",
            Self::EnergyProvider => "energy provider",
            Self::Appliances => "appliances",
            Self::ApplianceName(_) => "appliance name",
            Self::AppliancePower(_) => "appliance power",
            Self::ApplianceUsage(_) => "appliance usage",
            Self::PeakUsageTime => "peak usage time",
            Self::HighConsumptionSeason => "high consumption season",
            Self::MonthlyBill => "monthly bill",
        }
    }
}

/// A step could not be completed because a required field is empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", message_for(.field))]
pub struct ValidationError {
    pub step: FormStep,
    pub field: MissingField,
}

impl ValidationError {
    pub fn new(
        step: FormStep,
        field: MissingField,
    ) -> Self {
        Self { step, field }
    }

    /// The message shown to the user.
    pub fn message(&self) -> &'static str {
        message_for(&self.field)
    }
}

fn message_for(field: &MissingField) -> &'static str {
    match field {
        MissingField::Location | MissingField::BuildingSize | MissingField::Occupants => {
            "Please fill in all fields before proceeding."
        }
        MissingField::EnergySources | MissingField::EnergyProvider => {
            "Please select at least one energy source and provide your energy provider."
        }
        MissingField::Appliances => "Please add at least one appliance.",
        MissingField::ApplianceName(_)
        | MissingField::AppliancePower(_)
        | MissingField::ApplianceUsage(_) => "Please fill in all fields for each appliance.",
        MissingField::PeakUsageTime | MissingField::HighConsumptionSeason => {
            "Please select both peak usage time and high consumption season."
        }
        MissingField::MonthlyBill => "Please enter your average monthly energy bill.",
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Every required field of `step` that is still empty, in form order.
pub fn missing_fields(
    step: FormStep,
    draft: &EnergyRecordDraft,
) -> Vec<MissingField> {
    let mut missing = Vec::new();
    match step {
        FormStep::GeneralInformation => {
            if is_blank(&draft.location) {
                missing.push(MissingField::Location);
            }
            if draft.building_size.is_none() {
                missing.push(MissingField::BuildingSize);
            }
            if draft.occupants.is_none() {
                missing.push(MissingField::Occupants);
            }
        }
        FormStep::EnergySources => {
            if draft.energy_sources.is_empty() {
                missing.push(MissingField::EnergySources);
            }
            if is_blank(&draft.energy_provider) {
                missing.push(MissingField::EnergyProvider);
            }
        }
        FormStep::Appliances => {
            if draft.appliances.is_empty() {
                missing.push(MissingField::Appliances);
            }
            for appliance in &draft.appliances {
                if is_blank(&appliance.name) {
                    missing.push(MissingField::ApplianceName(appliance.id));
                }
                if appliance.power_watts.is_none() {
                    missing.push(MissingField::AppliancePower(appliance.id));
                }
                if appliance.usage_hours_per_day.is_none() {
                    missing.push(MissingField::ApplianceUsage(appliance.id));
                }
            }
        }
        FormStep::UsagePatterns => {
            if draft.peak_usage_time.is_none() {
                missing.push(MissingField::PeakUsageTime);
            }
            if draft.high_consumption_season.is_none() {
                missing.push(MissingField::HighConsumptionSeason);
            }
        }
        FormStep::Summary => {
            if draft.monthly_bill.is_none() {
                missing.push(MissingField::MonthlyBill);
            }
        }
    }
    missing
}

/// Check one step; the first missing field decides the error.
pub fn validate_step(
    step: FormStep,
    draft: &EnergyRecordDraft,
) -> Result<(), ValidationError> {
    match missing_fields(step, draft).into_iter().next() {
        Some(field) => Err(ValidationError::new(step, field)),
        None => Ok(()),
    }
}
