//! The working copy of an energy record while the intake form is open.
//!
//! Edits go through [`EnergyRecordDraft::apply`], which returns a new draft
//! and leaves the original untouched.

use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    Appliance, EnergyRecord, EnergySource, NewEnergyRecord, PeakUsageTime, Season, UserId,
    UserType,
};

use super::step::FormStep;
use super::validation::{MissingField, ValidationError, missing_fields};

/// Identifier assigned to an appliance row when it is added.
///
/// Identifiers are never reused within a draft, so edits and removals hit
/// the intended row whatever the current ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplianceId(u64);

impl fmt::Display for ApplianceId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplianceDraft {
    pub id: ApplianceId,
    pub name: String,
    pub power_watts: Option<Decimal>,
    pub usage_hours_per_day: Option<Decimal>,
}

impl ApplianceDraft {
    fn blank(id: ApplianceId) -> Self {
        Self {
            id,
            name: String::new(),
            power_watts: None,
            usage_hours_per_day: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplianceField {
    Name(String),
    PowerWatts(Option<Decimal>),
    UsageHoursPerDay(Option<Decimal>),
}

/// One user edit to the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
    UserType(UserType),
    Location(String),
    BuildingSize(Option<Decimal>),
    Occupants(Option<u32>),
    /// Adds the source if absent, removes it if present.
    ToggleEnergySource(EnergySource),
    EnergyProvider(String),
    /// Appends a blank appliance row.
    AddAppliance,
    RemoveAppliance(ApplianceId),
    UpdateAppliance(ApplianceId, ApplianceField),
    PeakUsageTime(PeakUsageTime),
    HighConsumptionSeason(Season),
    MonthlyBill(Option<Decimal>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnergyRecordDraft {
    pub user_type: UserType,
    pub location: String,
    pub building_size: Option<Decimal>,
    pub occupants: Option<u32>,
    pub energy_sources: BTreeSet<EnergySource>,
    pub energy_provider: String,
    pub appliances: Vec<ApplianceDraft>,
    pub peak_usage_time: Option<PeakUsageTime>,
    pub high_consumption_season: Option<Season>,
    pub monthly_bill: Option<Decimal>,
    next_appliance_id: u64,
}

impl EnergyRecordDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefill a draft from a stored record, e.g. to update it.
    pub fn from_record(record: &EnergyRecord) -> Self {
        let draft = Self {
            user_type: record.user_type,
            location: record.location.clone(),
            building_size: Some(record.building_size),
            occupants: Some(record.occupants),
            energy_sources: record.energy_sources.clone(),
            energy_provider: record.energy_provider.clone(),
            peak_usage_time: Some(record.peak_usage_time),
            high_consumption_season: Some(record.high_consumption_season),
            monthly_bill: Some(record.monthly_bill),
            ..Self::default()
        };

        record.appliances.iter().fold(draft, |draft, appliance| {
            let id = draft.peek_next_appliance_id();
            draft
                .apply(DraftEdit::AddAppliance)
                .apply(DraftEdit::UpdateAppliance(
                    id,
                    ApplianceField::Name(appliance.name.clone()),
                ))
                .apply(DraftEdit::UpdateAppliance(
                    id,
                    ApplianceField::PowerWatts(Some(appliance.power_watts)),
                ))
                .apply(DraftEdit::UpdateAppliance(
                    id,
                    ApplianceField::UsageHoursPerDay(Some(appliance.usage_hours_per_day)),
                ))
        })
    }

    /// The identifier the next [`DraftEdit::AddAppliance`] will assign.
    pub fn peek_next_appliance_id(&self) -> ApplianceId {
        ApplianceId(self.next_appliance_id)
    }

    pub fn appliance(
        &self,
        id: ApplianceId,
    ) -> Option<&ApplianceDraft> {
        self.appliances.iter().find(|appliance| appliance.id == id)
    }

    /// Apply one edit, returning the updated draft.
    ///
    /// Edits addressing an unknown appliance id leave the appliances unchanged.
    pub fn apply(
        &self,
        edit: DraftEdit,
    ) -> Self {
        let mut next = self.clone();
        match edit {
            DraftEdit::UserType(user_type) => next.user_type = user_type,
            DraftEdit::Location(location) => next.location = location,
            DraftEdit::BuildingSize(size) => next.building_size = size,
            DraftEdit::Occupants(occupants) => next.occupants = occupants,
            DraftEdit::ToggleEnergySource(source) => {
                if !next.energy_sources.remove(&source) {
                    next.energy_sources.insert(source);
                }
            }
            DraftEdit::EnergyProvider(provider) => next.energy_provider = provider,
            DraftEdit::AddAppliance => {
                let id = ApplianceId(next.next_appliance_id);
                next.next_appliance_id += 1;
                next.appliances.push(ApplianceDraft::blank(id));
            }
            DraftEdit::RemoveAppliance(id) => next.appliances.retain(|appliance| appliance.id != id),
            DraftEdit::UpdateAppliance(id, field) => {
                if let Some(appliance) = next.appliances.iter_mut().find(|a| a.id == id) {
                    match field {
                        ApplianceField::Name(name) => appliance.name = name,
                        ApplianceField::PowerWatts(power) => appliance.power_watts = power,
                        ApplianceField::UsageHoursPerDay(hours) => {
                            appliance.usage_hours_per_day = hours
                        }
                    }
                }
            }
            DraftEdit::PeakUsageTime(time) => next.peak_usage_time = Some(time),
            DraftEdit::HighConsumptionSeason(season) => next.high_consumption_season = Some(season),
            DraftEdit::MonthlyBill(bill) => next.monthly_bill = bill,
        }
        next
    }

    /// Validate every step, then build the record to submit.
    pub fn to_new_record(
        &self,
        user_id: UserId,
    ) -> Result<NewEnergyRecord, ValidationError> {
        for step in FormStep::ALL {
            if let Some(field) = missing_fields(step, self).into_iter().next() {
                return Err(ValidationError::new(step, field));
            }
        }

        let appliances = self
            .appliances
            .iter()
            .map(|appliance| {
                Ok(Appliance {
                    name: appliance.name.trim().to_string(),
                    power_watts: required(
                        appliance.power_watts,
                        FormStep::Appliances,
                        MissingField::AppliancePower(appliance.id),
                    )?,
                    usage_hours_per_day: required(
                        appliance.usage_hours_per_day,
                        FormStep::Appliances,
                        MissingField::ApplianceUsage(appliance.id),
                    )?,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(NewEnergyRecord {
            user_id,
            user_type: self.user_type,
            location: self.location.trim().to_string(),
            building_size: required(
                self.building_size,
                FormStep::GeneralInformation,
                MissingField::BuildingSize,
            )?,
            occupants: required(
                self.occupants,
                FormStep::GeneralInformation,
                MissingField::Occupants,
            )?,
            energy_sources: self.energy_sources.clone(),
            energy_provider: self.energy_provider.trim().to_string(),
            appliances,
            peak_usage_time: required(
                self.peak_usage_time,
                FormStep::UsagePatterns,
                MissingField::PeakUsageTime,
            )?,
            high_consumption_season: required(
                self.high_consumption_season,
                FormStep::UsagePatterns,
                MissingField::HighConsumptionSeason,
            )?,
            monthly_bill: required(self.monthly_bill, FormStep::Summary, MissingField::MonthlyBill)?,
        })
    }
}

fn required<T>(
    value: Option<T>,
    step: FormStep,
    field: MissingField,
) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::new(step, field))
}

fn opt_display<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "—".to_string())
}

impl fmt::Display for EnergyRecordDraft {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let sources: Vec<_> = self.energy_sources.iter().map(|s| s.label()).collect();

        writeln!(f, "User type:          {}", self.user_type.as_str())?;
        writeln!(f, "Location:           {}", self.location)?;
        writeln!(f, "Building size:      {}", opt_display(&self.building_size))?;
        writeln!(
            f,
            "{}: {}",
            self.user_type.occupants_label(),
            opt_display(&self.occupants)
        )?;
        writeln!(f, "Energy sources:     {}", sources.join(", "))?;
        writeln!(f, "Energy provider:    {}", self.energy_provider)?;
        writeln!(f, "Appliances:         {}", self.appliances.len())?;
        for appliance in &self.appliances {
            writeln!(
                f,
                "  {} {}: {} W, {} hrs/day",
                appliance.id,
                appliance.name,
                opt_display(&appliance.power_watts),
                opt_display(&appliance.usage_hours_per_day)
            )?;
        }
        writeln!(
            f,
            "Peak usage time:    {}",
            opt_display(&self.peak_usage_time.map(|t| t.label()))
        )?;
        writeln!(
            f,
            "High season:        {}",
            opt_display(&self.high_consumption_season.map(|s| s.label()))
        )?;
        write!(f, "Monthly bill:       {}", opt_display(&self.monthly_bill))
    }
}
