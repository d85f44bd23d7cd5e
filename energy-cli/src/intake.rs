//! Intake files: the form answers written down as TOML.
//!
//! Every key is optional. Keys that are present are entered into the form in
//! step order; anything left out keeps its prefilled value (from the stored
//! record, if there is one) and is caught by step validation when required.
//!
//! ```toml
//! user_type = "household"
//! location = "Pune"
//! building_size = 1200
//! occupants = 4
//! energy_sources = ["electricity", "solar"]
//! energy_provider = "MSEDCL"
//! peak_usage_time = "evening"
//! high_consumption_season = "summer"
//! monthly_bill = "2,400"
//!
//! [[appliances]]
//! name = "Refrigerator"
//! power_watts = 150
//! usage_hours_per_day = 24
//! ```

use std::path::Path;

use energy_core::form::{ApplianceField, DraftEdit, FormSession};
use energy_core::{EnergySource, PeakUsageTime, Season, UserType};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::utils::{ParseDecimalError, parse_optional_decimal};

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid intake file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{field}: {source}")]
    Number {
        field: &'static str,
        #[source]
        source: ParseDecimalError,
    },

    #[error("{field}: {value} cannot be represented exactly")]
    OutOfRange { field: &'static str, value: f64 },
}

/// A number as typed by the user: bare TOML numbers or form-style text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl NumberInput {
    fn to_decimal(
        &self,
        field: &'static str,
    ) -> Result<Option<Decimal>, IntakeError> {
        match self {
            Self::Integer(n) => Ok(Some(Decimal::from(*n))),
            Self::Float(value) => Decimal::try_from(*value)
                .map(Some)
                .map_err(|_| IntakeError::OutOfRange {
                    field,
                    value: *value,
                }),
            Self::Text(text) => {
                parse_optional_decimal(text).map_err(|source| IntakeError::Number { field, source })
            }
        }
    }
}

fn optional_decimal(
    input: &Option<NumberInput>,
    field: &'static str,
) -> Result<Option<Decimal>, IntakeError> {
    match input {
        Some(input) => input.to_decimal(field),
        None => Ok(None),
    }
}

/// One appliance row ready to be entered into the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplianceEntry {
    pub name: String,
    pub power_watts: Option<Decimal>,
    pub usage_hours_per_day: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplianceInput {
    pub name: String,
    pub power_watts: Option<NumberInput>,
    pub usage_hours_per_day: Option<NumberInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntakeFile {
    pub user_type: Option<UserType>,
    pub location: Option<String>,
    pub building_size: Option<NumberInput>,
    pub occupants: Option<u32>,
    pub energy_sources: Vec<EnergySource>,
    pub energy_provider: Option<String>,
    pub appliances: Vec<ApplianceInput>,
    pub peak_usage_time: Option<PeakUsageTime>,
    pub high_consumption_season: Option<Season>,
    pub monthly_bill: Option<NumberInput>,
}

impl IntakeFile {
    pub fn from_toml_str(input: &str) -> Result<Self, IntakeError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, IntakeError> {
        let contents = std::fs::read_to_string(path).map_err(|source| IntakeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn appliance_entries(&self) -> Result<Vec<ApplianceEntry>, IntakeError> {
        self.appliances
            .iter()
            .map(|input| {
                Ok(ApplianceEntry {
                    name: input.name.clone(),
                    power_watts: optional_decimal(&input.power_watts, "power_watts")?,
                    usage_hours_per_day: optional_decimal(
                        &input.usage_hours_per_day,
                        "usage_hours_per_day",
                    )?,
                })
            })
            .collect()
    }

    /// Enter the answers into `form`.
    ///
    /// When the file or `extra_appliances` name any appliance, they replace
    /// the form's current appliance list; otherwise the list is left alone.
    pub fn apply_to(
        &self,
        form: &mut FormSession,
        extra_appliances: Vec<ApplianceEntry>,
    ) -> Result<(), IntakeError> {
        let building_size = optional_decimal(&self.building_size, "building_size")?;
        let monthly_bill = optional_decimal(&self.monthly_bill, "monthly_bill")?;
        let mut appliances = self.appliance_entries()?;
        appliances.extend(extra_appliances);

        // General information
        if let Some(user_type) = self.user_type {
            form.edit(DraftEdit::UserType(user_type));
        }
        if let Some(location) = &self.location {
            form.edit(DraftEdit::Location(location.clone()));
        }
        if building_size.is_some() {
            form.edit(DraftEdit::BuildingSize(building_size));
        }
        if self.occupants.is_some() {
            form.edit(DraftEdit::Occupants(self.occupants));
        }

        // Energy sources
        if !self.energy_sources.is_empty() {
            for source in EnergySource::ALL {
                let wanted = self.energy_sources.contains(&source);
                if wanted != form.draft().energy_sources.contains(&source) {
                    form.edit(DraftEdit::ToggleEnergySource(source));
                }
            }
        }
        if let Some(provider) = &self.energy_provider {
            form.edit(DraftEdit::EnergyProvider(provider.clone()));
        }

        // Appliances
        if !appliances.is_empty() {
            let existing: Vec<_> = form.draft().appliances.iter().map(|a| a.id).collect();
            for id in existing {
                form.edit(DraftEdit::RemoveAppliance(id));
            }
            for entry in appliances {
                let id = form.add_appliance();
                form.edit(DraftEdit::UpdateAppliance(id, ApplianceField::Name(entry.name)));
                form.edit(DraftEdit::UpdateAppliance(
                    id,
                    ApplianceField::PowerWatts(entry.power_watts),
                ));
                form.edit(DraftEdit::UpdateAppliance(
                    id,
                    ApplianceField::UsageHoursPerDay(entry.usage_hours_per_day),
                ));
            }
        }

        // Usage patterns
        if let Some(time) = self.peak_usage_time {
            form.edit(DraftEdit::PeakUsageTime(time));
        }
        if let Some(season) = self.high_consumption_season {
            form.edit(DraftEdit::HighConsumptionSeason(season));
        }

        if monthly_bill.is_some() {
            form.edit(DraftEdit::MonthlyBill(monthly_bill));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const FULL_INTAKE: &str = r#"
        user_type = "enterprise"
        location = "Bengaluru"
        building_size = "12,000"
        occupants = 40
        energy_sources = ["electricity", "gas"]
        energy_provider = "BESCOM"
        peak_usage_time = "24/7"
        high_consumption_season = "summer"
        monthly_bill = 85000

        [[appliances]]
        name = "Server rack"
        power_watts = 2000
        usage_hours_per_day = 24

        [[appliances]]
        name = "Lighting"
        power_watts = "1,200"
        usage_hours_per_day = 10.5
    "#;

    #[test]
    fn full_intake_fills_every_field() {
        let intake = IntakeFile::from_toml_str(FULL_INTAKE).unwrap();
        let mut form = FormSession::new();

        intake.apply_to(&mut form, Vec::new()).unwrap();

        let draft = form.draft();
        assert_eq!(draft.user_type, UserType::Enterprise);
        assert_eq!(draft.building_size, Some(dec!(12000)));
        assert_eq!(draft.occupants, Some(40));
        assert_eq!(draft.energy_sources.len(), 2);
        assert_eq!(draft.appliances.len(), 2);
        assert_eq!(draft.appliances[1].power_watts, Some(dec!(1200)));
        assert_eq!(draft.appliances[1].usage_hours_per_day, Some(dec!(10.5)));
        assert_eq!(draft.peak_usage_time, Some(PeakUsageTime::AllDay));
        assert_eq!(draft.monthly_bill, Some(dec!(85000)));
    }

    #[test]
    fn energy_sources_replace_current_selection() {
        let intake = IntakeFile::from_toml_str(r#"energy_sources = ["solar"]"#).unwrap();
        let mut form = FormSession::new();
        form.edit(DraftEdit::ToggleEnergySource(EnergySource::Gas));

        intake.apply_to(&mut form, Vec::new()).unwrap();

        assert_eq!(
            form.draft().energy_sources.iter().copied().collect::<Vec<_>>(),
            vec![EnergySource::Solar]
        );
    }

    #[test]
    fn extra_appliances_follow_file_appliances() {
        let intake = IntakeFile::from_toml_str(
            r#"
            [[appliances]]
            name = "Fan"
            power_watts = 75
            usage_hours_per_day = 8
            "#,
        )
        .unwrap();
        let extra = vec![ApplianceEntry {
            name: "Kettle".to_string(),
            power_watts: Some(dec!(2000)),
            usage_hours_per_day: Some(dec!(0.5)),
        }];
        let mut form = FormSession::new();

        intake.apply_to(&mut form, extra).unwrap();

        let names: Vec<_> = form.draft().appliances.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Fan", "Kettle"]);
    }

    #[test]
    fn appliances_replace_prefilled_list() {
        let intake = IntakeFile::from_toml_str(
            r#"
            [[appliances]]
            name = "Heater"
            "#,
        )
        .unwrap();
        let mut form = FormSession::new();
        form.add_appliance();
        form.add_appliance();

        intake.apply_to(&mut form, Vec::new()).unwrap();

        assert_eq!(form.draft().appliances.len(), 1);
        assert_eq!(form.draft().appliances[0].name, "Heater");
        assert_eq!(form.draft().appliances[0].power_watts, None);
    }

    #[test]
    fn omitted_keys_leave_form_untouched() {
        let mut form = FormSession::new();
        form.edit(DraftEdit::Location("Pune".to_string()));

        IntakeFile::default().apply_to(&mut form, Vec::new()).unwrap();

        assert_eq!(form.draft().location, "Pune");
    }

    #[test]
    fn blank_number_text_is_unanswered() {
        let intake = IntakeFile::from_toml_str(r#"monthly_bill = "  ""#).unwrap();
        let mut form = FormSession::new();

        intake.apply_to(&mut form, Vec::new()).unwrap();

        assert_eq!(form.draft().monthly_bill, None);
    }

    #[test]
    fn invalid_number_names_the_field() {
        let intake = IntakeFile::from_toml_str(r#"building_size = "huge""#).unwrap();

        let err = intake.apply_to(&mut FormSession::new(), Vec::new()).unwrap_err();

        assert!(matches!(err, IntakeError::Number { field: "building_size", .. }));
    }

    #[test]
    fn unknown_enum_value_is_rejected() {
        let result = IntakeFile::from_toml_str(r#"high_consumption_season = "monsoon""#);

        assert!(matches!(result, Err(IntakeError::Toml(_))));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = IntakeFile::from_toml_str(r#"budget_year = 2025"#);

        assert!(matches!(result, Err(IntakeError::Toml(_))));
    }
}
