use serde::{Deserialize, Serialize};

/// The sections of the intake form, in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormStep {
    #[default]
    GeneralInformation,
    EnergySources,
    Appliances,
    UsagePatterns,
    Summary,
}

impl FormStep {
    pub const ALL: [FormStep; 5] = [
        FormStep::GeneralInformation,
        FormStep::EnergySources,
        FormStep::Appliances,
        FormStep::UsagePatterns,
        FormStep::Summary,
    ];

    pub const FIRST: FormStep = FormStep::GeneralInformation;
    pub const LAST: FormStep = FormStep::Summary;

    pub fn index(&self) -> usize {
        match self {
            Self::GeneralInformation => 0,
            Self::EnergySources => 1,
            Self::Appliances => 2,
            Self::UsagePatterns => 3,
            Self::Summary => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::GeneralInformation => "General Information",
            Self::EnergySources => "Energy Sources",
            Self::Appliances => "Appliances",
            Self::UsagePatterns => "Usage Patterns",
            Self::Summary => "Summary",
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_last(&self) -> bool {
        *self == Self::LAST
    }
}

/// Where a step sits relative to the current one, for progress indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Current,
    Upcoming,
}
