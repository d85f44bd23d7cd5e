use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Household,
    Enterprise,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Household => "household",
            Self::Enterprise => "enterprise",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "household" => Some(Self::Household),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }

    /// Label for the occupant count, which depends on who fills in the form.
    pub fn occupants_label(&self) -> &'static str {
        match self {
            Self::Household => "Number of Residents",
            Self::Enterprise => "Number of Employees",
        }
    }
}
