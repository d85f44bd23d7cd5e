use serde::{Deserialize, Serialize};

/// Ordered so that a `BTreeSet<EnergySource>` lists sources the way the
/// intake form presents them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergySource {
    Electricity,
    Gas,
    Solar,
    Other,
}

impl EnergySource {
    pub const ALL: [EnergySource; 4] = [
        EnergySource::Electricity,
        EnergySource::Gas,
        EnergySource::Solar,
        EnergySource::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::Gas => "gas",
            Self::Solar => "solar",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "electricity" => Some(Self::Electricity),
            "gas" => Some(Self::Gas),
            "solar" => Some(Self::Solar),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Electricity => "Electricity",
            Self::Gas => "Gas",
            Self::Solar => "Solar",
            Self::Other => "Other",
        }
    }
}
