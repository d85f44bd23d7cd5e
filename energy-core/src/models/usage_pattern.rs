use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakUsageTime {
    Morning,
    Afternoon,
    Evening,
    #[serde(rename = "24/7")]
    AllDay,
}

impl PeakUsageTime {
    pub const ALL: [PeakUsageTime; 4] = [
        PeakUsageTime::Morning,
        PeakUsageTime::Afternoon,
        PeakUsageTime::Evening,
        PeakUsageTime::AllDay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::AllDay => "24/7",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            "24/7" => Some(Self::AllDay),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::AllDay => "24/7",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Summer,
    Winter,
    Spring,
    Fall,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Summer, Season::Winter, Season::Spring, Season::Fall];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summer => "summer",
            Self::Winter => "winter",
            Self::Spring => "spring",
            Self::Fall => "fall",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "summer" => Some(Self::Summer),
            "winter" => Some(Self::Winter),
            "spring" => Some(Self::Spring),
            "fall" => Some(Self::Fall),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Summer => "Summer",
            Self::Winter => "Winter",
            Self::Spring => "Spring",
            Self::Fall => "Fall",
        }
    }
}
