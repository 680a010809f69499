//! Common types used across Autobot

use serde::{Deserialize, Serialize};

use crate::error::AutobotError;

/// Country in which a vehicle is registered
///
/// Secondary store indices are scoped per country, so the same registration
/// number may exist once in every country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Country {
    /// Denmark
    #[default]
    Dk,
    /// Sweden
    Se,
    /// Norway
    No,
    /// Finland
    Fi,
    /// Germany
    De,
}

impl Country {
    /// Upper-case ISO 3166-1 alpha-2 code
    pub fn code(self) -> &'static str {
        match self {
            Country::Dk => "DK",
            Country::Se => "SE",
            Country::No => "NO",
            Country::Fi => "FI",
            Country::De => "DE",
        }
    }
}

impl std::str::FromStr for Country {
    type Err = AutobotError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dk" => Ok(Country::Dk),
            "se" => Ok(Country::Se),
            "no" => Ok(Country::No),
            "fi" => Ok(Country::Fi),
            "de" => Ok(Country::De),
            _ => Err(AutobotError::Config(format!("Unknown country code: {}", s))),
        }
    }
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
