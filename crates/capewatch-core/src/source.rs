use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Upstream series providers, one per source adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Binance,
    Yahoo,
    Multpl,
}

impl ProviderId {
    pub const ALL: [Self; 3] = [Self::Binance, Self::Yahoo, Self::Multpl];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Yahoo => "yahoo",
            Self::Multpl => "multpl",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(Self::Binance),
            "yahoo" => Ok(Self::Yahoo),
            "multpl" => Ok(Self::Multpl),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

/// How the pipeline treats the total absence of a source's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    /// No timeline exists without it; an empty series fails the pipeline.
    Critical,
    /// Absence only blanks one field of each merged record.
    Optional,
    /// Absence is papered over with a fixed literal series.
    DegradedFallback,
}
