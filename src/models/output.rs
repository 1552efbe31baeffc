//! Aggregated layer output

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Geographic granularity of a published dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    State,
    Region,
    County,
    ZipCode,
    City,
}

impl Layer {
    /// All layers in publication order
    pub const ALL: [Self; 5] = [Self::State, Self::Region, Self::County, Self::ZipCode, Self::City];

    /// Layer tag written to output rows and used to filter the GEOID table
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::State => "State",
            Self::Region => "Region",
            Self::County => "County",
            Self::ZipCode => "Zip code",
            Self::City => "City or town",
        }
    }

    /// Short name used for file names and the command line
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Region => "region",
            Self::County => "county",
            Self::ZipCode => "zip",
            Self::City => "city",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Layer {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|layer| layer.slug() == wanted || layer.tag().to_ascii_lowercase() == wanted)
            .ok_or_else(|| PipelineError::config(format!("unknown layer '{s}'")))
    }
}

/// One published row: a stratification's student count for a place and period
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregatedOutputRow {
    pub layer: String,
    pub geoid: String,
    pub topic: String,
    pub stratification: String,
    /// School year widened to `YYYY-YYYY`
    pub period: String,
    pub value: u64,
}
