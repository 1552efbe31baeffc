//! Configuration for the layer pipeline.
//!
//! The defaults describe the Fox Valley publication: Wisconsin statewide
//! rows, the Outagamie/Winnebago/Calumet region and the `FVDEYLCV` topic.
//! Any field can be overridden from a JSON file.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// What to do with a record whose stratification label cannot be resolved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlabeledPolicy {
    /// Leave the record out of the layer output
    #[default]
    Exclude,
    /// Publish the record under a fixed fallback label
    Fallback(String),
}

/// Configuration for the layer pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Topic tag shared by every output row
    pub topic: String,
    /// GEOID published for the statewide layer
    pub state_geoid: String,
    /// Suffix carried by county names in the GEOID table
    pub county_name_suffix: String,
    /// Suffix appended to city names before the GEOID lookup
    pub city_suffix: String,
    /// GEOID published for the region layer
    pub region_slug: String,
    /// Counties making up the region
    pub region_counties: Vec<String>,
    /// `district_name` of statewide summary rows
    pub statewide_sentinel: String,
    /// `school_name` of district summary rows
    pub districtwide_sentinel: String,
    /// Prefix marking summary rows in `school_name`
    pub summary_prefix: String,
    /// Handling of records without a stratification label
    pub unlabeled: UnlabeledPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            topic: "FVDEYLCV".to_string(),
            state_geoid: "WI".to_string(),
            county_name_suffix: " County, WI".to_string(),
            city_suffix: ", WI".to_string(),
            region_slug: "fox-valley".to_string(),
            region_counties: vec![
                "Outagamie".to_string(),
                "Winnebago".to_string(),
                "Calumet".to_string(),
            ],
            statewide_sentinel: "[Statewide]".to_string(),
            districtwide_sentinel: "[Districtwide]".to_string(),
            summary_prefix: "[".to_string(),
            unlabeled: UnlabeledPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file
    ///
    /// Fields missing from the file keep their default values.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            PipelineError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can produce meaningful output
    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(PipelineError::config("topic must not be empty"));
        }
        if self.state_geoid.trim().is_empty() || self.region_slug.trim().is_empty() {
            return Err(PipelineError::config(
                "state_geoid and region_slug must not be empty",
            ));
        }
        if self.region_counties.is_empty() {
            return Err(PipelineError::config("region_counties must list at least one county"));
        }
        if let UnlabeledPolicy::Fallback(label) = &self.unlabeled {
            if label.trim().is_empty() {
                return Err(PipelineError::config("fallback label must not be empty"));
            }
        }
        Ok(())
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Topic: {}", self.topic)?;
        writeln!(f, "  State GEOID: {}", self.state_geoid)?;
        writeln!(f, "  Region: {} ({})", self.region_slug, self.region_counties.join(", "))?;
        writeln!(f, "  County Name Suffix: {:?}", self.county_name_suffix)?;
        writeln!(f, "  City Suffix: {:?}", self.city_suffix)?;
        match &self.unlabeled {
            UnlabeledPolicy::Exclude => writeln!(f, "  Unlabeled Records: excluded")?,
            UnlabeledPolicy::Fallback(label) => {
                writeln!(f, "  Unlabeled Records: published as {label:?}")?;
            }
        }
        Ok(())
    }
}
