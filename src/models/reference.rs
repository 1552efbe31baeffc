//! Reference tables consumed read-only by the pipeline

use serde::{Deserialize, Serialize};

/// Display label for one (group_by, group_by_value) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratificationLabel {
    pub group_by: String,
    pub group_by_value: String,
    pub label_name: String,
}

impl StratificationLabel {
    #[must_use]
    pub fn new(
        group_by: impl Into<String>,
        group_by_value: impl Into<String>,
        label_name: impl Into<String>,
    ) -> Self {
        Self {
            group_by: group_by.into(),
            group_by_value: group_by_value.into(),
            label_name: label_name.into(),
        }
    }

    /// Lookup key: plain concatenation of the category pair
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}{}", self.group_by, self.group_by_value)
    }
}

/// A named place and its GEOID within one layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoReference {
    /// Layer tag, e.g. "County" or "Zip code"
    pub layer: String,
    /// Place name as published, e.g. "Outagamie County, WI" or "54911"
    pub name: String,
    pub geoid: String,
}

impl GeoReference {
    #[must_use]
    pub fn new(
        layer: impl Into<String>,
        name: impl Into<String>,
        geoid: impl Into<String>,
    ) -> Self {
        Self {
            layer: layer.into(),
            name: name.into(),
            geoid: geoid.into(),
        }
    }
}

/// One row of the school address directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressReference {
    /// District (LEA) code as published, possibly zero padded
    pub lea_code: String,
    pub school_code: String,
    pub district_name: String,
    pub school_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub county: String,
}
