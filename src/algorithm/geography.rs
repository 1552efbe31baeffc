//! Geography resolution for output rows

use crate::lookup::{AddressMap, GeographyMap};
use crate::models::EnrollmentRecord;

/// How a layer turns a record into a GEOID
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoStrategy {
    /// Every record maps to the same GEOID
    Constant(String),
    /// The record's county name is looked up in the county GEOID table
    CountyName,
    /// The school's ZIP code from the address directory
    ZipCode,
    /// The school's city from the address directory, plus the state suffix
    City {
        suffix: String,
    },
}

/// Result of resolving one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoResolution {
    Resolved(String),
    /// The school is not in the address directory
    AddressMiss,
    /// The place name has no GEOID in the layer's table
    GeoidMiss(String),
}

/// Resolves GEOIDs for one layer
#[derive(Debug, Clone, Copy)]
pub struct GeoResolver<'a> {
    strategy: &'a GeoStrategy,
    geographies: &'a GeographyMap,
    addresses: &'a AddressMap,
}

impl<'a> GeoResolver<'a> {
    #[must_use]
    pub fn new(
        strategy: &'a GeoStrategy,
        geographies: &'a GeographyMap,
        addresses: &'a AddressMap,
    ) -> Self {
        Self {
            strategy,
            geographies,
            addresses,
        }
    }

    #[must_use]
    pub fn resolve(&self, record: &EnrollmentRecord) -> GeoResolution {
        let place = match self.strategy {
            GeoStrategy::Constant(geoid) => return GeoResolution::Resolved(geoid.clone()),
            GeoStrategy::CountyName => record.county.trim().to_string(),
            GeoStrategy::ZipCode => {
                match self.addresses.lookup(&record.district_code, &record.school_code) {
                    Some(address) => address.zip_code.clone(),
                    None => return GeoResolution::AddressMiss,
                }
            }
            GeoStrategy::City { suffix } => {
                match self.addresses.lookup(&record.district_code, &record.school_code) {
                    Some(address) => format!("{}{suffix}", address.city),
                    None => return GeoResolution::AddressMiss,
                }
            }
        };

        match self.geographies.geoid_for(&place) {
            Some(geoid) => GeoResolution::Resolved(geoid.to_string()),
            None => GeoResolution::GeoidMiss(place),
        }
    }
}
