//! School address lookup keyed by normalized district and school codes

use log::{debug, warn};
use rustc_hash::FxHashMap;

use super::normalize_code;
use crate::models::AddressReference;

/// Geography of one school
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressEntry {
    pub zip_code: String,
    pub city: String,
}

/// Maps `(lea_code, school_code)` without leading zeros to a school's address
#[derive(Debug, Clone, Default)]
pub struct AddressMap {
    entries: FxHashMap<(String, String), AddressEntry>,
}

impl AddressMap {
    #[must_use]
    pub fn from_references(references: &[AddressReference]) -> Self {
        let mut entries = FxHashMap::with_capacity_and_hasher(references.len(), Default::default());
        let mut duplicates = 0usize;
        for reference in references {
            let key = (
                normalize_code(&reference.lea_code),
                normalize_code(&reference.school_code),
            );
            if entries.contains_key(&key) {
                duplicates += 1;
                debug!("Duplicate address for district {} school {}", key.0, key.1);
                continue;
            }
            entries.insert(
                key,
                AddressEntry {
                    zip_code: reference.zip_code.trim().to_string(),
                    city: reference.city.trim().to_string(),
                },
            );
        }
        if duplicates > 0 {
            warn!("Skipped {duplicates} duplicate school address entries");
        }
        Self { entries }
    }

    /// Address of a school; codes may carry leading zeros
    #[must_use]
    pub fn lookup(&self, district_code: &str, school_code: &str) -> Option<&AddressEntry> {
        self.entries
            .get(&(normalize_code(district_code), normalize_code(school_code)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
