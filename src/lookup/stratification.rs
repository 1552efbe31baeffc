//! Stratification label lookup

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::models::{EnrollmentRecord, StratificationLabel};

/// Maps `group_by + group_by_value` to a display label
#[derive(Debug, Clone, Default)]
pub struct StratificationMap {
    labels: FxHashMap<String, String>,
}

impl StratificationMap {
    /// Build the map from the stratification table
    #[must_use]
    pub fn from_labels(labels: &[StratificationLabel]) -> Self {
        let mut map = FxHashMap::with_capacity_and_hasher(labels.len(), Default::default());
        let mut duplicates = 0usize;
        for label in labels {
            let key = label.key();
            if map.contains_key(&key) {
                duplicates += 1;
                debug!("Duplicate stratification key {key:?}, keeping first label");
                continue;
            }
            map.insert(key, label.label_name.clone());
        }
        if duplicates > 0 {
            warn!("Skipped {duplicates} duplicate stratification entries");
        }
        Self { labels: map }
    }

    /// Label for a category pair
    #[must_use]
    pub fn label_for(&self, group_by: &str, group_by_value: &str) -> Option<&str> {
        self.labels
            .get(&format!("{group_by}{group_by_value}"))
            .map(String::as_str)
    }

    /// Label for a record's category pair
    #[must_use]
    pub fn label_for_record(&self, record: &EnrollmentRecord) -> Option<&str> {
        self.label_for(&record.group_by, &record.group_by_value)
    }

    /// Resolve and store the label of a record
    ///
    /// Returns `false` and logs when the table has no label for the record's
    /// category. An existing label is kept on a miss.
    pub fn assign(&self, record: &mut EnrollmentRecord) -> bool {
        match self.label_for_record(record) {
            Some(label) => {
                record.stratification = Some(label.to_string());
                true
            }
            None => {
                warn!(
                    "No stratification found for {:?}",
                    record.stratification_key()
                );
                false
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
