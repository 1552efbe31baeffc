//! In-memory record source

use super::{RecordSource, ScopeFilter};
use crate::error::Result;
use crate::models::EnrollmentRecord;

/// Enrollment records held in memory, e.g. straight from a census file
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    records: Vec<EnrollmentRecord>,
}

impl MemoryRecordSource {
    #[must_use]
    pub fn new(records: Vec<EnrollmentRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSource for MemoryRecordSource {
    fn fetch(&self, filter: &ScopeFilter) -> Result<Vec<EnrollmentRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}
