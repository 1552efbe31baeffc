//! Record sources and output stores
//!
//! The pipeline reads scope-filtered enrollment records through
//! [`RecordSource`] and replaces a layer's output through [`OutputStore`].
//! Writers take `&mut self`, so one store serves one layer run at a time.

pub mod memory;
pub mod parquet_file;
pub mod source;

pub use memory::MemoryOutputStore;
pub use parquet_file::ParquetOutputStore;
pub use source::MemoryRecordSource;

use crate::error::{PipelineError, Result};
use crate::models::{AggregatedOutputRow, EnrollmentRecord, Layer};

/// Predicate on a name column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePredicate {
    Equals(String),
    EqualsIgnoreCase(String),
    NotStartingWith(String),
}

impl NamePredicate {
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Equals(expected) => value == expected,
            Self::EqualsIgnoreCase(expected) => value.eq_ignore_ascii_case(expected),
            Self::NotStartingWith(prefix) => !value.starts_with(prefix.as_str()),
        }
    }
}

/// Selection of the enrollment records a layer works on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilter {
    /// Keep only these counties
    pub counties: Option<Vec<String>>,
    pub school_name: Option<NamePredicate>,
    pub district_name: Option<NamePredicate>,
}

impl ScopeFilter {
    /// Filter that keeps every record
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_counties<I, S>(mut self, counties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.counties = Some(counties.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_school_name(mut self, predicate: NamePredicate) -> Self {
        self.school_name = Some(predicate);
        self
    }

    #[must_use]
    pub fn with_district_name(mut self, predicate: NamePredicate) -> Self {
        self.district_name = Some(predicate);
        self
    }

    #[must_use]
    pub fn matches(&self, record: &EnrollmentRecord) -> bool {
        if let Some(counties) = &self.counties {
            if !counties.iter().any(|county| *county == record.county) {
                return false;
            }
        }
        if let Some(predicate) = &self.school_name {
            if !predicate.matches(&record.school_name) {
                return false;
            }
        }
        if let Some(predicate) = &self.district_name {
            if !predicate.matches(&record.district_name) {
                return false;
            }
        }
        true
    }
}

/// Read access to the enrollment census
pub trait RecordSource {
    /// Records matching `filter`, in storage order
    fn fetch(&self, filter: &ScopeFilter) -> Result<Vec<EnrollmentRecord>>;
}

/// Storage for layer output
pub trait OutputStore {
    /// Replace every stored row of `layer` with `rows` as one atomic unit
    ///
    /// On error the previously stored rows are left untouched. Returns the
    /// number of rows written.
    fn replace_layer(&mut self, layer: Layer, rows: &[AggregatedOutputRow]) -> Result<usize>;

    /// Rows currently stored for `layer`
    fn layer_rows(&self, layer: Layer) -> Result<Vec<AggregatedOutputRow>>;
}

/// Constraints every stored row must satisfy
pub fn validate_row(layer: Layer, index: usize, row: &AggregatedOutputRow) -> Result<()> {
    if row.layer != layer.tag() {
        return Err(PipelineError::store(format!(
            "row {index} is tagged {:?} but is being written to layer {:?}",
            row.layer,
            layer.tag()
        )));
    }
    if row.geoid.trim().is_empty() {
        return Err(PipelineError::store(format!("row {index} has an empty geoid")));
    }
    if row.stratification.trim().is_empty() {
        return Err(PipelineError::store(format!(
            "row {index} has an empty stratification"
        )));
    }
    Ok(())
}
