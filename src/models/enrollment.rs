//! Enrollment census records
//!
//! One record is one row of the yearly enrollment census: a school (or a
//! district/statewide summary) crossed with one demographic category.

use serde::{Deserialize, Serialize};

/// Category value of the per-scope total row
pub const ALL_STUDENTS: &str = "All Students";

/// Category value carrying counts the publisher redacted
pub const UNKNOWN: &str = "Unknown";

/// Marker the publisher writes in place of a suppressed count
pub const REDACTED_COUNT: &str = "*";

/// Where a record came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordOrigin {
    /// Row read from the census file
    #[default]
    Census,
    /// "Unknown" residual created while repairing redactions
    Synthetic,
}

/// One enrollment census row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    /// School year in `YYYY-YY` form
    pub school_year: String,
    pub agency_type: String,
    pub cesa: String,
    pub county: String,
    pub district_code: String,
    pub school_code: String,
    pub grade_group: String,
    pub charter_ind: String,
    pub district_name: String,
    pub school_name: String,
    /// Demographic dimension, e.g. "Gender"
    pub group_by: String,
    /// Category within the dimension, e.g. "Female"
    pub group_by_value: String,
    /// Student count as published; anything but digits counts as zero
    pub student_count: String,
    pub percent_of_group: String,
    /// Display label resolved from the stratification table
    pub stratification: Option<String>,
    pub origin: RecordOrigin,
}

impl EnrollmentRecord {
    /// Start building a record
    #[must_use]
    pub fn builder() -> EnrollmentRecordBuilder {
        EnrollmentRecordBuilder::default()
    }

    /// Whether this row carries the scope's "All Students" total
    #[must_use]
    pub fn is_all_students(&self) -> bool {
        self.group_by == ALL_STUDENTS || self.group_by_value == ALL_STUDENTS
    }

    /// Whether this row is an "Unknown" residual category
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.group_by_value == UNKNOWN
    }

    /// Parsed student count, `None` when the published value is not a number
    #[must_use]
    pub fn parsed_count(&self) -> Option<u64> {
        parse_count(&self.student_count)
    }

    /// Student count with unparseable values treated as zero
    #[must_use]
    pub fn count(&self) -> u64 {
        self.parsed_count().unwrap_or(0)
    }

    /// Key into the stratification table
    #[must_use]
    pub fn stratification_key(&self) -> String {
        format!("{}{}", self.group_by, self.group_by_value)
    }

    /// Create an "Unknown" residual for `group_by` in this record's scope
    ///
    /// Descriptive fields are copied from `self`; the count, category and
    /// label belong to the new record.
    #[must_use]
    pub fn unknown_residual(&self, group_by: &str, count: u64) -> Self {
        Self {
            school_year: self.school_year.clone(),
            agency_type: self.agency_type.clone(),
            cesa: self.cesa.clone(),
            county: self.county.clone(),
            district_code: self.district_code.clone(),
            school_code: self.school_code.clone(),
            grade_group: self.grade_group.clone(),
            charter_ind: self.charter_ind.clone(),
            district_name: self.district_name.clone(),
            school_name: self.school_name.clone(),
            group_by: group_by.to_string(),
            group_by_value: UNKNOWN.to_string(),
            student_count: count.to_string(),
            percent_of_group: String::new(),
            stratification: None,
            origin: RecordOrigin::Synthetic,
        }
    }
}

/// Parse a published student count
///
/// Only plain digit strings are counts. Redaction markers, blanks, decimals
/// and values that overflow yield `None`.
#[must_use]
pub fn parse_count(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Builder for [`EnrollmentRecord`]
#[derive(Debug, Clone, Default)]
pub struct EnrollmentRecordBuilder {
    record: EnrollmentRecord,
}

macro_rules! builder_setters {
    ($($field:ident),* $(,)?) => {
        $(
            #[must_use]
            pub fn $field(mut self, value: impl Into<String>) -> Self {
                self.record.$field = value.into();
                self
            }
        )*
    };
}

impl EnrollmentRecordBuilder {
    builder_setters!(
        school_year,
        agency_type,
        cesa,
        county,
        district_code,
        school_code,
        grade_group,
        charter_ind,
        district_name,
        school_name,
        group_by,
        group_by_value,
        student_count,
        percent_of_group,
    );

    /// Set the category pair in one call
    #[must_use]
    pub fn category(self, group_by: impl Into<String>, group_by_value: impl Into<String>) -> Self {
        self.group_by(group_by).group_by_value(group_by_value)
    }

    /// Set the student count from a number
    #[must_use]
    pub fn count(self, count: u64) -> Self {
        self.student_count(count.to_string())
    }

    #[must_use]
    pub fn stratification(mut self, label: impl Into<String>) -> Self {
        self.record.stratification = Some(label.into());
        self
    }

    #[must_use]
    pub fn build(self) -> EnrollmentRecord {
        self.record
    }
}
