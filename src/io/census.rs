//! Enrollment census loader

use std::path::Path;
use std::time::Instant;

use log::info;

use super::csv::{TextTable, cell, optional_cell};
use crate::error::Result;
use crate::models::{EnrollmentRecord, REDACTED_COUNT};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Census rows read from a file
#[derive(Debug, Clone, Default)]
pub struct CensusLoad {
    pub records: Vec<EnrollmentRecord>,
    /// Rows dropped because their count was redacted
    pub redacted: usize,
}

/// Load an enrollment census CSV file
///
/// Rows whose `STUDENT_COUNT` is the redaction marker are dropped; the
/// repair step later accounts for them through the "Unknown" categories.
/// Records come back without a stratification label.
pub fn load_census(path: &Path) -> Result<CensusLoad> {
    log_operation_start("Loading enrollment census from", path);
    let start = Instant::now();
    let table = TextTable::read(path)?;

    let school_year = table.column_index(&["school_year"])?;
    let county = table.column_index(&["county"])?;
    let district_code = table.column_index(&["district_code"])?;
    let school_code = table.column_index(&["school_code"])?;
    let district_name = table.column_index(&["district_name"])?;
    let school_name = table.column_index(&["school_name"])?;
    let group_by = table.column_index(&["group_by"])?;
    let group_by_value = table.column_index(&["group_by_value"])?;
    let student_count = table.column_index(&["student_count"])?;
    let agency_type = table.find_column(&["agency_type"]);
    let cesa = table.find_column(&["cesa"]);
    let grade_group = table.find_column(&["grade_group"]);
    let charter_ind = table.find_column(&["charter_ind"]);
    let percent_of_group = table.find_column(&["percent_of_group"]);

    let mut load = CensusLoad {
        records: Vec::with_capacity(table.num_rows()),
        redacted: 0,
    };

    for batch in table.batches() {
        for row in 0..batch.num_rows() {
            let count = cell(batch, student_count, row);
            if count == REDACTED_COUNT {
                load.redacted += 1;
                continue;
            }
            load.records.push(
                EnrollmentRecord::builder()
                    .school_year(cell(batch, school_year, row))
                    .agency_type(optional_cell(batch, agency_type, row))
                    .cesa(optional_cell(batch, cesa, row))
                    .county(cell(batch, county, row))
                    .district_code(cell(batch, district_code, row))
                    .school_code(cell(batch, school_code, row))
                    .grade_group(optional_cell(batch, grade_group, row))
                    .charter_ind(optional_cell(batch, charter_ind, row))
                    .district_name(cell(batch, district_name, row))
                    .school_name(cell(batch, school_name, row))
                    .group_by(cell(batch, group_by, row))
                    .group_by_value(cell(batch, group_by_value, row))
                    .student_count(count)
                    .percent_of_group(optional_cell(batch, percent_of_group, row))
                    .build(),
            );
        }
    }

    if load.redacted > 0 {
        info!("Skipped {} redacted census rows", load.redacted);
    }
    log_operation_complete("loaded", path, load.records.len(), Some(start.elapsed()));
    Ok(load)
}
