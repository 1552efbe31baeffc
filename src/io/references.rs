//! Reference table loaders

use std::path::Path;

use super::csv::{TextTable, cell, optional_cell};
use crate::error::Result;
use crate::models::{AddressReference, GeoReference, StratificationLabel};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Load the stratification label table
///
/// Expects `group_by`, `group_by_value` and `label_name` columns.
pub fn load_stratifications(path: &Path) -> Result<Vec<StratificationLabel>> {
    log_operation_start("Loading stratification labels from", path);
    let table = TextTable::read(path)?;
    let group_by = table.column_index(&["group_by"])?;
    let group_by_value = table.column_index(&["group_by_value"])?;
    let label_name = table.column_index(&["label_name", "label", "stratification"])?;

    let mut labels = Vec::with_capacity(table.num_rows());
    for batch in table.batches() {
        for row in 0..batch.num_rows() {
            let label = StratificationLabel::new(
                cell(batch, group_by, row),
                cell(batch, group_by_value, row),
                cell(batch, label_name, row),
            );
            if label.label_name.is_empty() {
                log_warning(
                    &format!("Stratification {:?} has no label, skipping", label.key()),
                    Some(path),
                );
                continue;
            }
            labels.push(label);
        }
    }
    log_operation_complete("loaded", path, labels.len(), None);
    Ok(labels)
}

/// Load the GEOID table
///
/// Expects `layer`, `name` and `geoid` columns.
pub fn load_geographies(path: &Path) -> Result<Vec<GeoReference>> {
    log_operation_start("Loading GEOID table from", path);
    let table = TextTable::read(path)?;
    let layer = table.column_index(&["layer"])?;
    let name = table.column_index(&["name"])?;
    let geoid = table.column_index(&["geoid"])?;

    let mut entries = Vec::with_capacity(table.num_rows());
    for batch in table.batches() {
        for row in 0..batch.num_rows() {
            let entry = GeoReference::new(
                cell(batch, layer, row),
                cell(batch, name, row),
                cell(batch, geoid, row),
            );
            if entry.geoid.is_empty() {
                log_warning(&format!("{:?} has no GEOID, skipping", entry.name), Some(path));
                continue;
            }
            entries.push(entry);
        }
    }
    log_operation_complete("loaded", path, entries.len(), None);
    Ok(entries)
}

/// Load the school address directory
///
/// Requires the LEA code, school code, city and ZIP columns; the
/// descriptive columns are read when present.
pub fn load_addresses(path: &Path) -> Result<Vec<AddressReference>> {
    log_operation_start("Loading school addresses from", path);
    let table = TextTable::read(path)?;
    let lea_code = table.column_index(&["lea_code", "district_code"])?;
    let school_code = table.column_index(&["school_code"])?;
    let city = table.column_index(&["city"])?;
    let zip_code = table.column_index(&["zip", "zip_code"])?;
    let district_name = table.find_column(&["district_name"]);
    let school_name = table.find_column(&["school_name"]);
    let address = table.find_column(&["address"]);
    let state = table.find_column(&["state"]);
    let county = table.find_column(&["county"]);

    let mut addresses = Vec::with_capacity(table.num_rows());
    for batch in table.batches() {
        for row in 0..batch.num_rows() {
            addresses.push(AddressReference {
                lea_code: cell(batch, lea_code, row),
                school_code: cell(batch, school_code, row),
                district_name: optional_cell(batch, district_name, row),
                school_name: optional_cell(batch, school_name, row),
                address: optional_cell(batch, address, row),
                city: cell(batch, city, row),
                state: optional_cell(batch, state, row),
                zip_code: cell(batch, zip_code, row),
                county: optional_cell(batch, county, row),
            });
        }
    }
    log_operation_complete("loaded", path, addresses.len(), None);
    Ok(addresses)
}
