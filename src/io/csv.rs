//! CSV reading on top of Arrow
//!
//! Every column is read as text so codes keep their leading zeros and
//! redaction markers survive until the loaders decide what to do with them.
//! Columns are matched by a normalized header name: lower case with
//! everything but letters and digits removed, so "LEA Code", "lea_code" and
//! "LEA_CODE" are the same column.

use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, StringArray};
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::{PipelineError, Result};

/// Rows per Arrow batch when reading CSV files
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Normalize a header for matching
#[must_use]
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A CSV file read into text-only record batches
#[derive(Debug)]
pub struct TextTable {
    path: std::path::PathBuf,
    headers: Vec<String>,
    batches: Vec<RecordBatch>,
}

impl TextTable {
    /// Read a CSV file with a header row
    pub fn read(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let format = Format::default().with_header(true);
        let (inferred, _) = format.infer_schema(&mut file, Some(1))?;
        file.rewind()?;

        let headers: Vec<String> = inferred.fields().iter().map(|f| f.name().clone()).collect();
        let schema = Schema::new(
            headers
                .iter()
                .map(|name| Field::new(name, DataType::Utf8, true))
                .collect::<Vec<_>>(),
        );

        let reader = ReaderBuilder::new(Arc::new(schema))
            .with_header(true)
            .with_batch_size(DEFAULT_BATCH_SIZE)
            .build(file)?;
        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            batches,
        })
    }

    /// Position of the first column whose header matches one of `aliases`
    pub fn column_index(&self, aliases: &[&str]) -> Result<usize> {
        self.find_column(aliases).ok_or_else(|| PipelineError::MissingColumn {
            column: aliases.first().copied().unwrap_or_default().to_string(),
            path: self.path.clone(),
        })
    }

    /// Like [`column_index`](Self::column_index) but for optional columns
    #[must_use]
    pub fn find_column(&self, aliases: &[&str]) -> Option<usize> {
        self.headers.iter().position(|header| {
            let header = normalize_header(header);
            aliases.iter().any(|alias| normalize_header(alias) == header)
        })
    }

    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }
}

/// Text value of a cell, empty for nulls
#[must_use]
pub fn cell(batch: &RecordBatch, column: usize, row: usize) -> String {
    let Some(values) = batch.column(column).as_any().downcast_ref::<StringArray>() else {
        return String::new();
    };
    if values.is_null(row) {
        String::new()
    } else {
        values.value(row).trim().to_string()
    }
}

/// Text value of an optional column
#[must_use]
pub fn optional_cell(batch: &RecordBatch, column: Option<usize>, row: usize) -> String {
    column.map(|c| cell(batch, c, row)).unwrap_or_default()
}
