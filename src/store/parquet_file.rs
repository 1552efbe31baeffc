//! Parquet-backed output store
//!
//! Each layer lives in its own `<slug>.parquet` file under the store root.
//! A replacement is written to a temporary file next to the target and
//! renamed over it, so readers see either the old or the new table.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use arrow::datatypes::FieldRef;
use log::{debug, warn};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_arrow::schema::{SchemaLike, TracingOptions};

use super::{OutputStore, validate_row};
use crate::error::Result;
use crate::models::{AggregatedOutputRow, Layer};

/// Output rows stored as one Parquet file per layer
#[derive(Debug, Clone)]
pub struct ParquetOutputStore {
    root: PathBuf,
}

impl ParquetOutputStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// File holding the rows of `layer`
    #[must_use]
    pub fn layer_path(&self, layer: Layer) -> PathBuf {
        self.root.join(format!("{}.parquet", layer.slug()))
    }

    fn staging_path(&self, layer: Layer) -> PathBuf {
        self.root.join(format!(".{}.parquet.tmp", layer.slug()))
    }
}

fn row_fields() -> Result<Vec<FieldRef>> {
    Ok(Vec::<FieldRef>::from_type::<AggregatedOutputRow>(
        TracingOptions::default(),
    )?)
}

fn write_rows(path: &Path, rows: &[AggregatedOutputRow]) -> Result<()> {
    let fields = row_fields()?;
    let batch = serde_arrow::to_record_batch(&fields, &rows)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

impl OutputStore for ParquetOutputStore {
    fn replace_layer(&mut self, layer: Layer, rows: &[AggregatedOutputRow]) -> Result<usize> {
        for (index, row) in rows.iter().enumerate() {
            validate_row(layer, index, row)?;
        }

        let staging = self.staging_path(layer);
        if let Err(e) = write_rows(&staging, rows) {
            if let Err(cleanup) = fs::remove_file(&staging) {
                debug!("Could not remove {}: {cleanup}", staging.display());
            }
            return Err(e);
        }

        let target = self.layer_path(layer);
        if let Err(e) = fs::rename(&staging, &target) {
            warn!("Failed to move {} into place", staging.display());
            if let Err(cleanup) = fs::remove_file(&staging) {
                debug!("Could not remove {}: {cleanup}", staging.display());
            }
            return Err(e.into());
        }

        debug!("Wrote {} rows to {}", rows.len(), target.display());
        Ok(rows.len())
    }

    fn layer_rows(&self, layer: Layer) -> Result<Vec<AggregatedOutputRow>> {
        let path = self.layer_path(layer);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let mut rows = Vec::new();
        for batch in reader {
            let batch = batch?;
            let mut decoded: Vec<AggregatedOutputRow> = serde_arrow::from_record_batch(&batch)?;
            rows.append(&mut decoded);
        }
        Ok(rows)
    }
}
