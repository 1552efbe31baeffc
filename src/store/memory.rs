//! In-memory output store

use rustc_hash::FxHashMap;

use super::{OutputStore, validate_row};
use crate::error::Result;
use crate::models::{AggregatedOutputRow, Layer};

/// Output rows kept in memory, one table per layer
///
/// Writes are staged: the replacement rows are validated into a new table
/// which is swapped in only after every row passed.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutputStore {
    layers: FxHashMap<Layer, Vec<AggregatedOutputRow>>,
}

impl MemoryOutputStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputStore for MemoryOutputStore {
    fn replace_layer(&mut self, layer: Layer, rows: &[AggregatedOutputRow]) -> Result<usize> {
        let mut staged = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            validate_row(layer, index, row)?;
            staged.push(row.clone());
        }
        let written = staged.len();
        self.layers.insert(layer, staged);
        Ok(written)
    }

    fn layer_rows(&self, layer: Layer) -> Result<Vec<AggregatedOutputRow>> {
        Ok(self.layers.get(&layer).cloned().unwrap_or_default())
    }
}
