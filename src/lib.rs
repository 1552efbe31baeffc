//! Redaction repair and geographic rollup of school enrollment counts.
//!
//! Published enrollment tables suppress small cells, so the categories of a
//! dimension rarely add up to the "All Students" total. This crate
//! reconciles every dimension against its total with an explicit "Unknown"
//! residual, attaches GEOIDs and stratification labels, and publishes one
//! aggregated dataset per geographic layer.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod io;
pub mod layer;
pub mod lookup;
pub mod models;
pub mod store;
pub mod utils;

// Re-export the most common types for easier use
pub use config::{PipelineConfig, UnlabeledPolicy};
pub use error::{PipelineError, Result};
pub use layer::{LayerReport, ReferenceData, RunDiagnostics, RunStatus, run_all_layers, run_layer};
pub use models::{AggregatedOutputRow, EnrollmentRecord, Layer};
pub use store::{
    MemoryOutputStore, MemoryRecordSource, OutputStore, ParquetOutputStore, RecordSource,
    ScopeFilter,
};
