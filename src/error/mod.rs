//! Error handling for the enrollment layer pipeline.
//!
//! Per-record anomalies (lookup misses, unparseable counts) are never errors;
//! they are counted in the run diagnostics. The variants below cover the
//! scope-level failures: unreadable inputs, bad configuration and
//! persistence problems.

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for the pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error decoding CSV input or building Arrow batches
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error reading or writing Parquet output
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error converting typed rows to or from Arrow
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_arrow::Error),

    /// A required column is absent from an input file
    #[error("Missing column '{column}' in {}", path.display())]
    MissingColumn {
        /// Column that was looked for
        column: String,
        /// File that was being read
        path: PathBuf,
    },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The output store rejected a write
    #[error("Store error: {0}")]
    Store(String),
}

impl PipelineError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(error: serde_json::Error) -> Self {
        Self::Config(error.to_string())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
