//! Logging utilities for output and progress tracking
//!
//! This module provides standardized operation logging and the progress bar
//! used when running several layers.

pub mod log;
pub mod progress;

// Re-export commonly used functions for convenience
pub use self::log::{log_operation_complete, log_operation_start, log_warning};
pub use progress::{create_main_progress_bar, finish_progress_bar};
