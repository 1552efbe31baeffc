//! Logging utilities
//!
//! This module provides standardized logging functions for operations.

use std::path::Path;

/// Something an operation works on: a file or a named target such as a layer
pub trait OperationTarget {
    fn describe(&self) -> String;
}

impl OperationTarget for Path {
    fn describe(&self) -> String {
        self.display().to_string()
    }
}

impl OperationTarget for str {
    fn describe(&self) -> String {
        self.to_string()
    }
}

/// Log an operation start with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `target` - File or named target being operated on
pub fn log_operation_start<T: OperationTarget + ?Sized>(operation: &str, target: &T) {
    log::info!("{} {}", operation, target.describe());
}

/// Log an operation completion with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `target` - File or named target that was operated on
/// * `items` - Number of items processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete<T: OperationTarget + ?Sized>(
    operation: &str,
    target: &T,
    items: usize,
    elapsed: Option<std::time::Duration>,
) {
    if let Some(duration) = elapsed {
        log::info!(
            "Successfully {} {} items from {} in {:?}",
            operation,
            items,
            target.describe(),
            duration
        );
    } else {
        log::info!(
            "Successfully {} {} items from {}",
            operation,
            items,
            target.describe()
        );
    }
}

/// Log an operation warning with consistent format
///
/// # Arguments
/// * `message` - Warning message
/// * `context` - Optional file or target related to the warning
pub fn log_warning<T: OperationTarget + ?Sized>(message: &str, context: Option<&T>) {
    if let Some(context) = context {
        log::warn!("{message}: {}", context.describe());
    } else {
        log::warn!("{message}");
    }
}
