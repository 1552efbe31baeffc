//! In-memory lookup maps built from the reference tables
//!
//! Every pipeline run builds its own maps and drops them when it finishes.
//! Duplicate keys keep the first entry and log the rest.

pub mod address;
pub mod geography;
pub mod stratification;

pub use address::{AddressEntry, AddressMap};
pub use geography::GeographyMap;
pub use stratification::StratificationMap;

/// Strip leading zeros from a district or school code
///
/// A code made only of zeros normalizes to `"0"`, so the result is never
/// empty for a non-empty code and normalizing twice changes nothing.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    let code = code.trim();
    let stripped = code.trim_start_matches('0');
    if stripped.is_empty() && !code.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}
