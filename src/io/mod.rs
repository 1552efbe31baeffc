//! File ingestion for the census and its reference tables

pub mod census;
pub mod csv;
pub mod references;

pub use census::{CensusLoad, load_census};
pub use references::{load_addresses, load_geographies, load_stratifications};
