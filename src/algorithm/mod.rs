//! Core reconciliation algorithms: redaction repair, geography resolution
//! and rollup

pub mod geography;
pub mod repair;
pub mod rollup;

pub use geography::{GeoResolution, GeoResolver, GeoStrategy};
pub use repair::{RepairOptions, RepairOutcome, RepairStats, Scope, ScopeKey, ScopeKind, repair};
pub use rollup::{GroupKey, Rollup, RollupOutput, transform_period};
