//! Domain models for enrollment records, reference tables and layer output

pub mod enrollment;
pub mod output;
pub mod reference;

pub use enrollment::{
    ALL_STUDENTS, EnrollmentRecord, EnrollmentRecordBuilder, REDACTED_COUNT, RecordOrigin,
    UNKNOWN, parse_count,
};
pub use output::{AggregatedOutputRow, Layer};
pub use reference::{AddressReference, GeoReference, StratificationLabel};
