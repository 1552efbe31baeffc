//! End-to-end run of one layer
//!
//! fetch → label → repair → resolve geography → roll up → replace output.
//! Nothing escapes [`run_layer`] as an error: the caller gets a
//! [`LayerReport`] whose status says whether the layer was written.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;

use super::LayerSpec;
use crate::algorithm::{
    GeoResolution, GeoResolver, GroupKey, RepairOptions, Rollup, repair, transform_period,
};
use crate::config::{PipelineConfig, UnlabeledPolicy};
use crate::error::PipelineError;
use crate::lookup::{AddressMap, GeographyMap, StratificationMap};
use crate::models::{
    AddressReference, AggregatedOutputRow, EnrollmentRecord, GeoReference, Layer,
    StratificationLabel,
};
use crate::store::{OutputStore, RecordSource};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Message reported when a layer finds nothing to aggregate
pub const NO_INPUT_MESSAGE: &str =
    "No data found in the enrollment records. Please upload a file first.";

/// Reference tables a run builds its lookup maps from
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub stratifications: Vec<StratificationLabel>,
    pub geographies: Vec<GeoReference>,
    pub addresses: Vec<AddressReference>,
}

/// Outcome of a layer run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// The layer's output was replaced
    Succeeded { rows_written: usize },
    /// The layer's filter matched no records; nothing was written
    NoInputData,
    /// A stage failed; prior output is untouched
    Failed {
        operation: String,
        /// Records in flight when the stage failed
        records: usize,
        message: String,
    },
}

/// Counters for everything a run absorbed instead of failing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunDiagnostics {
    pub input_records: usize,
    pub synthesized_unknowns: usize,
    pub merged_unknowns: usize,
    pub backfilled_unknowns: usize,
    pub over_counted_dimensions: usize,
    pub scopes_without_total: usize,
    pub unparseable_counts: usize,
    /// Scopes, dimensions and output groups whose sums overflowed
    pub count_overflows: usize,
    pub label_misses: usize,
    pub unlabeled_excluded: usize,
    pub address_misses: usize,
    pub geoid_misses: usize,
    pub zero_groups_dropped: usize,
}

impl fmt::Display for RunDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "input={} unknown(+{} merged {} backfilled {}) over_counted={} no_total={} \
             unparseable={} overflows={} label_misses={} unlabeled_excluded={} \
             address_misses={} geoid_misses={} zero_groups={}",
            self.input_records,
            self.synthesized_unknowns,
            self.merged_unknowns,
            self.backfilled_unknowns,
            self.over_counted_dimensions,
            self.scopes_without_total,
            self.unparseable_counts,
            self.count_overflows,
            self.label_misses,
            self.unlabeled_excluded,
            self.address_misses,
            self.geoid_misses,
            self.zero_groups_dropped,
        )
    }
}

/// Report returned for every layer run
#[derive(Debug, Clone, Serialize)]
pub struct LayerReport {
    pub layer: Layer,
    pub status: RunStatus,
    pub diagnostics: RunDiagnostics,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl LayerReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Succeeded { .. })
    }

    #[must_use]
    pub fn rows_written(&self) -> usize {
        match self.status {
            RunStatus::Succeeded { rows_written } => rows_written,
            _ => 0,
        }
    }
}

#[derive(Debug)]
struct StageFailure {
    operation: &'static str,
    records: usize,
    error: PipelineError,
}

impl StageFailure {
    fn new(operation: &'static str, records: usize, error: PipelineError) -> Self {
        Self {
            operation,
            records,
            error,
        }
    }
}

/// Run the pipeline for one layer
///
/// Lookup maps are built from `references` for this run only. The layer's
/// previous output in `store` is replaced on success and left as it was
/// otherwise.
pub fn run_layer<S, O>(
    layer: Layer,
    source: &S,
    store: &mut O,
    references: &ReferenceData,
    config: &PipelineConfig,
) -> LayerReport
where
    S: RecordSource + ?Sized,
    O: OutputStore + ?Sized,
{
    let started_at = Utc::now();
    let start = Instant::now();
    log_operation_start("Starting layer transformation for", layer.tag());

    let mut diagnostics = RunDiagnostics::default();
    let status = match execute(layer, source, references, config, &mut diagnostics) {
        Ok(Some(rows)) => materialize(store, layer, &rows),
        Ok(None) => {
            error!("{layer}: {NO_INPUT_MESSAGE}");
            RunStatus::NoInputData
        }
        Err(failure) => {
            error!(
                "Error during {layer} layer transformation while trying to {} ({} records): {}",
                failure.operation, failure.records, failure.error
            );
            RunStatus::Failed {
                operation: failure.operation.to_string(),
                records: failure.records,
                message: failure.error.to_string(),
            }
        }
    };

    info!("{layer} layer diagnostics: {diagnostics}");
    let elapsed = start.elapsed();
    LayerReport {
        layer,
        status,
        diagnostics,
        started_at,
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
    }
}

/// Run every layer in publication order
pub fn run_all_layers<S, O>(
    source: &S,
    store: &mut O,
    references: &ReferenceData,
    config: &PipelineConfig,
) -> Vec<LayerReport>
where
    S: RecordSource + ?Sized,
    O: OutputStore + ?Sized,
{
    Layer::ALL
        .into_iter()
        .map(|layer| run_layer(layer, source, store, references, config))
        .collect()
}

/// Replace the stored output of `layer` with `rows`
///
/// Store errors are logged with the row count and returned as a failed
/// status; the store guarantees the prior rows survive them.
pub fn materialize<O>(store: &mut O, layer: Layer, rows: &[AggregatedOutputRow]) -> RunStatus
where
    O: OutputStore + ?Sized,
{
    match store.replace_layer(layer, rows) {
        Ok(rows_written) => {
            log_operation_complete("transformed", layer.tag(), rows_written, None);
            RunStatus::Succeeded { rows_written }
        }
        Err(e) => {
            error!(
                "Error during {layer} layer transformation while trying to replace layer output \
                 ({} records): {e}",
                rows.len()
            );
            RunStatus::Failed {
                operation: "replace layer output".to_string(),
                records: rows.len(),
                message: e.to_string(),
            }
        }
    }
}

/// Build the layer's rows, or `None` when its filter matches nothing
fn execute<S>(
    layer: Layer,
    source: &S,
    references: &ReferenceData,
    config: &PipelineConfig,
    diagnostics: &mut RunDiagnostics,
) -> Result<Option<Vec<AggregatedOutputRow>>, StageFailure>
where
    S: RecordSource + ?Sized,
{
    let labels = StratificationMap::from_labels(&references.stratifications);
    let counties = if layer == Layer::County {
        GeographyMap::for_layer(&references.geographies, layer, &config.county_name_suffix)
    } else {
        GeographyMap::default()
    };
    let spec = LayerSpec::for_layer(layer, config, &counties);
    let geographies = match layer {
        Layer::County => counties,
        Layer::ZipCode | Layer::City => {
            GeographyMap::for_layer(&references.geographies, layer, spec.geo_name_suffix(config))
        }
        Layer::State | Layer::Region => GeographyMap::default(),
    };
    let addresses = if spec.uses_addresses() {
        let addresses = AddressMap::from_references(&references.addresses);
        if addresses.is_empty() {
            warn!("No school addresses loaded; every {layer} record will miss its address");
        } else {
            info!("School address entries count: {}", addresses.len());
        }
        addresses
    } else {
        AddressMap::default()
    };

    let mut records = source
        .fetch(&spec.filter)
        .map_err(|e| StageFailure::new("fetch enrollment records", 0, e))?;
    info!("Filtered {layer} data count: {}", records.len());
    if records.is_empty() {
        return Ok(None);
    }
    diagnostics.input_records = records.len();
    diagnostics.label_misses += label_records(&mut records, &labels);

    let outcome = repair(
        records,
        RepairOptions {
            scope: spec.scope,
            backfill_missing_dimensions: spec.backfill,
        },
        &labels,
    );
    diagnostics.synthesized_unknowns = outcome.stats.synthesized;
    diagnostics.merged_unknowns = outcome.stats.merged;
    diagnostics.backfilled_unknowns = outcome.stats.backfilled;
    diagnostics.over_counted_dimensions = outcome.stats.over_counted;
    diagnostics.scopes_without_total = outcome.stats.missing_totals;
    diagnostics.unparseable_counts = outcome.stats.unparseable;
    diagnostics.count_overflows = outcome.stats.overflowed;
    diagnostics.label_misses += outcome.stats.label_misses;
    info!("Combined dataset count: {}", outcome.records.len());

    let resolver = GeoResolver::new(&spec.geography, &geographies, &addresses);
    let mut rollup = Rollup::new(layer, config.topic.clone());
    let mut address_misses: BTreeMap<(String, String), usize> = BTreeMap::new();
    let mut geoid_misses: BTreeMap<String, usize> = BTreeMap::new();

    for record in &outcome.records {
        let stratification = match (&record.stratification, &config.unlabeled) {
            (Some(label), _) => label.clone(),
            (None, UnlabeledPolicy::Fallback(fallback)) => fallback.clone(),
            (None, UnlabeledPolicy::Exclude) => {
                diagnostics.unlabeled_excluded += 1;
                continue;
            }
        };
        let geoid = match resolver.resolve(record) {
            GeoResolution::Resolved(geoid) => geoid,
            GeoResolution::AddressMiss => {
                diagnostics.address_misses += 1;
                *address_misses
                    .entry((record.district_code.clone(), record.school_code.clone()))
                    .or_insert(0) += 1;
                continue;
            }
            GeoResolution::GeoidMiss(place) => {
                diagnostics.geoid_misses += 1;
                *geoid_misses.entry(place).or_insert(0) += 1;
                continue;
            }
        };
        rollup.add(
            GroupKey {
                period: transform_period(&record.school_year),
                geoid,
                stratification,
            },
            record.count(),
        );
    }

    for ((district_code, school_code), count) in &address_misses {
        warn!(
            "No address details found for district {district_code} school {school_code}; \
             {count} records excluded from the {layer} layer"
        );
    }
    for (place, count) in &geoid_misses {
        warn!("GEOID not found for {place:?}; {count} records excluded from the {layer} layer");
    }
    if diagnostics.unlabeled_excluded > 0 {
        warn!(
            "{} records without a stratification label excluded from the {layer} layer",
            diagnostics.unlabeled_excluded
        );
    }

    let output = rollup.finish();
    info!(
        "Rolled {} records up into {} {layer} rows",
        output.contributions,
        output.rows.len()
    );
    diagnostics.zero_groups_dropped = output.zero_groups_dropped;
    diagnostics.count_overflows += output.overflowed_groups;
    Ok(Some(output.rows))
}

/// Give unlabeled records their stratification label
///
/// Returns the number of records left without one; each missing key is
/// logged once.
fn label_records(records: &mut [EnrollmentRecord], labels: &StratificationMap) -> usize {
    let mut misses: BTreeMap<String, usize> = BTreeMap::new();
    for record in records.iter_mut().filter(|r| r.stratification.is_none()) {
        match labels.label_for_record(record) {
            Some(label) => record.stratification = Some(label.to_string()),
            None => *misses.entry(record.stratification_key()).or_insert(0) += 1,
        }
    }
    for (key, count) in &misses {
        warn!("No stratification found for {key:?} ({count} records)");
    }
    misses.values().sum()
}
