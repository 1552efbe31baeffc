//! Output replacement semantics across store implementations

use enrollment_layers::layer::pipeline::materialize;
use enrollment_layers::store::{OutputStore, RecordSource, ScopeFilter};
use enrollment_layers::{
    AggregatedOutputRow, EnrollmentRecord, Layer, MemoryOutputStore, MemoryRecordSource,
    ParquetOutputStore, PipelineConfig, PipelineError, Result, RunStatus, run_layer,
};

use crate::utils::{all_students, gender, references, statewide, value_of};

/// Store that can be told to reject writes
struct FlakyStore {
    inner: MemoryOutputStore,
    fail: bool,
}

impl OutputStore for FlakyStore {
    fn replace_layer(&mut self, layer: Layer, rows: &[AggregatedOutputRow]) -> Result<usize> {
        if self.fail {
            return Err(PipelineError::store("disk full"));
        }
        self.inner.replace_layer(layer, rows)
    }

    fn layer_rows(&self, layer: Layer) -> Result<Vec<AggregatedOutputRow>> {
        self.inner.layer_rows(layer)
    }
}

struct BrokenSource;

impl RecordSource for BrokenSource {
    fn fetch(&self, _filter: &ScopeFilter) -> Result<Vec<EnrollmentRecord>> {
        Err(PipelineError::store("connection reset"))
    }
}

fn statewide_source(total: u64, male: u64) -> MemoryRecordSource {
    MemoryRecordSource::new(vec![
        statewide(all_students(), total),
        statewide(gender("Male"), male),
    ])
}

#[test]
fn test_failed_write_keeps_prior_output() {
    let config = PipelineConfig::default();
    let mut store = FlakyStore {
        inner: MemoryOutputStore::new(),
        fail: false,
    };
    let source = statewide_source(100, 60);
    let first = run_layer(Layer::State, &source, &mut store, &references(), &config);
    assert!(first.is_success());

    store.fail = true;
    let source = statewide_source(200, 90);
    let second = run_layer(Layer::State, &source, &mut store, &references(), &config);
    match &second.status {
        RunStatus::Failed {
            operation,
            records,
            message,
        } => {
            assert_eq!(operation, "replace layer output");
            assert_eq!(*records, 3);
            assert!(message.contains("disk full"));
        }
        other => panic!("expected a failed run, got {other:?}"),
    }
    assert_eq!(second.rows_written(), 0);

    let rows = store.layer_rows(Layer::State).unwrap();
    assert_eq!(value_of(&rows, "WI", "Total"), Some(100));
    assert_eq!(value_of(&rows, "WI", "Gender unknown"), Some(40));
}

#[test]
fn test_fetch_failure_is_reported() {
    let mut store = MemoryOutputStore::new();
    let report = run_layer(
        Layer::County,
        &BrokenSource,
        &mut store,
        &references(),
        &PipelineConfig::default(),
    );
    assert_eq!(
        report.status,
        RunStatus::Failed {
            operation: "fetch enrollment records".to_string(),
            records: 0,
            message: "Store error: connection reset".to_string(),
        }
    );
}

#[test]
fn test_no_input_leaves_output_untouched() {
    let config = PipelineConfig::default();
    let mut store = MemoryOutputStore::new();
    run_layer(Layer::State, &statewide_source(100, 100), &mut store, &references(), &config);

    let empty = MemoryRecordSource::new(Vec::new());
    let report = run_layer(Layer::State, &empty, &mut store, &references(), &config);
    assert_eq!(report.status, RunStatus::NoInputData);
    assert_eq!(store.layer_rows(Layer::State).unwrap().len(), 2);
}

#[test]
fn test_invalid_rows_are_rejected_as_a_unit() {
    let mut store = MemoryOutputStore::new();
    let good = AggregatedOutputRow {
        layer: "State".to_string(),
        geoid: "WI".to_string(),
        topic: "FVDEYLCV".to_string(),
        stratification: "Total".to_string(),
        period: "2023-2024".to_string(),
        value: 10,
    };
    assert_eq!(
        materialize(&mut store, Layer::State, &[good.clone()]),
        RunStatus::Succeeded { rows_written: 1 }
    );

    let bad = AggregatedOutputRow {
        geoid: String::new(),
        ..good.clone()
    };
    let status = materialize(&mut store, Layer::State, &[good.clone(), bad]);
    assert!(matches!(status, RunStatus::Failed { records: 2, .. }));
    assert_eq!(store.layer_rows(Layer::State).unwrap(), vec![good]);
}

#[test]
fn test_parquet_store_round_trip_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::default();
    let source = statewide_source(100, 55);

    let mut memory = MemoryOutputStore::new();
    run_layer(Layer::State, &source, &mut memory, &references(), &config);

    let mut parquet = ParquetOutputStore::open(dir.path()).unwrap();
    let report = run_layer(Layer::State, &source, &mut parquet, &references(), &config);
    assert_eq!(report.rows_written(), 3);

    let reopened = ParquetOutputStore::open(dir.path()).unwrap();
    assert_eq!(
        reopened.layer_rows(Layer::State).unwrap(),
        memory.layer_rows(Layer::State).unwrap()
    );
    assert!(reopened.layer_rows(Layer::County).unwrap().is_empty());
}
