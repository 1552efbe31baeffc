//! Layer runs against in-memory sources and stores

use enrollment_layers::store::OutputStore;
use enrollment_layers::{
    Layer, MemoryOutputStore, MemoryRecordSource, PipelineConfig, RunStatus, run_all_layers,
    run_layer,
};

use crate::utils::{
    PERIOD, all_students, districtwide, gender, record, references, statewide, value_of,
};

fn run(layer: Layer, source: &MemoryRecordSource) -> (MemoryOutputStore, RunStatus) {
    let mut store = MemoryOutputStore::new();
    let report = run_layer(layer, source, &mut store, &references(), &PipelineConfig::default());
    (store, report.status)
}

#[test]
fn test_county_layer_publishes_unknown_residual() {
    let source = MemoryRecordSource::new(vec![
        districtwide("Outagamie", "0147", all_students(), 100),
        districtwide("Outagamie", "0147", gender("Male"), 40),
        districtwide("Outagamie", "0147", gender("Female"), 50),
    ]);
    let (store, status) = run(Layer::County, &source);
    assert_eq!(status, RunStatus::Succeeded { rows_written: 4 });

    let rows = store.layer_rows(Layer::County).unwrap();
    assert_eq!(value_of(&rows, "55087", "Total"), Some(100));
    assert_eq!(value_of(&rows, "55087", "Male"), Some(40));
    assert_eq!(value_of(&rows, "55087", "Female"), Some(50));
    assert_eq!(value_of(&rows, "55087", "Gender unknown"), Some(10));
    assert!(rows.iter().all(|r| r.period == PERIOD && r.layer == "County"));
    assert!(rows.iter().all(|r| r.topic == "FVDEYLCV"));
}

#[test]
fn test_county_scope_sums_districts() {
    let source = MemoryRecordSource::new(vec![
        districtwide("Outagamie", "0147", all_students(), 100),
        districtwide("Outagamie", "0147", gender("Male"), 40),
        districtwide("Outagamie", "0147", gender("Female"), 50),
        districtwide("Outagamie", "0150", all_students(), 30),
        districtwide("Outagamie", "0150", gender("Male"), 15),
        districtwide("Outagamie", "0150", gender("Female"), 15),
        districtwide("Winnebago", "3892", all_students(), 20),
        districtwide("Winnebago", "3892", gender("Male"), 20),
    ]);
    let (store, _) = run(Layer::County, &source);
    let rows = store.layer_rows(Layer::County).unwrap();

    assert_eq!(value_of(&rows, "55087", "Total"), Some(130));
    assert_eq!(value_of(&rows, "55087", "Gender unknown"), Some(10));
    assert_eq!(value_of(&rows, "55139", "Total"), Some(20));
    assert_eq!(value_of(&rows, "55139", "Gender unknown"), None);
}

#[test]
fn test_state_layer_merges_existing_unknown() {
    let source = MemoryRecordSource::new(vec![
        statewide(all_students(), 100),
        statewide(gender("Male"), 40),
        statewide(gender("Female"), 50),
        statewide(gender("Unknown"), 4),
        districtwide("Outagamie", "0147", all_students(), 500),
    ]);
    let (store, status) = run(Layer::State, &source);
    assert_eq!(status, RunStatus::Succeeded { rows_written: 4 });

    let rows = store.layer_rows(Layer::State).unwrap();
    assert_eq!(value_of(&rows, "WI", "Total"), Some(100));
    assert_eq!(value_of(&rows, "WI", "Gender unknown"), Some(10));
    let gender_sum: u64 = rows
        .iter()
        .filter(|r| r.stratification != "Total")
        .map(|r| r.value)
        .sum();
    assert_eq!(gender_sum, 100);
}

#[test]
fn test_region_layer_reconciles_across_counties() {
    let source = MemoryRecordSource::new(vec![
        districtwide("Outagamie", "0147", all_students(), 100),
        districtwide("Outagamie", "0147", gender("Male"), 40),
        districtwide("Outagamie", "0147", gender("Female"), 50),
        districtwide("Winnebago", "3892", all_students(), 60),
        districtwide("Winnebago", "3892", gender("Male"), 30),
        districtwide("Winnebago", "3892", gender("Female"), 30),
        districtwide("Dane", "3269", all_students(), 1000),
        record("Outagamie", "0147", "0020", "Lincoln Elementary", all_students(), 30),
    ]);
    let (store, _) = run(Layer::Region, &source);
    let rows = store.layer_rows(Layer::Region).unwrap();

    assert!(rows.iter().all(|r| r.geoid == "fox-valley"));
    assert_eq!(value_of(&rows, "fox-valley", "Total"), Some(160));
    assert_eq!(value_of(&rows, "fox-valley", "Male"), Some(70));
    assert_eq!(value_of(&rows, "fox-valley", "Gender unknown"), Some(10));
}

fn school_records() -> Vec<enrollment_layers::EnrollmentRecord> {
    vec![
        record("Outagamie", "0147", "0020", "Lincoln Elementary", all_students(), 30),
        record("Outagamie", "0147", "0020", "Lincoln Elementary", gender("Male"), 12),
        record("Outagamie", "0147", "0020", "Lincoln Elementary", gender("Female"), 10),
        record("Outagamie", "0147", "0040", "Edison Elementary", all_students(), 20),
        record("Outagamie", "0147", "0040", "Edison Elementary", ("Race/Ethnicity", "White"), 20),
        record("Outagamie", "9999", "0001", "Unlisted Academy", all_students(), 5),
        record("Outagamie", "9999", "0001", "Unlisted Academy", gender("Male"), 5),
        record("Winnebago", "3892", "0100", "Neenah High", all_students(), 8),
        record("Winnebago", "3892", "0100", "Neenah High", gender("Female"), 8),
        districtwide("Outagamie", "0147", all_students(), 50),
    ]
}

#[test]
fn test_zip_layer_repairs_per_school_and_backfills() {
    let source = MemoryRecordSource::new(school_records());
    let mut store = MemoryOutputStore::new();
    let report = run_layer(
        Layer::ZipCode,
        &source,
        &mut store,
        &references(),
        &PipelineConfig::default(),
    );
    assert!(report.is_success());
    assert!(report.diagnostics.address_misses > 0);
    assert!(report.diagnostics.backfilled_unknowns >= 2);

    let rows = store.layer_rows(Layer::ZipCode).unwrap();
    assert_eq!(value_of(&rows, "54911", "Total"), Some(50));
    assert_eq!(value_of(&rows, "54911", "Male"), Some(12));
    assert_eq!(value_of(&rows, "54911", "Female"), Some(10));
    // 8 redacted at Lincoln plus Edison's missing gender breakdown
    assert_eq!(value_of(&rows, "54911", "Gender unknown"), Some(28));
    assert_eq!(value_of(&rows, "54911", "White"), Some(20));
    assert_eq!(value_of(&rows, "54911", "Race unknown"), Some(30));
    assert_eq!(value_of(&rows, "54956", "Total"), Some(8));
    assert_eq!(value_of(&rows, "54956", "Race unknown"), Some(8));
    // the unlisted school contributes nowhere
    let totals: u64 = rows
        .iter()
        .filter(|r| r.stratification == "Total")
        .map(|r| r.value)
        .sum();
    assert_eq!(totals, 58);
}

#[test]
fn test_city_layer_uses_city_geoids() {
    let source = MemoryRecordSource::new(school_records());
    let (store, status) = run(Layer::City, &source);
    assert!(matches!(status, RunStatus::Succeeded { .. }));

    let rows = store.layer_rows(Layer::City).unwrap();
    assert_eq!(value_of(&rows, "5502375", "Total"), Some(50));
    assert_eq!(value_of(&rows, "5555750", "Total"), Some(8));
    assert!(rows.iter().all(|r| r.layer == "City or town"));
}

#[test]
fn test_output_rows_are_sorted_and_nonzero() {
    let source = MemoryRecordSource::new(vec![
        statewide(all_students(), 40),
        statewide(gender("Male"), 40),
        statewide(gender("Female"), 0),
    ]);
    let mut store = MemoryOutputStore::new();
    let report = run_layer(
        Layer::State,
        &source,
        &mut store,
        &references(),
        &PipelineConfig::default(),
    );
    assert_eq!(report.diagnostics.zero_groups_dropped, 1);

    let rows = store.layer_rows(Layer::State).unwrap();
    assert!(rows.iter().all(|r| r.value > 0));
    let labels: Vec<&str> = rows.iter().map(|r| r.stratification.as_str()).collect();
    assert_eq!(labels, vec!["Male", "Total"]);
}

#[test]
fn test_rerun_produces_identical_output() {
    let source = MemoryRecordSource::new(school_records());
    let mut store = MemoryOutputStore::new();
    let config = PipelineConfig::default();

    run_layer(Layer::ZipCode, &source, &mut store, &references(), &config);
    let first = store.layer_rows(Layer::ZipCode).unwrap();
    run_layer(Layer::ZipCode, &source, &mut store, &references(), &config);
    let second = store.layer_rows(Layer::ZipCode).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_run_all_layers_reports_each_layer() {
    let source = MemoryRecordSource::new(vec![
        statewide(all_students(), 100),
        statewide(gender("Male"), 100),
    ]);
    let mut store = MemoryOutputStore::new();
    let reports = run_all_layers(&source, &mut store, &references(), &PipelineConfig::default());

    let layers: Vec<Layer> = reports.iter().map(|r| r.layer).collect();
    assert_eq!(layers, Layer::ALL.to_vec());
    assert!(reports[0].is_success());
    for report in &reports[1..] {
        assert_eq!(report.status, RunStatus::NoInputData);
    }
}

#[test]
fn test_zip_without_geoid_is_excluded() {
    let mut refs = references();
    refs.addresses
        .push(crate::utils::address("0147", "0090", "Appleton", "99999"));
    let mut records = school_records();
    records.push(record("Outagamie", "0147", "0090", "Mystery School", all_students(), 7));
    records.push(record("Outagamie", "0147", "0090", "Mystery School", gender("Male"), 7));
    let source = MemoryRecordSource::new(records);

    let mut store = MemoryOutputStore::new();
    let report = run_layer(Layer::ZipCode, &source, &mut store, &refs, &PipelineConfig::default());
    assert!(report.is_success());
    assert!(report.diagnostics.geoid_misses > 0);

    let rows = store.layer_rows(Layer::ZipCode).unwrap();
    assert!(rows.iter().all(|r| r.geoid != "99999"));
    assert_eq!(value_of(&rows, "54911", "Total"), Some(50));
    assert_eq!(value_of(&rows, "54911", "Male"), Some(12));
}
