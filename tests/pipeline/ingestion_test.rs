//! CSV files through to published Parquet layers

use enrollment_layers::io::{load_addresses, load_census, load_geographies, load_stratifications};
use enrollment_layers::store::OutputStore;
use enrollment_layers::{
    Layer, MemoryRecordSource, ParquetOutputStore, PipelineConfig, PipelineError, ReferenceData,
    RunStatus, run_all_layers,
};

use crate::utils::{value_of, write_file};

const CENSUS: &str = "\
SCHOOL_YEAR,AGENCY_TYPE,CESA,COUNTY,DISTRICT_CODE,SCHOOL_CODE,GRADE_GROUP,CHARTER_IND,DISTRICT_NAME,SCHOOL_NAME,GROUP_BY,GROUP_BY_VALUE,STUDENT_COUNT,PERCENT_OF_GROUP
2023-24,,,[Statewide],,,[All],,[Statewide],[Statewide],All Students,All Students,1000,100.0
2023-24,,,[Statewide],,,[All],,[Statewide],[Statewide],Gender,Male,480,48.0
2023-24,,,[Statewide],,,[All],,[Statewide],[Statewide],Gender,Female,500,50.0
2023-24,,,[Statewide],,,[All],,[Statewide],[Statewide],Gender,Unknown,*,*
2023-24,04 District,06,Outagamie,0147,0,[All],,Appleton Area,[Districtwide],All Students,All Students,100,100.0
2023-24,04 District,06,Outagamie,0147,0,[All],,Appleton Area,[Districtwide],Gender,Male,40,40.0
2023-24,04 District,06,Outagamie,0147,0,[All],,Appleton Area,[Districtwide],Gender,Female,50,50.0
2023-24,04 District,06,Outagamie,0147,0020,Elementary,No,Appleton Area,Lincoln Elementary,All Students,All Students,30,100.0
2023-24,04 District,06,Outagamie,0147,0020,Elementary,No,Appleton Area,Lincoln Elementary,Gender,Male,12,40.0
2023-24,04 District,06,Outagamie,0147,0020,Elementary,No,Appleton Area,Lincoln Elementary,Gender,Female,*,*
";

const STRATIFICATIONS: &str = "\
group_by,group_by_value,label_name
All Students,All Students,Total
Gender,Male,Male
Gender,Female,Female
Gender,Unknown,Gender unknown
";

const GEOIDS: &str = "\
layer,name,geoid
County,\"Outagamie County, WI\",55087
Zip code,54911,54911
City or town,\"Appleton, WI\",5502375
";

const ADDRESSES: &str = "\
LEA Code,School Code,District Name,School Name,Address,City,State,Zip,County
147,20,Appleton Area,Lincoln Elementary,1000 S Mason St,Appleton,WI,54911,Outagamie
";

#[test]
fn test_census_skips_redacted_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "census.csv", CENSUS);

    let load = load_census(&path).unwrap();
    assert_eq!(load.redacted, 2);
    assert_eq!(load.records.len(), 8);
    assert!(load.records.iter().all(|r| r.stratification.is_none()));
    let lincoln = &load.records[7];
    assert_eq!(lincoln.school_code, "0020");
    assert_eq!(lincoln.student_count, "12");
    assert_eq!(lincoln.grade_group, "Elementary");
}

#[test]
fn test_missing_required_column_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "labels.csv", "group_by,label_name\nGender,Male\n");

    let err = load_stratifications(&path).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::MissingColumn { ref column, .. } if column == "group_by_value"
    ));
}

#[test]
fn test_files_to_parquet_layers() {
    let dir = tempfile::tempdir().unwrap();
    let census = load_census(&write_file(dir.path(), "census.csv", CENSUS)).unwrap();
    let references = ReferenceData {
        stratifications: load_stratifications(&write_file(
            dir.path(),
            "stratifications.csv",
            STRATIFICATIONS,
        ))
        .unwrap(),
        geographies: load_geographies(&write_file(dir.path(), "geoids.csv", GEOIDS)).unwrap(),
        addresses: load_addresses(&write_file(dir.path(), "addresses.csv", ADDRESSES)).unwrap(),
    };
    assert_eq!(references.geographies.len(), 3);
    assert_eq!(references.addresses[0].zip_code, "54911");

    let source = MemoryRecordSource::new(census.records);
    let mut store = ParquetOutputStore::open(dir.path().join("layers")).unwrap();
    let reports = run_all_layers(&source, &mut store, &references, &PipelineConfig::default());
    assert!(reports.iter().all(|r| r.is_success()), "{reports:?}");

    let state = store.layer_rows(Layer::State).unwrap();
    assert_eq!(value_of(&state, "WI", "Gender unknown"), Some(20));

    let county = store.layer_rows(Layer::County).unwrap();
    assert_eq!(value_of(&county, "55087", "Gender unknown"), Some(10));

    let region = store.layer_rows(Layer::Region).unwrap();
    assert_eq!(value_of(&region, "fox-valley", "Total"), Some(100));

    let zip = store.layer_rows(Layer::ZipCode).unwrap();
    assert_eq!(value_of(&zip, "54911", "Male"), Some(12));
    assert_eq!(value_of(&zip, "54911", "Gender unknown"), Some(18));

    let city = store.layer_rows(Layer::City).unwrap();
    assert_eq!(value_of(&city, "5502375", "Total"), Some(30));

    let region_report = reports.iter().find(|r| r.layer == Layer::Region).unwrap();
    assert_eq!(region_report.status, RunStatus::Succeeded { rows_written: 4 });
}
