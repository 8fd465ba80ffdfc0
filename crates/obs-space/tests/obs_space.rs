//! End-to-end tests: load generated files into an observation space, derive
//! variables, dump, and reload.

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use obs_common::{CommGroup, ObsError, TimeWindow};
use obs_space::{ObsSpace, GROUP_UNDEFINED};
use test_utils::ObsFileBuilder;

fn any_window() -> TimeWindow {
    TimeWindow::new(
        Utc.with_ymd_and_hms(2018, 4, 14, 21, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2018, 4, 15, 3, 0, 0).unwrap(),
    )
}

#[test]
fn test_load_observation_file() {
    test_utils::init_test_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sondes.nc");

    ObsFileBuilder::current(4, 4, 4, 1)
        .date_time(2018041500)
        .float_var("time", &[-2.0, -1.0, 0.0, 1.0])
        .float_var("air_temperature@ObsValue", &[250.0, 251.0, 252.0, 253.0])
        .int_var("scan_position@MetaData", &[1, 2, 3, 4])
        .write(&path)
        .unwrap();

    let space = ObsSpace::from_file(&path, any_window(), CommGroup::single()).unwrap();

    assert_eq!(space.nlocs(), 4);
    assert_eq!(space.nvars(), 1);
    assert!(space.has("ObsValue", "air_temperature"));
    assert!(space.has("MetaData", "scan_position"));
    // Unqualified variables land in the fallback group, and the time
    // variable brings a synthesized date along
    assert!(space.has(GROUP_UNDEFINED, "time"));
    assert!(space.has(GROUP_UNDEFINED, "date"));

    assert_eq!(
        space.get::<f32>("ObsValue", "air_temperature").unwrap(),
        vec![250.0, 251.0, 252.0, 253.0]
    );
    assert_eq!(
        space.get::<i32>(GROUP_UNDEFINED, "date").unwrap(),
        vec![20180414, 20180414, 20180415, 20180415]
    );
    assert_eq!(
        space.get::<i32>(GROUP_UNDEFINED, "time").unwrap(),
        vec![220000, 230000, 0, 10000]
    );
}

#[test]
fn test_window_filtering_shrinks_space() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("windowed.nc");

    ObsFileBuilder::current(4, 4, 4, 1)
        .date_time(2018041500)
        .float_var("time", &[-2.5, -1.5, -0.5, 0.5])
        .float_var("surface_pressure@ObsValue", &[990.0, 1000.0, 1010.0, 1020.0])
        .write(&path)
        .unwrap();

    let window = TimeWindow::new(
        Utc.with_ymd_and_hms(2018, 4, 14, 22, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2018, 4, 15, 0, 0, 0).unwrap(),
    );
    let space = ObsSpace::from_file(&path, window, CommGroup::single()).unwrap();

    // -2.5h (21:30) and +0.5h (00:30) fall outside (22:00, 00:00]
    assert_eq!(space.nlocs(), 2);
    assert_eq!(
        space.get::<f32>("ObsValue", "surface_pressure").unwrap(),
        vec![1000.0, 1010.0]
    );
}

#[test]
fn test_derived_variables() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("derive.nc");

    ObsFileBuilder::current(3, 3, 3, 1)
        .float_var("air_temperature@ObsValue", &[250.0, 251.0, 252.0])
        .write(&path)
        .unwrap();

    let mut space = ObsSpace::from_file(&path, any_window(), CommGroup::single()).unwrap();

    space.put("Derived", "omb", &[0.5_f32, -0.25, 1.0]).unwrap();
    assert_eq!(space.get::<f32>("Derived", "omb").unwrap(), vec![0.5, -0.25, 1.0]);

    // Derived records may be overwritten in place
    space.put("Derived", "omb", &[0.0_f32, 0.0, 0.0]).unwrap();
    assert_eq!(space.get::<f32>("Derived", "omb").unwrap(), vec![0.0, 0.0, 0.0]);

    // File-sourced records may not
    assert!(matches!(
        space.put("ObsValue", "air_temperature", &[0.0_f32, 0.0, 0.0]),
        Err(ObsError::ReadOnly(_))
    ));
}

#[test]
fn test_stored_date_dataset_does_not_abort_load() {
    // A file carrying its own date dataset next to a time variable produces
    // the same (group, variable) key twice: once from the stored dataset,
    // once synthesized from the time prefix. The load keeps the first and
    // moves on.
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stored_date.nc");

    ObsFileBuilder::current(2, 2, 2, 1)
        .date_time(2018041500)
        .float_var("time@MetaData", &[-1.0, -0.5])
        .int_var("date@MetaData", &[20180414, 20180414])
        .write(&path)
        .unwrap();

    let space = ObsSpace::from_file(&path, any_window(), CommGroup::single()).unwrap();
    assert!(space.has("MetaData", "date"));
    assert!(space.has("MetaData", "time"));
    assert_eq!(
        space.get::<i32>("MetaData", "date").unwrap(),
        vec![20180414, 20180414]
    );
    assert_eq!(space.get::<i32>("MetaData", "time").unwrap(), vec![230000, 233000]);
}

#[test]
fn test_multi_rank_partition_covers_all_locations() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partitioned.nc");

    ObsFileBuilder::current(7, 7, 7, 1)
        .int_var("record_number@MetaData", &[0, 1, 2, 3, 4, 5, 6])
        .write(&path)
        .unwrap();

    let mut seen = Vec::new();
    for rank in 0..3 {
        let comm = CommGroup::new(rank, 3);
        let space = ObsSpace::from_file(&path, any_window(), comm).unwrap();
        seen.extend(space.get::<i32>("MetaData", "record_number").unwrap());
    }
    seen.sort();
    assert_eq!(seen, vec![0, 1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_dump_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("input.nc");
    let out_path = dir.path().join("output.nc");

    ObsFileBuilder::current(3, 3, 3, 1)
        .float_var("air_temperature@ObsValue", &[250.0, 251.5, 253.0])
        .int_var("scan_position@MetaData", &[1, 2, 3])
        .write(&path)
        .unwrap();

    let mut space = ObsSpace::from_file(&path, any_window(), CommGroup::single()).unwrap();
    space.put("Derived", "omb", &[0.5_f32, -0.5, 0.0]).unwrap();
    // String records have no on-disk form; the dump must skip them, not fail
    space
        .put(
            "MetaData",
            "station_id",
            &["NC001".to_string(), "NC002".to_string(), "NC003".to_string()],
        )
        .unwrap();
    space.dump(&out_path).unwrap();

    let reloaded = ObsSpace::from_file(&out_path, any_window(), CommGroup::single()).unwrap();
    assert_eq!(reloaded.nlocs(), 3);
    assert_eq!(
        reloaded.get::<f32>("ObsValue", "air_temperature").unwrap(),
        vec![250.0, 251.5, 253.0]
    );
    assert_eq!(reloaded.get::<i32>("MetaData", "scan_position").unwrap(), vec![1, 2, 3]);
    assert_eq!(reloaded.get::<f32>("Derived", "omb").unwrap(), vec![0.5, -0.5, 0.0]);
    assert!(!reloaded.has("MetaData", "station_id"));
}

#[test]
fn test_dump_writes_reference_epoch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("epoch.nc");
    let out_path = dir.path().join("epoch_out.nc");

    ObsFileBuilder::current(2, 2, 2, 1)
        .date_time(2018041500)
        .float_var("latitude@MetaData", &[45.0, 46.5])
        .write(&path)
        .unwrap();

    let space = ObsSpace::from_file(&path, any_window(), CommGroup::single()).unwrap();
    space.dump(&out_path).unwrap();

    let file = netcdf::open(&out_path).unwrap();
    let attr = file.attribute("date_time").unwrap().value().unwrap();
    assert_eq!(i32::try_from(attr).unwrap(), 2018041500);
}

#[test]
fn test_unrecognized_extension_is_refused() {
    let err = ObsSpace::from_file("obs.grib2", any_window(), CommGroup::single()).unwrap_err();
    assert!(matches!(err, ObsError::UnrecognizedFormat(_)));
}
