//! Reading synthetic archives written with the test-utils builder.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use netcdf_parser::{ArchiveError, SourceArchive};
use test_utils::{assert_approx_eq, ArchiveBuilder};

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 3, day).unwrap()
}

#[test]
fn axes_and_times_are_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("era5.nc");
    ArchiveBuilder::new(vec![30.2, 30.1, 30.0], vec![78.0, 78.1, 78.2, 78.3])
        .daily_times(march(1), 3)
        .hourly_steps(24)
        .variable_fn("t2m", |t, s, r, c| (t * 1000 + s * 10 + r + c) as f32)
        .write(&path)
        .unwrap();

    let archive = SourceArchive::open(&path).unwrap();
    assert_eq!(archive.times().len(), 3);
    assert_eq!(archive.times()[2], Utc.with_ymd_and_hms(2021, 3, 3, 0, 0, 0).unwrap());
    assert_eq!(archive.steps().len(), 24);
    assert_eq!(archive.steps()[0], Duration::hours(1));
    assert_eq!(archive.lat().len(), 3);
    assert_eq!(archive.lon().len(), 4);
    assert!(archive.has_variable("t2m"));
    assert!(!archive.has_variable("tp"));
    assert!(archive.variable_names().iter().any(|n| n == "t2m"));

    let series = archive.load_variable("t2m").unwrap();
    let slice = series.slice(2, 5).unwrap();
    assert_eq!(slice.shape(), (3, 4));
    assert_eq!(slice.get(1, 3), Some(2054.0));
}

#[test]
fn daily_groups_skip_the_first_reference_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("era5.nc");
    ArchiveBuilder::new(vec![30.1, 30.0], vec![78.0, 78.1])
        .daily_times(march(1), 3)
        .hourly_steps(24)
        .variable_fn("tp", |_, s, _, _| s as f32)
        .write(&path)
        .unwrap();

    let series = SourceArchive::open(&path).unwrap().load_variable("tp").unwrap();
    let dates: Vec<_> = series.daily_groups().map(|g| g.date()).collect();
    assert_eq!(dates, vec![march(2), march(3)]);
}

#[test]
fn missing_variable_is_signalled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("era5.nc");
    ArchiveBuilder::new(vec![30.1, 30.0], vec![78.0, 78.1])
        .daily_times(march(1), 2)
        .hourly_steps(2)
        .variable_fn("t2m", |_, _, _, _| 1.0)
        .write(&path)
        .unwrap();

    let archive = SourceArchive::open(&path).unwrap();
    match archive.load_variable("u10") {
        Err(ArchiveError::VariableAbsent { variable, .. }) => assert_eq!(variable, "u10"),
        other => panic!("expected VariableAbsent, got {:?}", other.map(|s| s.name().to_string())),
    }
}

#[test]
fn packed_values_are_unpacked() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("packed.nc");
    let values = vec![280.0, 281.5, f32::NAN, 279.25, 280.0, 280.0, 280.0, 280.0];
    ArchiveBuilder::new(vec![30.1, 30.0], vec![78.0, 78.1])
        .daily_times(march(1), 2)
        .hourly_steps(1)
        .packed_variable("t2m", values, 0.25, 280.0, -32767)
        .write(&path)
        .unwrap();

    let series = SourceArchive::open(&path).unwrap().load_variable("t2m").unwrap();
    let slice = series.slice(0, 0).unwrap();
    assert_approx_eq!(slice.data()[1], 281.5, 1e-4);
    assert!(slice.data()[2].is_nan());
    assert_approx_eq!(slice.data()[3], 279.25, 1e-4);
}

#[test]
fn short_coordinate_names_and_unix_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.nc");
    ArchiveBuilder::new(vec![10.0, 11.0], vec![0.0, 1.0])
        .short_coordinate_names()
        .times("seconds since 1970-01-01", vec![0.0, 86_400.0])
        .steps(None, vec![1.0, 2.0])
        .variable_fn("v10", |_, _, _, _| 0.5)
        .write(&path)
        .unwrap();

    let archive = SourceArchive::open(&path).unwrap();
    assert!(archive.lat().is_ascending());
    assert_eq!(archive.steps()[1], Duration::hours(2));
    let series = archive.load_variable("v10").unwrap();
    let group = series.daily_group(1).unwrap();
    assert_eq!(group.date(), NaiveDate::from_ymd_opt(1970, 1, 2).unwrap());
    assert!(group.is_final());
}

#[test]
fn garbage_file_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.nc");
    std::fs::write(&path, b"definitely not netcdf").unwrap();
    assert!(matches!(
        SourceArchive::open(&path),
        Err(ArchiveError::UnsupportedFormat { .. })
    ));
}
