// Tests for loading server registries from disk and exporting canonical records

mod common;

use std::fs;
use std::io::Write;

use cleaning_report_normalizer::export::{write_table, OutputFormat};
use cleaning_report_normalizer::profiles::{RegistryError, ServerRegistry, UnitSystem};
use cleaning_report_normalizer::{Cell, ReportPipeline, RunOptions};
use common::{adjusted_at, export_csv};

const REGISTRY_JSON: &str = r#"{
    "default": {
        "name": "default",
        "units": "metric",
        "vendor_columns": false
    },
    "servers": [
        {
            "name": "GS US",
            "units": "imperial",
            "pause_time_column": true,
            "clock_offset_hours": -4
        }
    ]
}"#;

fn registry_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write registry");
    file
}

#[test]
fn test_load_registry_from_file() {
    let file = registry_file(REGISTRY_JSON);
    let registry = ServerRegistry::from_path(file.path()).unwrap();

    let us = registry.lookup("GS US");
    assert_eq!(us.units, UnitSystem::Imperial);
    assert!(us.pause_time_column);
    assert!(us.vendor_columns);
    assert_eq!(us.clock_offset_hours, -4);

    // Builtin servers are not merged in; unknown names take the file's default
    let sgv1 = registry.lookup("GS SGV1");
    assert_eq!(sgv1.units, UnitSystem::Metric);
    assert!(!sgv1.vendor_columns);
}

#[test]
fn test_missing_registry_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = ServerRegistry::from_path(dir.path().join("servers.json"));
    assert!(matches!(result, Err(RegistryError::Io(_))));
}

#[test]
fn test_malformed_registry_file() {
    let file = registry_file("{ not json");
    let result = ServerRegistry::from_path(file.path());
    assert!(matches!(result, Err(RegistryError::Json(_))));
}

#[test]
fn test_new_region_is_a_configuration_change() {
    let file = registry_file(REGISTRY_JSON);
    let pipeline = ReportPipeline::new(ServerRegistry::from_path(file.path()).unwrap());

    let csv = export_csv(UnitSystem::Imperial, &[&[("Water usage (gal)", "2")]]);
    let options = RunOptions::new("2024-01-01 00:00:00", adjusted_at(), "GS US");
    let records = pipeline.process_upload(&csv, "us_tasks.csv", &options).unwrap();

    assert_eq!(records.get(0, "water_usage"), Some(Cell::Float(7.5708)));
    let total = records.column_index("total_time").unwrap();
    assert_eq!(records.columns()[total + 1], "pause_time");
    assert!(records.has_column("vendor"));
}

#[test]
fn test_export_records_to_files() {
    let csv = export_csv(UnitSystem::Metric, &[&[("S/N", "GS-42")]]);
    let options = RunOptions::new("2024-01-01 00:00:00", adjusted_at(), "GS SGV1");
    let records = ReportPipeline::default()
        .process_upload(&csv, "tasks.csv", &options)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();

    let csv_path = dir.path().join("records.csv");
    write_table(&records, OutputFormat::Csv, fs::File::create(&csv_path).unwrap()).unwrap();
    let written = fs::read_to_string(&csv_path).unwrap();
    let mut lines = written.lines();
    assert!(lines.next().unwrap().starts_with("id,robot_name,serial_number,"));
    let first = lines.next().unwrap();
    assert!(first.starts_with("NULL,Scrubber 50,GS-42,"));
    assert!(first.contains(common::ADJUSTED_AT));

    let json_path = dir.path().join("records.json");
    write_table(&records, OutputFormat::Json, fs::File::create(&json_path).unwrap()).unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed[0]["serial_number"], "GS-42");
    assert_eq!(parsed[0]["created_at"], common::ADJUSTED_AT);
    assert_eq!(parsed[0]["id"], "NULL");
}
