//! End-to-end extraction from files on disk to exported artifacts.

use ndarray::Array2;
use ndarray_npy::ReadNpyExt;
use physio_features::{
    ArtifactPaths, ExtractionConfig, FeatureError, FeatureExporter, FeatureProcessor, RawRecord,
    RecordLoader, WindowIndex, FEATURE_NAMES,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs::{self, File};
use std::path::Path;

const BASE: i64 = 1_700_000_100;

/// Two five-minute windows at one sample per 20 s, then a sparse tail
fn recording() -> Vec<serde_json::Value> {
    let mut records: Vec<serde_json::Value> = (0..30)
        .map(|i| {
            json!({
                "Timestamp": (BASE + 20 * i) * 1000,
                "RR": [790, 810],
                "accel_x": 0.0, "accel_y": 3.0, "accel_z": 4.0,
                "Temperature": 36.0 + 0.001 * i as f64
            })
        })
        .collect();
    records.extend((0..3).map(|i| json!({"ts": BASE + 600 + 60 * i, "bpm": 70})));
    records.push(json!({"note": "sensor reset"}));
    records
}

fn write(path: &Path, text: &str) {
    fs::write(path, text).unwrap();
}

#[test]
fn test_json_container_to_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("session.json");
    write(&input, &json!({ "data": recording() }).to_string());

    let output = FeatureProcessor::new().process_path(&input).unwrap();
    assert_eq!(output.records_total, 34);
    assert_eq!(output.records_dropped, 1);
    assert_eq!(output.windows_discarded, 1);

    let paths = FeatureExporter::write_all(&output.matrix, &dir.path().join("out/features.npy")).unwrap();
    assert_eq!(paths, ArtifactPaths::for_output(&dir.path().join("out/features.npy")));

    let array = Array2::<f32>::read_npy(File::open(&paths.matrix).unwrap()).unwrap();
    assert_eq!(array.dim(), (2, 10));
    assert_eq!(array[[0, 0]], 75.0);
    assert_eq!(array[[0, 1]], 0.0);
    assert_eq!(array[[0, 4]], 5.0);
    assert_eq!(array[[0, 6]], 0.0);

    let header: Vec<String> = serde_json::from_str(&fs::read_to_string(&paths.header).unwrap()).unwrap();
    assert_eq!(header, FEATURE_NAMES);

    let index: WindowIndex = serde_json::from_str(&fs::read_to_string(&paths.windows).unwrap()).unwrap();
    assert_eq!(index.window_starts, vec![BASE as f64, (BASE + 300) as f64]);
    assert_eq!(index.window_duration_seconds, 300.0);
}

#[test]
fn test_csv_and_json_give_identical_features() {
    let dir = tempfile::tempdir().unwrap();

    let mut csv = String::from("time,HR,ax,ay,az,temp\n");
    let mut json_records = Vec::new();
    for i in 0..25 {
        let t = BASE + 12 * i;
        let hr = 60 + (i % 4);
        csv.push_str(&format!("{t},{hr},0,0,1,\n"));
        json_records.push(json!({"time": t, "HR": hr, "ax": 0, "ay": 0, "az": 1}));
    }
    let csv_path = dir.path().join("session.csv");
    let json_path = dir.path().join("session.json");
    write(&csv_path, &csv);
    write(&json_path, &serde_json::Value::Array(json_records).to_string());

    let processor = FeatureProcessor::new();
    let from_csv = processor.process_path(&csv_path).unwrap();
    let from_json = processor.process_path(&json_path).unwrap();

    assert_eq!(from_csv.sequences, from_json.sequences);
    assert_eq!(from_csv.matrix, from_json.matrix);
    assert_eq!(from_csv.matrix.len(), 1);
    assert_eq!(from_csv.matrix.rows()[0].get("temp_mean"), None);
}

#[test]
fn test_extensionless_input_falls_back_to_table() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dump");
    write(&input, "ts,rr_ms\n1,800\n2,800\n");

    let records = RecordLoader::load_path(&input).unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn test_unparseable_extensionless_input_names_formats() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dump.bin");
    write(&input, "a,b\n1,2,3\n");

    let err = FeatureProcessor::new().process_path(&input).unwrap_err();
    assert!(matches!(err, FeatureError::Load { .. }));
    assert!(err.to_string().contains("json, csv"));
}

#[test]
fn test_config_file_drives_windowing() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    write(&config_path, r#"{"window_seconds": 60, "min_samples_per_window": 2}"#);

    let config = ExtractionConfig::load(&config_path).unwrap();
    let processor = FeatureProcessor::with_config(config).unwrap();
    let records: Vec<_> = (0..6)
        .map(|i| json!({"t": BASE + 30 * i, "rr": 1000}))
        .collect();
    let records: Vec<RawRecord> = serde_json::from_value(serde_json::Value::Array(records)).unwrap();
    let output = processor.process(&records);

    assert_eq!(output.matrix.len(), 3);
    assert_eq!(output.matrix.window_index().window_duration_seconds, 60.0);
    assert_eq!(output.matrix.rows()[0].get("hr_mean_bpm"), Some(60.0));
}

#[test]
fn test_empty_recording_exports_empty_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.json");
    write(&input, "[]");

    let output = FeatureProcessor::new().process_path(&input).unwrap();
    let paths = FeatureExporter::write_all(&output.matrix, &dir.path().join("empty.npy")).unwrap();

    let array = Array2::<f32>::read_npy(File::open(&paths.matrix).unwrap()).unwrap();
    assert_eq!(array.dim(), (0, 10));
    let index: WindowIndex = serde_json::from_str(&fs::read_to_string(&paths.windows).unwrap()).unwrap();
    assert!(index.window_starts.is_empty());
}

#[test]
fn test_raw_csv_dump_matches_samples() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("session.ndjson");
    let lines: Vec<String> = recording().iter().map(|r| r.to_string()).collect();
    write(&input, &lines.join("\n"));

    let output = FeatureProcessor::new().process_path(&input).unwrap();
    let csv_path = dir.path().join("raw.csv");
    FeatureExporter::write_raw_csv(&output.sequences, &csv_path).unwrap();

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, vec!["timestamp", "hr_bpm", "rr_ms", "ax", "ay", "az", "temp"]);
    assert_eq!(reader.records().count(), output.sequences.len());
}
