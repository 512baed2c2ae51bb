//! Input loading for record-list and tabular recordings
//!
//! Files are either a JSON record list (optionally wrapped in a container
//! object), newline-delimited JSON, or a CSV table whose header names go
//! through the same synonym tables as JSON keys. The file extension picks the
//! parser; without a usable extension the record-list form is tried first and
//! the tabular form second.

use crate::error::FeatureError;
use crate::schema::raw_record::RawRecord;
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Container keys that may wrap a record list, in lookup order
pub const CONTAINER_KEYS: [&str; 4] = ["data", "records", "values", "rows"];

/// Supported input surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// JSON record list or container object
    Json,
    /// One JSON record per line
    Ndjson,
    /// Header row plus data rows
    Csv,
}

impl InputFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(InputFormat::Json),
            "ndjson" | "jsonl" => Some(InputFormat::Ndjson),
            "csv" => Some(InputFormat::Csv),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Json => "json",
            InputFormat::Ndjson => "ndjson",
            InputFormat::Csv => "csv",
        }
    }
}

/// Loader turning input files into raw records
pub struct RecordLoader;

impl RecordLoader {
    /// Load all records from a file, detecting the format from its extension
    pub fn load_path(path: &Path) -> Result<Vec<RawRecord>, FeatureError> {
        let text = fs::read_to_string(path)?;
        Self::load_str(&text, InputFormat::from_path(path), path)
    }

    /// Parse already-read input text.
    ///
    /// `origin` only names the source in errors.
    pub fn load_str(
        text: &str,
        hint: Option<InputFormat>,
        origin: &Path,
    ) -> Result<Vec<RawRecord>, FeatureError> {
        let records = match hint {
            Some(InputFormat::Json) => Self::parse_json(text)?,
            Some(InputFormat::Ndjson) => Self::parse_ndjson(text)?,
            Some(InputFormat::Csv) => Self::parse_csv(text)?,
            None => Self::parse_any(text, origin)?,
        };
        debug!(
            source = %origin.display(),
            records = records.len(),
            "loaded input records"
        );
        Ok(records)
    }

    /// Try the record-list form, then the tabular form
    fn parse_any(text: &str, origin: &Path) -> Result<Vec<RawRecord>, FeatureError> {
        match Self::parse_json(text) {
            Ok(records) => return Ok(records),
            // Valid JSON with an unusable shape is not retried as a table
            Err(e @ FeatureError::Schema(_)) => return Err(e),
            Err(e) => debug!(error = %e, "input is not a JSON record list, trying CSV"),
        }
        match Self::parse_csv(text) {
            Ok(records) => Ok(records),
            Err(e) => {
                debug!(error = %e, "input is not a CSV table either");
                Err(FeatureError::Load {
                    path: origin.to_path_buf(),
                    attempted: vec![InputFormat::Json.as_str(), InputFormat::Csv.as_str()],
                })
            }
        }
    }

    /// Parse a JSON record list, container object, or map of records
    pub fn parse_json(text: &str) -> Result<Vec<RawRecord>, FeatureError> {
        let root: Value = serde_json::from_str(text)?;
        match root {
            Value::Array(items) => Ok(collect_records(items)),
            Value::Object(mut map) => {
                for key in CONTAINER_KEYS {
                    if matches!(map.get(key), Some(Value::Array(_))) {
                        if let Some(Value::Array(items)) = map.remove(key) {
                            return Ok(collect_records(items));
                        }
                    }
                }
                if map.values().all(Value::is_object) {
                    return Ok(collect_records(map.into_iter().map(|(_, v)| v)));
                }
                Err(FeatureError::Schema(
                    "top-level object without a list of records".to_string(),
                ))
            }
            other => Err(FeatureError::Schema(format!(
                "top-level JSON {} is not a record list",
                json_kind(&other)
            ))),
        }
    }

    /// Parse newline-delimited JSON records
    pub fn parse_ndjson(text: &str) -> Result<Vec<RawRecord>, FeatureError> {
        let mut records = Vec::new();
        for (line_num, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(map)) => records.push(RawRecord::new(map)),
                Ok(other) => {
                    return Err(FeatureError::Schema(format!(
                        "line {} holds a JSON {}, expected an object",
                        line_num + 1,
                        json_kind(&other)
                    )));
                }
                Err(e) => {
                    return Err(FeatureError::Schema(format!(
                        "failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Parse a CSV table with a header row
    pub fn parse_csv(text: &str) -> Result<Vec<RawRecord>, FeatureError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        if headers.is_empty() || headers.iter().all(str::is_empty) {
            return Err(FeatureError::Schema("CSV input has no header row".to_string()));
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let mut fields = Map::new();
            for (name, cell) in headers.iter().zip(row.iter()) {
                fields.insert(name.to_string(), parse_cell(cell));
            }
            records.push(RawRecord::new(fields));
        }
        Ok(records)
    }
}

/// Keep object elements as records in input order, skipping anything else
fn collect_records(items: impl IntoIterator<Item = Value>) -> Vec<RawRecord> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::Object(map) => Some(RawRecord::new(map)),
            other => {
                warn!(index, kind = json_kind(&other), "skipping non-object record");
                None
            }
        })
        .collect()
}

/// Interpret one CSV cell; empty and NaN cells are null so the column stays present
fn parse_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = cell.parse::<f64>() {
        return Number::from_f64(float).map_or(Value::Null, Value::Number);
    }
    Value::String(cell.to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::raw_record::SemanticField;
    use serde_json::json;

    #[test]
    fn test_parse_plain_record_list() {
        let records = RecordLoader::parse_json(r#"[{"ts": 1, "hr": 60}, {"ts": 2}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("hr"), Some(&json!(60)));
    }

    #[test]
    fn test_parse_container_keys_in_order() {
        let text = r#"{"rows": [{"ts": 9}], "records": [{"ts": 1}, {"ts": 2}]}"#;
        let records = RecordLoader::parse_json(text).unwrap();

        // "records" precedes "rows" in lookup order
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_map_of_records() {
        let text = r#"{"1700000000": {"hr": 60}, "1700000001": {"hr": 61}}"#;
        let records = RecordLoader::parse_json(text).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_unsupported_structure_is_schema_error() {
        let result = RecordLoader::parse_json(r#"{"device": "esp32", "count": 3}"#);
        assert!(matches!(result, Err(FeatureError::Schema(_))));

        let result = RecordLoader::parse_json("42");
        assert!(matches!(result, Err(FeatureError::Schema(_))));
    }

    #[test]
    fn test_non_object_elements_are_skipped() {
        let records = RecordLoader::parse_json(r#"[{"ts": 1}, 5, "x", {"ts": 2}]"#).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let records = RecordLoader::parse_ndjson("{\"ts\": 1}\n\n{\"ts\": 2}\n").unwrap();
        assert_eq!(records.len(), 2);

        let err = RecordLoader::parse_ndjson("{\"ts\": 1}\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_csv_with_synonym_headers() {
        let text = "Timestamp,BPM,Temperature,accelX\n1700000000,72,36.5,\n1700000001,n/a,36.6,0.1\n";
        let records = RecordLoader::parse_csv(text).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].resolve(SemanticField::Timestamp),
            Some(&json!(1_700_000_000i64))
        );
        assert_eq!(records[0].resolve(SemanticField::HeartRate), Some(&json!(72)));
        assert_eq!(records[0].resolve(SemanticField::AccelX), Some(&Value::Null));
        assert_eq!(records[1].resolve(SemanticField::HeartRate), Some(&json!("n/a")));
        assert_eq!(records[1].resolve(SemanticField::AccelX), Some(&json!(0.1)));
    }

    #[test]
    fn test_csv_empty_and_nan_cells_are_null() {
        let records = RecordLoader::parse_csv("ts,temp,rr\n1,NaN,\n").unwrap();
        assert_eq!(records[0].get("temp"), Some(&Value::Null));
        assert_eq!(records[0].get("rr"), Some(&Value::Null));
    }

    #[test]
    fn test_map_of_records_keeps_file_order() {
        let text = r#"{"b": {"ts": 2}, "a": {"ts": 1}, "1000": {"ts": 4}, "999": {"ts": 3}}"#;
        let records = RecordLoader::parse_json(text).unwrap();

        let times: Vec<&Value> = records.iter().filter_map(|r| r.get("ts")).collect();
        assert_eq!(times, vec![&json!(2), &json!(1), &json!(4), &json!(3)]);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a.JSON")), Some(InputFormat::Json));
        assert_eq!(InputFormat::from_path(Path::new("a.jsonl")), Some(InputFormat::Ndjson));
        assert_eq!(InputFormat::from_path(Path::new("a.csv")), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_path(Path::new("a.txt")), None);
        assert_eq!(InputFormat::from_path(Path::new("data")), None);
    }

    #[test]
    fn test_ambiguous_input_falls_back_to_csv() {
        let records =
            RecordLoader::load_str("ts,hr\n1,60\n2,61\n", None, Path::new("dump")).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_ambiguous_input_failing_both_is_load_error() {
        // Ragged rows make the CSV reader fail after JSON already has
        let err = RecordLoader::load_str("a,b\n1,2,3\n", None, Path::new("dump")).unwrap_err();
        match err {
            FeatureError::Load { attempted, .. } => assert_eq!(attempted, vec!["json", "csv"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ambiguous_json_with_bad_shape_stays_schema_error() {
        let err = RecordLoader::load_str(r#"{"device": "esp32"}"#, None, Path::new("dump")).unwrap_err();
        assert!(matches!(err, FeatureError::Schema(_)));
    }
}
