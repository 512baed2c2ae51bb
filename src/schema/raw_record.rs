//! Raw sensor records and field synonym resolution
//!
//! Input records are loosely keyed maps: the same quantity shows up as `hr`,
//! `HR` or `bpm` depending on which firmware or export produced the file.
//! Each semantic field has one ordered synonym list, matched case-insensitively,
//! and the first synonym present in a record wins.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Semantic fields the pipeline understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticField {
    Timestamp,
    BeatInterval,
    HeartRate,
    AccelX,
    AccelY,
    AccelZ,
    Temperature,
}

impl SemanticField {
    /// Every field, in resolution order
    pub const ALL: [SemanticField; 7] = [
        SemanticField::Timestamp,
        SemanticField::BeatInterval,
        SemanticField::HeartRate,
        SemanticField::AccelX,
        SemanticField::AccelY,
        SemanticField::AccelZ,
        SemanticField::Temperature,
    ];

    /// Accepted key spellings, highest precedence first
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            SemanticField::Timestamp => &["ts", "timestamp", "time", "t"],
            SemanticField::BeatInterval => &["rr_ms", "rr"],
            SemanticField::HeartRate => &["hr", "bpm"],
            SemanticField::AccelX => &["ax", "accel_x", "accelx", "x"],
            SemanticField::AccelY => &["ay", "accel_y", "accely", "y"],
            SemanticField::AccelZ => &["az", "accel_z", "accelz", "z"],
            SemanticField::Temperature => &["temp", "temperature"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticField::Timestamp => "timestamp",
            SemanticField::BeatInterval => "beat_interval",
            SemanticField::HeartRate => "heart_rate",
            SemanticField::AccelX => "accel_x",
            SemanticField::AccelY => "accel_y",
            SemanticField::AccelZ => "accel_z",
            SemanticField::Temperature => "temperature",
        }
    }
}

/// One input record: an unordered map from field name to a scalar or small list.
///
/// No field is required. Absent and unusable values both resolve to "missing"
/// downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Find the record key matching the first candidate present, ignoring case.
    ///
    /// When several keys of one record differ only in case (`HR` and `hr`),
    /// the one appearing last in the record wins.
    pub fn find_key(&self, candidates: &[&str]) -> Option<&str> {
        candidates.iter().find_map(|candidate| {
            self.fields
                .keys()
                .filter(|key| key.eq_ignore_ascii_case(candidate))
                .last()
                .map(String::as_str)
        })
    }

    /// Resolve a semantic field to its raw value
    pub fn resolve(&self, field: SemanticField) -> Option<&Value> {
        self.find_key(field.synonyms())
            .and_then(|key| self.fields.get(key))
    }
}

/// Coerce a scalar value to a finite number.
///
/// Numbers, numeric text and booleans are accepted. Null, other text, lists,
/// objects and non-finite results are missing.
pub fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }?;
    number.is_finite().then_some(number)
}

/// Coerce a scalar or a list of scalars to a number, averaging lists.
///
/// Non-numeric list elements are ignored; a list with no numeric element is
/// missing.
pub fn as_mean(value: &Value) -> Option<f64> {
    match value {
        Value::Array(items) => {
            let numbers: Vec<f64> = items.iter().filter_map(as_number).collect();
            if numbers.is_empty() {
                return None;
            }
            Some(numbers.iter().sum::<f64>() / numbers.len() as f64)
        }
        other => as_number(other),
    }
}

/// Coerce a timestamp value to a raw epoch number.
///
/// RFC 3339 text is converted to epoch seconds; anything numeric is returned
/// unscaled so the caller can apply the millisecond heuristic.
pub fn as_epoch(value: &Value) -> Option<EpochValue> {
    if let Some(number) = as_number(value) {
        return Some(EpochValue::Raw(number));
    }
    let text = value.as_str()?;
    let parsed = DateTime::parse_from_rfc3339(text.trim()).ok()?;
    let seconds =
        parsed.timestamp() as f64 + f64::from(parsed.timestamp_subsec_nanos()) / 1e9;
    Some(EpochValue::Seconds(seconds))
}

/// A timestamp as found in a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EpochValue {
    /// Bare number, unit unknown
    Raw(f64),
    /// Already in seconds (parsed from a calendar timestamp)
    Seconds(f64),
}
