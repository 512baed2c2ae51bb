//! Schema normalization
//!
//! This module maps one raw record onto the fixed internal field set:
//! - Timestamp resolved through its synonyms and scaled to seconds
//! - Heart rate and beat interval reconciled so one is observed, the other derived
//! - Acceleration axes and temperature resolved independently
//!
//! Every resolver is a pure function of the record.

use crate::schema::{as_epoch, as_mean, as_number, EpochValue, RawRecord, SemanticField};
use crate::types::NormalizedSample;

/// Epoch values above this are taken to be milliseconds
pub const DEFAULT_MILLIS_THRESHOLD: f64 = 1e12;

/// Milliseconds per minute, used to convert between bpm and beat interval
const MS_PER_MINUTE: f64 = 60_000.0;

/// Normalizer for converting raw records to normalized samples
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    millis_threshold: f64,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MILLIS_THRESHOLD)
    }
}

impl Normalizer {
    pub fn new(millis_threshold: f64) -> Self {
        Self { millis_threshold }
    }

    /// Normalize one record, or `None` when it carries no usable timestamp
    pub fn normalize(&self, record: &RawRecord) -> Option<NormalizedSample> {
        let t = self.resolve_timestamp(record)?;
        let (hr_bpm, rr_ms) = resolve_cardiac(record);

        Some(NormalizedSample {
            t,
            hr_bpm,
            rr_ms,
            ax: resolve_scalar(record, SemanticField::AccelX),
            ay: resolve_scalar(record, SemanticField::AccelY),
            az: resolve_scalar(record, SemanticField::AccelZ),
            temp: resolve_scalar(record, SemanticField::Temperature),
        })
    }

    /// Resolve the timestamp in epoch seconds.
    ///
    /// Bare numbers above the threshold are read as milliseconds. This is a
    /// magnitude heuristic: a seconds value that large (tens of thousands of
    /// years ahead) would be misread, which is accepted.
    pub fn resolve_timestamp(&self, record: &RawRecord) -> Option<f64> {
        let value = record.resolve(SemanticField::Timestamp)?;
        let seconds = match as_epoch(value)? {
            EpochValue::Raw(n) if n > self.millis_threshold => n / 1000.0,
            EpochValue::Raw(n) => n,
            EpochValue::Seconds(s) => s,
        };
        seconds.is_finite().then_some(seconds)
    }
}

/// Resolve `(hr_bpm, rr_ms)`.
///
/// The presence of a beat-interval key decides the branch, even when its
/// value is unusable; only records without one consult the heart rate. The
/// observed member of the pair is kept as-is and the other is derived from it.
/// A missing or non-positive observation leaves the derived member missing.
pub fn resolve_cardiac(record: &RawRecord) -> (Option<f64>, Option<f64>) {
    if let Some(value) = record.resolve(SemanticField::BeatInterval) {
        let rr_ms = as_mean(value);
        return (rr_ms.and_then(invert_per_minute), rr_ms);
    }

    let hr_bpm = record
        .resolve(SemanticField::HeartRate)
        .and_then(as_number);
    (hr_bpm, hr_bpm.and_then(invert_per_minute))
}

/// Resolve a plain scalar field
pub fn resolve_scalar(record: &RawRecord, field: SemanticField) -> Option<f64> {
    record.resolve(field).and_then(as_number)
}

/// `60000 / x`, missing for non-positive input
fn invert_per_minute(x: f64) -> Option<f64> {
    (x > 0.0).then(|| MS_PER_MINUTE / x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecordLoader;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_record_without_timestamp_is_rejected() {
        let normalizer = Normalizer::default();
        assert!(normalizer.normalize(&record(json!({"hr": 70}))).is_none());
        assert!(normalizer.normalize(&record(json!({"ts": null}))).is_none());
        assert!(normalizer.normalize(&record(json!({"ts": "soon"}))).is_none());
    }

    #[test]
    fn test_millisecond_timestamps_are_scaled() {
        let normalizer = Normalizer::default();

        let ms = normalizer
            .resolve_timestamp(&record(json!({"ts": 1_700_000_000_500u64})))
            .unwrap();
        assert!((ms - 1_700_000_000.5).abs() < 1e-6);

        let s = normalizer
            .resolve_timestamp(&record(json!({"time": 1_700_000_000})))
            .unwrap();
        assert_eq!(s, 1_700_000_000.0);

        // Exactly at the threshold counts as seconds
        let edge = normalizer
            .resolve_timestamp(&record(json!({"t": 1e12})))
            .unwrap();
        assert_eq!(edge, 1e12);
    }

    #[test]
    fn test_beat_interval_preferred_over_heart_rate() {
        let (hr, rr) = resolve_cardiac(&record(json!({"hr": 90, "RR": 800})));
        assert_eq!(rr, Some(800.0));
        assert_eq!(hr, Some(75.0));
    }

    #[test]
    fn test_heart_rate_derives_beat_interval() {
        let (hr, rr) = resolve_cardiac(&record(json!({"bpm": 75})));
        assert_eq!(hr, Some(75.0));
        assert_eq!(rr, Some(800.0));
    }

    #[test]
    fn test_beat_interval_list_is_averaged() {
        let (hr, rr) = resolve_cardiac(&record(json!({"rr_ms": [750, 850]})));
        assert_eq!(rr, Some(800.0));
        assert_eq!(hr, Some(75.0));
    }

    #[test]
    fn test_non_positive_observation_leaves_derived_missing() {
        let (hr, rr) = resolve_cardiac(&record(json!({"rr": 0})));
        assert_eq!(rr, Some(0.0));
        assert_eq!(hr, None);

        let (hr, rr) = resolve_cardiac(&record(json!({"hr": -5})));
        assert_eq!(hr, Some(-5.0));
        assert_eq!(rr, None);
    }

    #[test]
    fn test_present_beat_interval_key_shadows_heart_rate() {
        let (hr, rr) = resolve_cardiac(&record(json!({"rr": null, "hr": 60})));
        assert_eq!(hr, None);
        assert_eq!(rr, None);

        let (hr, rr) = resolve_cardiac(&record(json!({"RR_ms": "n/a", "bpm": 60})));
        assert_eq!(hr, None);
        assert_eq!(rr, None);
    }

    #[test]
    fn test_empty_beat_interval_cell_shadows_heart_rate_column() {
        let records = RecordLoader::parse_csv("ts,rr,hr\n1,,60\n2,NaN,60\n3,800,60\n").unwrap();
        let pairs: Vec<_> = records.iter().map(resolve_cardiac).collect();

        assert_eq!(pairs, vec![(None, None), (None, None), (Some(75.0), Some(800.0))]);
    }

    #[test]
    fn test_unusable_heart_rate_is_missing() {
        let (hr, rr) = resolve_cardiac(&record(json!({"hr": "--"})));
        assert_eq!(hr, None);
        assert_eq!(rr, None);
    }

    #[test]
    fn test_missing_fields_degrade_individually() {
        let sample = Normalizer::default()
            .normalize(&record(json!({"ts": 10, "ax": 0.1, "accel_y": "x", "temperature": 36.4})))
            .unwrap();

        assert_eq!(sample.t, 10.0);
        assert_eq!(sample.hr_bpm, None);
        assert_eq!(sample.rr_ms, None);
        assert_eq!(sample.ax, Some(0.1));
        assert_eq!(sample.ay, None);
        assert_eq!(sample.az, None);
        assert_eq!(sample.temp, Some(36.4));
    }

    #[test]
    fn test_calendar_timestamp() {
        let t = Normalizer::default()
            .resolve_timestamp(&record(json!({"timestamp": "2024-01-15T08:30:00.250Z"})))
            .unwrap();
        assert!((t - 1_705_307_400.25).abs() < 1e-6);
    }
}
