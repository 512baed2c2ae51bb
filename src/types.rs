//! Core types for the extraction pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: normalized samples, aligned sequences, windows and their slices,
//! and the per-window feature vectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Width of every feature vector
pub const FEATURE_COUNT: usize = 10;

/// Feature header in matrix column order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "hr_mean_bpm",
    "hrv_sdnn_ms",
    "hrv_rmssd_ms",
    "hrv_pnn50",
    "accel_mean_mag",
    "accel_std_mag",
    "accel_activity_frac",
    "temp_mean",
    "temp_std",
    "temp_slope_per_min",
];

/// One timestamped reading after schema normalization.
///
/// `t` is always finite seconds since the Unix epoch. Every other field is
/// `None` when the source record did not carry a usable value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSample {
    pub t: f64,
    pub hr_bpm: Option<f64>,
    pub rr_ms: Option<f64>,
    pub ax: Option<f64>,
    pub ay: Option<f64>,
    pub az: Option<f64>,
    pub temp: Option<f64>,
}

/// Seven index-aligned sequences, one element per accepted record, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedSequences {
    pub t: Vec<f64>,
    pub hr_bpm: Vec<Option<f64>>,
    pub rr_ms: Vec<Option<f64>>,
    pub ax: Vec<Option<f64>>,
    pub ay: Vec<Option<f64>>,
    pub az: Vec<Option<f64>>,
    pub temp: Vec<Option<f64>>,
}

impl AlignedSequences {
    /// Create empty sequences with room for `capacity` samples
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            t: Vec::with_capacity(capacity),
            hr_bpm: Vec::with_capacity(capacity),
            rr_ms: Vec::with_capacity(capacity),
            ax: Vec::with_capacity(capacity),
            ay: Vec::with_capacity(capacity),
            az: Vec::with_capacity(capacity),
            temp: Vec::with_capacity(capacity),
        }
    }

    /// Append one sample to all seven sequences
    pub fn push(&mut self, sample: NormalizedSample) {
        self.t.push(sample.t);
        self.hr_bpm.push(sample.hr_bpm);
        self.rr_ms.push(sample.rr_ms);
        self.ax.push(sample.ax);
        self.ay.push(sample.ay);
        self.az.push(sample.az);
        self.temp.push(sample.temp);
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Reassemble the sample at `index`
    pub fn sample(&self, index: usize) -> Option<NormalizedSample> {
        Some(NormalizedSample {
            t: *self.t.get(index)?,
            hr_bpm: self.hr_bpm[index],
            rr_ms: self.rr_ms[index],
            ax: self.ax[index],
            ay: self.ay[index],
            az: self.az[index],
            temp: self.temp[index],
        })
    }

    /// Iterate samples in input order
    pub fn samples(&self) -> impl Iterator<Item = NormalizedSample> + '_ {
        (0..self.len()).filter_map(move |i| self.sample(i))
    }

    /// Smallest and largest timestamp, or `None` when empty
    pub fn time_bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.t.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }
}

/// Half-open time window `[start, end)` in epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    /// Create a window starting at `start` lasting `duration` seconds
    pub fn new(start: f64, duration: f64) -> Self {
        Self {
            start,
            end: start + duration,
        }
    }

    /// Check if a timestamp falls within this window
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    pub fn duration_secs(&self) -> f64 {
        self.end - self.start
    }

    /// Window start as a UTC wall-clock time
    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.start)
    }
}

/// Convert fractional epoch seconds to a UTC timestamp
pub fn epoch_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// The samples of one emitted window, restricted to its membership predicate.
///
/// Sub-sequences keep input order. `t_rel` holds `t - window.start`.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSlice {
    pub window: Window,
    pub t_rel: Vec<f64>,
    pub hr_bpm: Vec<Option<f64>>,
    pub rr_ms: Vec<Option<f64>>,
    pub ax: Vec<Option<f64>>,
    pub ay: Vec<Option<f64>>,
    pub az: Vec<Option<f64>>,
    pub temp: Vec<Option<f64>>,
}

impl WindowSlice {
    /// Gather the samples at `indices` from the aligned sequences
    pub fn gather(window: Window, sequences: &AlignedSequences, indices: &[usize]) -> Self {
        let pick = |column: &[Option<f64>]| indices.iter().map(|&i| column[i]).collect();
        Self {
            window,
            t_rel: indices
                .iter()
                .map(|&i| sequences.t[i] - window.start)
                .collect(),
            hr_bpm: pick(&sequences.hr_bpm),
            rr_ms: pick(&sequences.rr_ms),
            ax: pick(&sequences.ax),
            ay: pick(&sequences.ay),
            az: pick(&sequences.az),
            temp: pick(&sequences.temp),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.t_rel.len()
    }
}

/// Heart-rate-variability statistics of one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HrvFeatures {
    /// Mean heart rate derived from the mean beat interval (bpm)
    pub hr_mean_bpm: Option<f64>,
    /// Sample standard deviation of beat intervals (ms)
    pub hrv_sdnn_ms: Option<f64>,
    /// Root mean square of successive differences (ms)
    pub hrv_rmssd_ms: Option<f64>,
    /// Fraction of successive differences above 50 ms
    pub hrv_pnn50: Option<f64>,
}

/// Acceleration magnitude statistics of one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityFeatures {
    pub accel_mean_mag: Option<f64>,
    pub accel_std_mag: Option<f64>,
    /// Fraction of samples above the window's own mean + std
    pub accel_activity_frac: Option<f64>,
}

/// Temperature level and trend of one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalFeatures {
    pub temp_mean: Option<f64>,
    pub temp_std: Option<f64>,
    pub temp_slope_per_min: Option<f64>,
}

/// All features of one emitted window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub hrv: HrvFeatures,
    pub activity: ActivityFeatures,
    pub thermal: ThermalFeatures,
}

impl FeatureVector {
    /// Values in `FEATURE_NAMES` order
    pub fn values(&self) -> [Option<f64>; FEATURE_COUNT] {
        [
            self.hrv.hr_mean_bpm,
            self.hrv.hrv_sdnn_ms,
            self.hrv.hrv_rmssd_ms,
            self.hrv.hrv_pnn50,
            self.activity.accel_mean_mag,
            self.activity.accel_std_mag,
            self.activity.accel_activity_frac,
            self.thermal.temp_mean,
            self.thermal.temp_std,
            self.thermal.temp_slope_per_min,
        ]
    }

    /// Single-precision matrix row; missing values become NaN
    pub fn to_row(&self) -> [f32; FEATURE_COUNT] {
        self.values()
            .map(|v| v.map(|x| x as f32).unwrap_or(f32::NAN))
    }

    /// Look up a feature by its header name
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.values()[i])
    }
}
