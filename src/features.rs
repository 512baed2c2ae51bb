//! Feature derivation
//!
//! This module reduces one window slice to its feature vector:
//! - Heart-rate variability from beat intervals
//! - Activity from acceleration magnitude
//! - Temperature level and trend
//!
//! The three computers are independent and only read their own sub-sequences.

use crate::types::{ActivityFeatures, FeatureVector, HrvFeatures, ThermalFeatures, WindowSlice};

/// Successive beat-interval difference counted by pNN50 (ms)
const PNN50_THRESHOLD_MS: f64 = 50.0;

/// Milliseconds per minute, for converting a mean beat interval to bpm
const MS_PER_MINUTE: f64 = 60_000.0;

/// Feature deriver for computing per-window features
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Derive all features of one window
    pub fn derive(slice: &WindowSlice) -> FeatureVector {
        FeatureVector {
            hrv: compute_hrv_features(&slice.rr_ms),
            activity: compute_activity_features(&slice.ax, &slice.ay, &slice.az),
            thermal: compute_thermal_features(&slice.t_rel, &slice.temp),
        }
    }
}

/// HRV statistics from a window's beat intervals (ms).
///
/// Missing intervals are filtered out first, keeping sequence order. Fewer than
/// two remaining intervals leaves every statistic missing.
pub fn compute_hrv_features(rr_ms: &[Option<f64>]) -> HrvFeatures {
    let rr: Vec<f64> = rr_ms.iter().flatten().copied().collect();
    if rr.len() < 2 {
        return HrvFeatures::default();
    }

    let mean_rr = mean(&rr);
    let hr_mean_bpm = (mean_rr > 0.0).then(|| MS_PER_MINUTE / mean_rr);

    let diffs: Vec<f64> = rr.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let rmssd = (diffs.iter().map(|d| d * d).sum::<f64>() / diffs.len() as f64).sqrt();
    let nn50 = diffs
        .iter()
        .filter(|d| d.abs() > PNN50_THRESHOLD_MS)
        .count();

    HrvFeatures {
        hr_mean_bpm,
        hrv_sdnn_ms: Some(sample_std(&rr)),
        hrv_rmssd_ms: Some(rmssd),
        hrv_pnn50: Some(nn50 as f64 / diffs.len() as f64),
    }
}

/// Acceleration magnitude statistics.
///
/// Only samples with all three axes present contribute. The activity threshold
/// is the window's own mean plus standard deviation, so a window of identical
/// magnitudes always has an activity fraction of 0.
pub fn compute_activity_features(
    ax: &[Option<f64>],
    ay: &[Option<f64>],
    az: &[Option<f64>],
) -> ActivityFeatures {
    let magnitudes: Vec<f64> = ax
        .iter()
        .zip(ay)
        .zip(az)
        .filter_map(|((x, y), z)| Some((x.as_ref()?, y.as_ref()?, z.as_ref()?)))
        .map(|(x, y, z)| (x * x + y * y + z * z).sqrt())
        .collect();
    if magnitudes.is_empty() {
        return ActivityFeatures::default();
    }

    let mean_mag = mean(&magnitudes);
    let std_mag = sample_std(&magnitudes);
    let threshold = mean_mag + std_mag;
    let active = magnitudes.iter().filter(|&&m| m > threshold).count();

    ActivityFeatures {
        accel_mean_mag: Some(mean_mag),
        accel_std_mag: Some(std_mag),
        accel_activity_frac: Some(active as f64 / magnitudes.len() as f64),
    }
}

/// Temperature mean, spread and per-minute trend.
///
/// The slope is an ordinary least-squares fit against relative time over the
/// present samples, scaled to per minute. A degenerate fit (fewer than two
/// distinct times) gives a slope of exactly 0.
pub fn compute_thermal_features(t_rel: &[f64], temp: &[Option<f64>]) -> ThermalFeatures {
    let (times, values): (Vec<f64>, Vec<f64>) = t_rel
        .iter()
        .zip(temp)
        .filter_map(|(&t, v)| v.map(|v| (t, v)))
        .unzip();
    if values.is_empty() {
        return ThermalFeatures::default();
    }

    let slope_per_sec = least_squares_slope(&times, &values).unwrap_or(0.0);

    ThermalFeatures {
        temp_mean: Some(mean(&values)),
        temp_std: Some(sample_std(&values)),
        temp_slope_per_min: Some(slope_per_sec * 60.0),
    }
}

/// Arithmetic mean of a non-empty slice
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Bessel-corrected standard deviation; 0 for a single value
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Least-squares slope of `ys` against `xs`, or `None` when the fit is degenerate.
///
/// `xs` are shifted by their first value before centering so that repeated
/// times produce an exactly zero spread.
fn least_squares_slope(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let &x0 = xs.first()?;
    if xs.len() < 2 {
        return None;
    }
    let shifted: Vec<f64> = xs.iter().map(|x| x - x0).collect();
    let x_mean = mean(&shifted);
    let y_mean = mean(ys);

    let (sxy, sxx) = shifted
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
            let dx = x - x_mean;
            (sxy + dx * (y - y_mean), sxx + dx * dx)
        });

    (sxx > 0.0).then(|| sxy / sxx)
}
