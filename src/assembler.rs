//! Output assembly
//!
//! Collects per-window feature vectors into the feature matrix handed to
//! downstream consumers, together with the parallel window index.

use crate::types::{FeatureVector, Window, FEATURE_COUNT, FEATURE_NAMES};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Window start times parallel to the matrix rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowIndex {
    /// Start of each emitted window, epoch seconds
    pub window_starts: Vec<f64>,
    pub window_duration_seconds: f64,
}

/// Chronologically ordered feature vectors, one per emitted window
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<FeatureVector>,
    index: WindowIndex,
}

impl FeatureMatrix {
    /// Matrix with no rows
    pub fn empty(window_duration_seconds: f64) -> Self {
        Self {
            rows: Vec::new(),
            index: WindowIndex {
                window_starts: Vec::new(),
                window_duration_seconds,
            },
        }
    }

    /// Column names in row order
    pub fn header(&self) -> &'static [&'static str; FEATURE_COUNT] {
        &FEATURE_NAMES
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn window_index(&self) -> &WindowIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(rows, columns)`; columns is always the feature count
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), FEATURE_COUNT)
    }

    /// Iterate `(window_start, features)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (f64, &FeatureVector)> {
        self.index.window_starts.iter().copied().zip(self.rows.iter())
    }

    /// Dense single-precision array with NaN for missing features
    pub fn to_array(&self) -> Array2<f32> {
        let rows: Vec<[f32; FEATURE_COUNT]> = self.rows.iter().map(FeatureVector::to_row).collect();
        Array2::from_shape_fn((rows.len(), FEATURE_COUNT), |(i, j)| rows[i][j])
    }
}

/// Appends window features in start order
#[derive(Debug)]
pub struct OutputAssembler {
    matrix: FeatureMatrix,
}

impl OutputAssembler {
    pub fn new(window_duration_seconds: f64) -> Self {
        Self {
            matrix: FeatureMatrix::empty(window_duration_seconds),
        }
    }

    /// Append one window's features. Windows must arrive in start order.
    pub fn push(&mut self, window: &Window, features: FeatureVector) {
        debug_assert!(
            self.matrix
                .index
                .window_starts
                .last()
                .map_or(true, |&last| last < window.start),
            "windows must be appended in increasing start order"
        );
        self.matrix.index.window_starts.push(window.start);
        self.matrix.rows.push(features);
    }

    pub fn finish(self) -> FeatureMatrix {
        self.matrix
    }
}
