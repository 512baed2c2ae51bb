//! Window slicing for aligned sample sequences.
//!
//! Samples are partitioned into fixed-duration, non-overlapping windows
//! anchored at `floor(min(t) / duration) * duration`. A window is emitted only
//! when at least the minimum number of samples fall inside it.

use crate::types::{AlignedSequences, Window, WindowSlice};
use std::collections::BTreeMap;
use tracing::debug;

/// Default window duration (5 minutes)
pub const DEFAULT_WINDOW_SECONDS: f64 = 300.0;

/// Default minimum number of samples for a window to be emitted
pub const DEFAULT_MIN_SAMPLES_PER_WINDOW: usize = 10;

/// Result of slicing: emitted windows in start order plus discard count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlicedWindows {
    pub slices: Vec<WindowSlice>,
    /// Occupied windows dropped for having too few samples
    pub discarded: usize,
}

/// Slices aligned sequences into fixed-duration windows
#[derive(Debug, Clone, Copy)]
pub struct WindowSlicer {
    window_seconds: f64,
    min_samples: usize,
}

impl Default for WindowSlicer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SECONDS, DEFAULT_MIN_SAMPLES_PER_WINDOW)
    }
}

impl WindowSlicer {
    /// `window_seconds` must be positive and finite; the config layer checks this.
    pub fn new(window_seconds: f64, min_samples: usize) -> Self {
        Self {
            window_seconds,
            min_samples,
        }
    }

    pub fn window_seconds(&self) -> f64 {
        self.window_seconds
    }

    /// Start of the first window for the given minimum timestamp
    pub fn origin(&self, t_min: f64) -> f64 {
        (t_min / self.window_seconds).floor() * self.window_seconds
    }

    /// Number of window strides from the origin through `t_max`, inclusive
    pub fn window_count(&self, origin: f64, t_max: f64) -> u64 {
        ((t_max - origin) / self.window_seconds).floor().max(0.0) as u64 + 1
    }

    /// Window at stride `k` from the origin
    pub fn window_at(&self, origin: f64, k: u64) -> Window {
        Window::new(origin + k as f64 * self.window_seconds, self.window_seconds)
    }

    /// Slice the sequences into emitted windows.
    ///
    /// Each sample is assigned to its stride directly instead of scanning every
    /// stride, so empty strides across long gaps cost nothing. Stride indices
    /// are bounded by `window_count`, which guarantees termination.
    pub fn slice(&self, sequences: &AlignedSequences) -> SlicedWindows {
        let Some((t_min, t_max)) = sequences.time_bounds() else {
            return SlicedWindows::default();
        };

        let origin = self.origin(t_min);
        let count = self.window_count(origin, t_max);

        let mut members: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for (index, &t) in sequences.t.iter().enumerate() {
            if let Some(k) = self.stride_of(origin, count, t) {
                members.entry(k).or_default().push(index);
            }
        }

        let mut sliced = SlicedWindows::default();
        for (k, indices) in members {
            let window = self.window_at(origin, k);
            if indices.len() < self.min_samples {
                debug!(
                    start = window.start,
                    samples = indices.len(),
                    "discarding under-filled window"
                );
                sliced.discarded += 1;
                continue;
            }
            sliced
                .slices
                .push(WindowSlice::gather(window, sequences, &indices));
        }
        sliced
    }

    /// Stride whose window satisfies `start <= t < end`, if any
    fn stride_of(&self, origin: f64, count: u64, t: f64) -> Option<u64> {
        let estimate = ((t - origin) / self.window_seconds).floor();
        if estimate.is_nan() || estimate < 0.0 {
            return None;
        }
        let mut k = (estimate as u64).min(count - 1);

        // Correct division rounding against the exact membership predicate
        if t < self.window_at(origin, k).start && k > 0 {
            k -= 1;
        }
        if t >= self.window_at(origin, k).end && k + 1 < count {
            k += 1;
        }
        self.window_at(origin, k).contains(t).then_some(k)
    }
}
