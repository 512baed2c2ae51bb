//! Pipeline orchestration
//!
//! This module provides the public API for physio-features.
//! It orchestrates the full pipeline from raw records to the feature matrix.

use crate::assembler::{FeatureMatrix, OutputAssembler};
use crate::config::ExtractionConfig;
use crate::error::FeatureError;
use crate::extractor::FieldExtractor;
use crate::features::FeatureDeriver;
use crate::normalizer::Normalizer;
use crate::schema::{RawRecord, RecordLoader};
use crate::types::{epoch_to_utc, AlignedSequences};
use crate::windowing::WindowSlicer;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Run the full pipeline over already-loaded records with default settings.
///
/// # Example
/// ```
/// use physio_features::pipeline::extract_features;
/// use physio_features::schema::RawRecord;
///
/// let records: Vec<RawRecord> = serde_json::from_str(r#"[{"ts": 0, "hr": 60}]"#).unwrap();
/// let matrix = extract_features(&records);
/// assert_eq!(matrix.shape(), (0, 10));
/// ```
pub fn extract_features(records: &[RawRecord]) -> FeatureMatrix {
    FeatureProcessor::default().process(records).matrix
}

/// Everything one extraction run produces
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    pub matrix: FeatureMatrix,
    /// Aligned sequences the matrix was computed from
    pub sequences: AlignedSequences,
    pub records_total: usize,
    pub records_dropped: usize,
    pub windows_discarded: usize,
}

/// Processor holding the parameters of an extraction run.
///
/// Pipeline stages:
/// 1. FieldExtractor - Normalize records into aligned sequences
/// 2. WindowSlicer - Partition samples into fixed windows
/// 3. FeatureDeriver - Compute per-window features
/// 4. OutputAssembler - Collect rows into the feature matrix
#[derive(Debug, Clone)]
pub struct FeatureProcessor {
    config: ExtractionConfig,
    extractor: FieldExtractor,
    slicer: WindowSlicer,
}

impl Default for FeatureProcessor {
    fn default() -> Self {
        Self::from_parts(ExtractionConfig::default())
    }
}

impl FeatureProcessor {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor from a validated configuration
    pub fn with_config(config: ExtractionConfig) -> Result<Self, FeatureError> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: ExtractionConfig) -> Self {
        Self {
            extractor: FieldExtractor::new(Normalizer::new(config.millis_threshold)),
            slicer: WindowSlicer::new(config.window_seconds, config.min_samples_per_window),
            config,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Load a file and process it
    pub fn process_path(&self, path: &Path) -> Result<ExtractionOutput, FeatureError> {
        let records = RecordLoader::load_path(path)?;
        info!(path = %path.display(), records = records.len(), "loaded records");
        Ok(self.process(&records))
    }

    /// Process records into the feature matrix
    pub fn process(&self, records: &[RawRecord]) -> ExtractionOutput {
        let extraction = self.extractor.extract(records);
        let sliced = self.slicer.slice(&extraction.sequences);

        let mut assembler = OutputAssembler::new(self.config.window_seconds);
        for slice in &sliced.slices {
            assembler.push(&slice.window, FeatureDeriver::derive(slice));
        }
        let matrix = assembler.finish();

        info!(
            windows = matrix.len(),
            discarded = sliced.discarded,
            "assembled feature matrix"
        );

        ExtractionOutput {
            matrix,
            sequences: extraction.sequences,
            records_total: records.len(),
            records_dropped: extraction.records_dropped,
            windows_discarded: sliced.discarded,
        }
    }

    /// Summarize what an extraction run would see and produce
    pub fn inspect(&self, records: &[RawRecord]) -> ExtractionReport {
        ExtractionReport::from_output(&self.process(records))
    }
}

/// Non-missing value counts per aligned field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldCoverage {
    pub hr_bpm: usize,
    pub rr_ms: usize,
    pub ax: usize,
    pub ay: usize,
    pub az: usize,
    pub temp: usize,
}

impl FieldCoverage {
    fn of(sequences: &AlignedSequences) -> Self {
        let present = |column: &[Option<f64>]| column.iter().filter(|v| v.is_some()).count();
        Self {
            hr_bpm: present(&sequences.hr_bpm),
            rr_ms: present(&sequences.rr_ms),
            ax: present(&sequences.ax),
            ay: present(&sequences.ay),
            az: present(&sequences.az),
            temp: present(&sequences.temp),
        }
    }
}

/// Earliest and latest sample time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
    pub start_utc: Option<String>,
    pub end_utc: Option<String>,
}

/// Inspection summary of one extraction run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub records_total: usize,
    pub samples_accepted: usize,
    pub records_dropped: usize,
    pub coverage: FieldCoverage,
    pub time_span: Option<TimeSpan>,
    pub window_duration_seconds: f64,
    pub windows_emitted: usize,
    pub windows_discarded: usize,
    pub window_starts: Vec<f64>,
}

impl ExtractionReport {
    pub fn from_output(output: &ExtractionOutput) -> Self {
        let rfc3339 = |t: f64| epoch_to_utc(t).map(|dt| dt.to_rfc3339());
        let index = output.matrix.window_index();

        Self {
            records_total: output.records_total,
            samples_accepted: output.sequences.len(),
            records_dropped: output.records_dropped,
            coverage: FieldCoverage::of(&output.sequences),
            time_span: output.sequences.time_bounds().map(|(start, end)| TimeSpan {
                start,
                end,
                start_utc: rfc3339(start),
                end_utc: rfc3339(end),
            }),
            window_duration_seconds: index.window_duration_seconds,
            windows_emitted: output.matrix.len(),
            windows_discarded: output.windows_discarded,
            window_starts: index.window_starts.clone(),
        }
    }
}
