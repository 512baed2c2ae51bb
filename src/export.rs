//! Artifact export
//!
//! Writes the assembled outputs next to each other so downstream training and
//! clustering scripts can pick them up:
//! - `<out>.npy`: float32 feature matrix, NaN for missing values
//! - `<stem>_header.json`: feature names in column order
//! - `<stem>_windows.json`: window start times and duration
//!
//! The aligned sequences can also be dumped to CSV for inspection.

use crate::assembler::FeatureMatrix;
use crate::error::FeatureError;
use crate::types::{AlignedSequences, FEATURE_NAMES};
use ndarray_npy::WriteNpyExt;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Locations of the three feature artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub matrix: PathBuf,
    pub header: PathBuf,
    pub windows: PathBuf,
}

impl ArtifactPaths {
    /// Derive sibling header and window-index paths from the matrix path
    pub fn for_output(matrix: &Path) -> Self {
        let stem = matrix
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "features".to_string());
        Self {
            matrix: matrix.to_path_buf(),
            header: matrix.with_file_name(format!("{stem}_header.json")),
            windows: matrix.with_file_name(format!("{stem}_windows.json")),
        }
    }
}

/// One row of the raw CSV dump
#[derive(Serialize)]
struct RawRow {
    timestamp: f64,
    hr_bpm: f64,
    rr_ms: f64,
    ax: f64,
    ay: f64,
    az: f64,
    temp: f64,
}

/// Writer for feature artifacts
pub struct FeatureExporter;

impl FeatureExporter {
    /// Write matrix, header and window index for `matrix_path`
    pub fn write_all(matrix: &FeatureMatrix, matrix_path: &Path) -> Result<ArtifactPaths, FeatureError> {
        let paths = ArtifactPaths::for_output(matrix_path);
        Self::write_matrix(matrix, &paths.matrix)?;
        Self::write_header(&paths.header)?;
        Self::write_window_index(matrix, &paths.windows)?;

        let (rows, cols) = matrix.shape();
        info!(
            path = %paths.matrix.display(),
            rows,
            cols,
            "wrote feature artifacts"
        );
        Ok(paths)
    }

    /// Write the feature matrix as a NumPy `.npy` file
    pub fn write_matrix(matrix: &FeatureMatrix, path: &Path) -> Result<(), FeatureError> {
        let file = BufWriter::new(create(path)?);
        matrix
            .to_array()
            .write_npy(file)
            .map_err(|e| FeatureError::Export(format!("failed to write {}: {}", path.display(), e)))
    }

    /// Write the feature names as a JSON array
    pub fn write_header(path: &Path) -> Result<(), FeatureError> {
        let file = BufWriter::new(create(path)?);
        serde_json::to_writer_pretty(file, &FEATURE_NAMES)?;
        Ok(())
    }

    /// Write window starts and duration as JSON
    pub fn write_window_index(matrix: &FeatureMatrix, path: &Path) -> Result<(), FeatureError> {
        let file = BufWriter::new(create(path)?);
        serde_json::to_writer_pretty(file, matrix.window_index())?;
        Ok(())
    }

    /// Dump the aligned sequences as CSV; missing values are written as NaN
    pub fn write_raw_csv(sequences: &AlignedSequences, path: &Path) -> Result<(), FeatureError> {
        let mut writer = csv::Writer::from_writer(create(path)?);
        let nan = |v: Option<f64>| v.unwrap_or(f64::NAN);

        for sample in sequences.samples() {
            writer.serialize(RawRow {
                timestamp: sample.t,
                hr_bpm: nan(sample.hr_bpm),
                rr_ms: nan(sample.rr_ms),
                ax: nan(sample.ax),
                ay: nan(sample.ay),
                az: nan(sample.az),
                temp: nan(sample.temp),
            })?;
        }
        writer.flush()?;

        info!(path = %path.display(), rows = sequences.len(), "saved raw samples");
        Ok(())
    }
}

fn create(path: &Path) -> Result<File, FeatureError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::OutputAssembler;
    use crate::types::{FeatureVector, NormalizedSample, Window};

    #[test]
    fn test_artifact_paths_share_stem() {
        let paths = ArtifactPaths::for_output(Path::new("out/run1.npy"));
        assert_eq!(paths.header, PathBuf::from("out/run1_header.json"));
        assert_eq!(paths.windows, PathBuf::from("out/run1_windows.json"));
    }

    #[test]
    fn test_write_header_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler = OutputAssembler::new(300.0);
        assembler.push(&Window::new(600.0, 300.0), FeatureVector::default());
        let matrix = assembler.finish();

        let paths = FeatureExporter::write_all(&matrix, &dir.path().join("features.npy")).unwrap();

        let header: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&paths.header).unwrap()).unwrap();
        assert_eq!(header, FEATURE_NAMES);

        let index: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.windows).unwrap()).unwrap();
        assert_eq!(index["window_starts"][0], 600.0);
        assert_eq!(index["window_duration_seconds"], 300.0);
        assert!(paths.matrix.exists());
    }

    #[test]
    fn test_raw_csv_writes_nan_for_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let mut sequences = AlignedSequences::default();
        sequences.push(NormalizedSample {
            t: 1.5,
            hr_bpm: Some(75.0),
            rr_ms: Some(800.0),
            ax: None,
            ay: None,
            az: None,
            temp: Some(36.5),
        });

        FeatureExporter::write_raw_csv(&sequences, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("timestamp,hr_bpm,rr_ms,ax,ay,az,temp"));
        assert_eq!(lines.next(), Some("1.5,75.0,800.0,NaN,NaN,NaN,36.5"));
    }
}
