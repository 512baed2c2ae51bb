//! Error types for physio-features

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an extraction run
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Unsupported input structure: {0}")]
    Schema(String),

    #[error("Could not load {} as any of: {}", .path.display(), .attempted.join(", "))]
    Load {
        path: PathBuf,
        attempted: Vec<&'static str>,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
