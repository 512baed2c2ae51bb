//! Physio Features - Batch windowed feature extraction for physiological sensor data
//!
//! Turns irregularly sampled recordings with loosely specified schemas into a
//! fixed matrix of per-window features through a deterministic pipeline:
//! schema normalization → field extraction → window slicing → feature
//! derivation → output assembly.
//!
//! ## Features
//!
//! - **HRV**: mean heart rate, SDNN, RMSSD and pNN50 from beat intervals
//! - **Activity**: acceleration magnitude level, spread and active fraction
//! - **Thermal**: temperature level, spread and per-minute trend

pub mod assembler;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod features;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod types;
pub mod windowing;

pub use assembler::{FeatureMatrix, WindowIndex};
pub use config::ExtractionConfig;
pub use error::FeatureError;
pub use export::{ArtifactPaths, FeatureExporter};
pub use pipeline::{extract_features, ExtractionOutput, ExtractionReport, FeatureProcessor};

// Schema exports
pub use schema::{InputFormat, RawRecord, RecordLoader, SemanticField};

pub use types::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

/// Library version, reported by the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "physio-features";
