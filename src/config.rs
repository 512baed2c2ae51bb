//! Configuration for an extraction run.

use crate::error::FeatureError;
use crate::normalizer::DEFAULT_MILLIS_THRESHOLD;
use crate::windowing::{DEFAULT_MIN_SAMPLES_PER_WINDOW, DEFAULT_WINDOW_SECONDS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters fixed for the lifetime of one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Window duration in seconds
    pub window_seconds: f64,

    /// Windows with fewer samples are not emitted
    pub min_samples_per_window: usize,

    /// Bare timestamps above this are read as milliseconds
    pub millis_threshold: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            window_seconds: DEFAULT_WINDOW_SECONDS,
            min_samples_per_window: DEFAULT_MIN_SAMPLES_PER_WINDOW,
            millis_threshold: DEFAULT_MILLIS_THRESHOLD,
        }
    }
}

impl ExtractionConfig {
    /// Load configuration from a JSON file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, FeatureError> {
        let content = std::fs::read_to_string(path)?;
        let config: ExtractionConfig = serde_json::from_str(&content)
            .map_err(|e| FeatureError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), FeatureError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), FeatureError> {
        if !self.window_seconds.is_finite() || self.window_seconds <= 0.0 {
            return Err(FeatureError::Config(format!(
                "window_seconds must be a positive number, got {}",
                self.window_seconds
            )));
        }
        if self.min_samples_per_window == 0 {
            return Err(FeatureError::Config(
                "min_samples_per_window must be at least 1".to_string(),
            ));
        }
        if !self.millis_threshold.is_finite() || self.millis_threshold <= 0.0 {
            return Err(FeatureError::Config(format!(
                "millis_threshold must be a positive number, got {}",
                self.millis_threshold
            )));
        }
        Ok(())
    }
}
