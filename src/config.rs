//! Tunable parameters of the analysis.
//!
//! [`AnalysisConfig`] starts from built-in defaults, can be overlaid from a
//! YAML file and is finally overridden by command-line flags. Every field has
//! a default so a partial YAML document is valid.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::normal_form::NormalForm;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.85;
pub const DEFAULT_MIN_ROWS: usize = 3;
pub const DEFAULT_MAX_SAMPLE_ROWS: usize = 100;
pub const DEFAULT_MAX_COMPOSITE_KEY_SIZE: usize = 4;
pub const DEFAULT_MAX_CLOSURE_KEY_SIZE: usize = 5;
pub const DEFAULT_CLOSURE_MAX_ITERATIONS: usize = 10;
pub const DEFAULT_COMPOSITE_UNIQUENESS_RATIO: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub confidence_threshold: f64,
    pub min_rows: usize,
    pub max_sample_rows: usize,
    pub max_composite_key_size: usize,
    pub max_closure_key_size: usize,
    pub closure_max_iterations: usize,
    pub composite_uniqueness_ratio: f64,
    pub target: NormalForm,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_rows: DEFAULT_MIN_ROWS,
            max_sample_rows: DEFAULT_MAX_SAMPLE_ROWS,
            max_composite_key_size: DEFAULT_MAX_COMPOSITE_KEY_SIZE,
            max_closure_key_size: DEFAULT_MAX_CLOSURE_KEY_SIZE,
            closure_max_iterations: DEFAULT_CLOSURE_MAX_ITERATIONS,
            composite_uniqueness_ratio: DEFAULT_COMPOSITE_UNIQUENESS_RATIO,
            target: NormalForm::Fifth,
        }
    }
}

impl AnalysisConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_target(mut self, target: NormalForm) -> Self {
        self.target = target;
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let config: AnalysisConfig =
            serde_yaml::from_reader(reader).context("Parsing config YAML")?;
        config
            .validate()
            .with_context(|| format!("Validating config file {path:?}"))?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing config to YAML string")
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.confidence_threshold),
            "Confidence threshold must be within [0, 1], got {}",
            self.confidence_threshold
        );
        ensure!(
            (0.0..=1.0).contains(&self.composite_uniqueness_ratio),
            "Composite uniqueness ratio must be within [0, 1], got {}",
            self.composite_uniqueness_ratio
        );
        ensure!(self.max_sample_rows > 0, "Sample row cap must be positive");
        ensure!(
            self.max_composite_key_size >= 2,
            "Composite key size bound must be at least 2"
        );
        ensure!(
            self.max_closure_key_size >= 1,
            "Closure key size bound must be at least 1"
        );
        ensure!(
            self.closure_max_iterations >= 1,
            "Closure iteration bound must be at least 1"
        );
        ensure!(
            self.target > NormalForm::Unnormalized,
            "Target normal form must be 1NF or higher"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.target, NormalForm::Fifth);
        assert_eq!(config.min_rows, 3);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "confidence_threshold: 0.9").unwrap();
        writeln!(file, "target: 3NF").unwrap();

        let config = AnalysisConfig::load(file.path()).expect("load config");
        assert_eq!(config.confidence_threshold, 0.9);
        assert_eq!(config.target, NormalForm::Third);
        assert_eq!(config.max_sample_rows, DEFAULT_MAX_SAMPLE_ROWS);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let config = AnalysisConfig::default().with_threshold(1.5);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Confidence threshold"));
    }

    #[test]
    fn unnormalized_target_is_rejected() {
        let config = AnalysisConfig::default().with_target(NormalForm::Unnormalized);
        assert!(config.validate().is_err());
    }
}
