//! Configuration management for the preprocessing and training pipeline
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling parameter sweeps without recompilation. Feature extraction,
//! chunking, fold geometry and directory locations can all be adjusted
//! via the config file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub features: FeatureConfig,
    pub chunking: ChunkConfig,
    pub split: SplitConfig,
    pub data: DataConfig,
}

/// Spectral feature extraction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Expected input sample rate in Hz; mismatching recordings are rejected
    pub sample_rate: u32,
    /// Number of mel bands per spectrogram
    pub mel_bands: usize,
    /// Hop between successive analysis frames in samples
    pub hop_size: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            mel_bands: 40,
            hop_size: 1024,
        }
    }
}

/// Spectrogram chunking parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Time frames per chunk; trailing frames that do not fill a full
    /// chunk are discarded
    pub frames_per_chunk: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            frames_per_chunk: 80,
        }
    }
}

/// Cross-validation fold geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Number of cross-validation folds
    pub folds: usize,
    /// Seed for the fold shuffle; fixed seed gives reproducible plans
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { folds: 10, seed: 42 }
    }
}

/// Dataset and artifact locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root directory of the raw dataset (one subdirectory per genre)
    pub dataset_dir: PathBuf,
    /// Directory for persisted feature arrays, fold plans and checkpoints
    pub artifact_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("data/genres"),
            artifact_dir: PathBuf::from("artifacts"),
        }
    }
}

impl Default for AppConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            chunking: ChunkConfig::default(),
            split: SplitConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file, falling back to defaults
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file("genre_trainer.json")
    }

    /// Validate fold geometry before any processing begins
    ///
    /// Fold parameters are a startup-time configuration concern; a bad
    /// value must fail before the corpus is touched.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.split.folds < 3 {
            return Err(PipelineError::Configuration {
                reason: format!(
                    "at least 3 folds are required for train/validation/test rotation (got {})",
                    self.split.folds
                ),
            });
        }
        if self.chunking.frames_per_chunk == 0 {
            return Err(PipelineError::Configuration {
                reason: "frames_per_chunk must be nonzero".to_string(),
            });
        }
        if self.features.mel_bands == 0 || self.features.hop_size == 0 {
            return Err(PipelineError::Configuration {
                reason: "mel_bands and hop_size must be nonzero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.features.sample_rate, 44_100);
        assert_eq!(config.features.mel_bands, 40);
        assert_eq!(config.chunking.frames_per_chunk, 80);
        assert_eq!(config.split.folds, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.features.sample_rate, config.features.sample_rate);
        assert_eq!(parsed.split.seed, config.split.seed);
        assert_eq!(parsed.data.dataset_dir, config.data.dataset_dir);
    }

    #[test]
    fn test_validate_rejects_degenerate_folds() {
        let mut config = AppConfig::default();
        config.split.folds = 2;
        let err = config.validate().unwrap_err();
        assert!(
            format!("{}", err).contains("folds"),
            "error should mention fold count: {err}"
        );
    }
}
