use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    transforms::TransformConfig,
    video::{Codec, ProcessOptions},
};

/// Main configuration for the video transformer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-frame transform parameters
    pub transform: TransformConfig,

    /// Output encoding settings
    pub video: VideoConfig,

    /// Folder mode settings
    pub batch: BatchConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.transform.validate()?;
        self.video.validate()?;
        self.batch.validate()?;
        Ok(())
    }

    /// Encoding options handed to each processor
    pub fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            codec: self.video.codec.clone(),
            progress_interval: self.video.progress_interval,
        }
    }
}

/// Output encoding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Four-character code of the output codec
    pub codec: Codec,

    /// File suffix matched in folder mode
    pub extension: String,

    /// Frames between progress lines
    pub progress_interval: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            codec: Codec::default(),
            extension: "avi".to_string(),
            progress_interval: 10,
        }
    }
}

impl VideoConfig {
    /// The configured suffix without any leading dot
    pub fn extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }

    fn validate(&self) -> Result<()> {
        if self.extension().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "video.extension".to_string(),
                value: self.extension.clone()
            }.into());
        }

        if self.progress_interval == 0 {
            return Err(ConfigError::InvalidValue {
                key: "video.progress_interval".to_string(),
                value: self.progress_interval.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Folder mode configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of videos processed at once
    pub workers: usize,

    /// Mirror input sub-folders under the output folder instead of
    /// flattening every file into it
    pub preserve_structure: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            preserve_structure: false,
        }
    }
}

impl BatchConfig {
    fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "batch.workers".to_string(),
                value: self.workers.to_string()
            }.into());
        }

        Ok(())
    }
}
