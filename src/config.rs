//! Application configuration
//!
//! Loaded from a TOML file. Every field has a default, so an empty or missing
//! file yields a usable configuration.

use crate::error::{MoodError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default detection period
pub const DEFAULT_INTERVAL_MS: u64 = 700;

/// Where the face detector and expression classifier are loaded from
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory holding both model files
    pub dir: PathBuf,
    /// Face detector file name, relative to `dir`
    pub face_detector: String,
    /// Expression classifier file name, relative to `dir`
    pub expression_classifier: String,
    /// Input tensor name of the face detector
    pub face_detector_input: String,
    /// Input tensor name of the expression classifier
    pub expression_input: String,
    /// Minimum face score for a detection to count as a face
    pub min_face_score: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models/weights"),
            face_detector: "face_detector.onnx".to_string(),
            expression_classifier: "emotion_ferplus.onnx".to_string(),
            face_detector_input: "input".to_string(),
            expression_input: "Input3".to_string(),
            min_face_score: 0.7,
        }
    }
}

impl ModelConfig {
    pub fn face_detector_path(&self) -> PathBuf {
        self.dir.join(&self.face_detector)
    }

    pub fn expression_classifier_path(&self) -> PathBuf {
        self.dir.join(&self.expression_classifier)
    }
}

/// Polling loop settings
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Period between detection ticks in milliseconds
    pub interval_ms: u64,
    /// Capacity of the detector event channel
    pub event_buffer: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            event_buffer: 64,
        }
    }
}

impl DetectionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Frame source settings
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Webcam index
    pub index: i32,
    /// Serve this image instead of a live camera
    pub still_image: Option<PathBuf>,
}

/// Complete application configuration
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub models: ModelConfig,
    pub detection: DetectionConfig,
    pub camera: CameraConfig,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| MoodError::ConfigError(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            MoodError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Default configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("moody-player").join("config.toml"))
    }

    /// Resolve the configuration for this run
    ///
    /// An explicit path must load. Without one, the default location is used
    /// when the file exists, otherwise built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.models.dir.as_os_str().is_empty() {
            return Err(MoodError::ConfigError(
                "Model directory must be set".to_string(),
            ));
        }
        if self.models.face_detector.is_empty() || self.models.expression_classifier.is_empty() {
            return Err(MoodError::ConfigError(
                "Both model file names must be set".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.models.min_face_score) {
            return Err(MoodError::ConfigError(format!(
                "min_face_score must be within [0, 1], got {}",
                self.models.min_face_score
            )));
        }
        if self.detection.interval_ms == 0 {
            return Err(MoodError::ConfigError(
                "Detection interval must be greater than zero".to_string(),
            ));
        }
        if self.detection.event_buffer == 0 {
            return Err(MoodError::ConfigError(
                "Event buffer must hold at least one event".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the model directory
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models.dir = dir.into();
        self
    }

    /// Set the detection period
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.detection.interval_ms = interval_ms;
        self
    }

    /// Serve a still image instead of the webcam
    pub fn with_still_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.camera.still_image = Some(path.into());
        self
    }
}
