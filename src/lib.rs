//! Moody Player - webcam mood detection
//!
//! Periodically classifies the facial expression in the live camera feed,
//! reduces it to a single mood with a confidence, and shows it next to a
//! list of recommended songs.

pub mod camera;
pub mod config;
pub mod error;
pub mod mood;
pub mod processor;
pub mod songs;
pub mod state;
pub mod ui;

// Re-export error types
pub use error::{MoodError, Result};

// Re-export configuration
pub use config::{AppConfig, CameraConfig, DetectionConfig, ModelConfig};

// Re-export the mood model
pub use mood::{resolve, Emotion, Expressions, Mood, MoodReading};

// Re-export state types
pub use state::{DetectionStatus, DetectorEvent, DetectorState, SharedDetectorState, StateUpdate};

// Re-export the pipeline entry points
pub use camera::{FrameFeed, FrameSource, StillImageSource, VideoFrame};
pub use processor::{ExpressionBackend, MoodDetector};
