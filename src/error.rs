//! Error types for the Moody Player application

use thiserror::Error;

/// Moody Player errors
#[derive(Error, Debug, Clone)]
pub enum MoodError {
    /// Camera initialization or capture error
    #[error("Camera error: {0}")]
    CameraError(String),

    /// Face detector or expression classifier failed to load
    #[error("Model load error: {0}")]
    ModelLoadError(String),

    /// A single detection pass failed
    #[error("Detection error: {0}")]
    DetectionError(String),

    /// Image decoding or conversion error
    #[error("Image error: {0}")]
    ImageError(String),

    /// Channel communication error
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// File system I/O error
    #[error("IO error: {0}")]
    IOError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for MoodError {
    fn from(e: std::io::Error) -> Self {
        MoodError::IOError(e.to_string())
    }
}

impl From<image::ImageError> for MoodError {
    fn from(e: image::ImageError) -> Self {
        MoodError::ImageError(e.to_string())
    }
}

impl MoodError {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors are tied to a single frame and go away on their own.
    /// The rest point at the environment (camera, model files, config) and are
    /// logged as errors so the user can act on them. Either way a failed tick
    /// only skips that tick.
    pub fn is_recoverable(&self) -> bool {
        match self {
            MoodError::CameraError(_) => false,
            // No retry once models fail to load
            MoodError::ModelLoadError(_) => false,
            MoodError::DetectionError(_) => true,
            MoodError::ImageError(_) => true,
            MoodError::ChannelError(_) => false,
            MoodError::IOError(_) => false,
            MoodError::ConfigError(_) => false,
        }
    }

    /// Get a user-friendly description of the error
    pub fn user_message(&self) -> String {
        match self {
            MoodError::CameraError(_) => {
                "Camera unavailable. Please check that a webcam is connected.".to_string()
            }
            MoodError::ModelLoadError(_) => {
                "Failed to load the expression models. Please verify the model files are present."
                    .to_string()
            }
            MoodError::DetectionError(_) => {
                "Expression detection failed for this frame.".to_string()
            }
            MoodError::ImageError(_) => "Could not read the image.".to_string(),
            MoodError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            MoodError::IOError(_) => "File system error occurred.".to_string(),
            MoodError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
        }
    }
}

/// Result type alias for Moody Player operations
pub type Result<T> = std::result::Result<T, MoodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_load_error_is_permanent() {
        let err = MoodError::ModelLoadError("missing weights".into());
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Model load error: missing weights");
    }

    #[test]
    fn test_detection_error_is_recoverable() {
        let err = MoodError::DetectionError("bad tensor".into());
        assert!(err.is_recoverable());
        assert!(err.user_message().contains("detection failed"));
    }

    #[test]
    fn test_frame_errors_are_recoverable_environment_errors_are_not() {
        assert!(MoodError::ImageError("truncated".into()).is_recoverable());
        assert!(!MoodError::CameraError("unplugged".into()).is_recoverable());
        assert!(!MoodError::ConfigError("bad".into()).is_recoverable());
        assert!(!MoodError::IOError("denied".into()).is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MoodError = io.into();
        assert!(matches!(err, MoodError::IOError(_)));
    }
}
