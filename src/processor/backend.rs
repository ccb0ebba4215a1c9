//! Expression-detection capability
//!
//! The detector never looks inside the model. It only needs a backend that
//! can load its resources once and then, per frame, report either "no face"
//! or a score per emotion.

use crate::camera::VideoFrame;
use crate::config::ModelConfig;
use crate::error::{MoodError, Result};
use crate::mood::Expressions;
use parking_lot::Mutex;
use std::sync::Arc;

/// Face + expression detector
///
/// Both methods block; the detector calls them on the blocking pool.
pub trait ExpressionBackend: Send {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Load the face detector and the expression classifier
    fn load_models(&mut self, config: &ModelConfig) -> Result<()>;

    /// Run detection on one frame
    ///
    /// `Ok(None)` means no face was found.
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<Expressions>>;
}

/// Backend shared between the loader and the polling loop
pub type SharedBackend = Arc<Mutex<Box<dyn ExpressionBackend>>>;

pub fn shared(backend: Box<dyn ExpressionBackend>) -> SharedBackend {
    Arc::new(Mutex::new(backend))
}

/// Stand-in when the crate is built without an inference runtime
#[derive(Debug, Default)]
pub struct UnavailableBackend;

impl ExpressionBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn load_models(&mut self, _config: &ModelConfig) -> Result<()> {
        Err(MoodError::ModelLoadError(
            "No expression backend compiled in (build with --features onnx)".to_string(),
        ))
    }

    fn detect(&mut self, _frame: &VideoFrame) -> Result<Option<Expressions>> {
        Err(MoodError::DetectionError(
            "No expression backend available".to_string(),
        ))
    }
}

/// The backend this build ships with
pub fn default_backend() -> Box<dyn ExpressionBackend> {
    #[cfg(feature = "onnx")]
    {
        Box::new(super::onnx::OnnxExpressionBackend::new())
    }
    #[cfg(not(feature = "onnx"))]
    {
        Box::new(UnavailableBackend)
    }
}
