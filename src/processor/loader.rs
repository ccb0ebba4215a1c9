//! Model loading
//!
//! Runs once per detector. Success unlocks detection; failure disables it for
//! the rest of the session.

use super::backend::SharedBackend;
use crate::config::ModelConfig;
use crate::error::{MoodError, Result};
use crate::state::{SharedDetectorState, StateUpdate};
use tracing::{error, info};

/// Load both models on the blocking pool
pub async fn load_models(backend: SharedBackend, config: ModelConfig) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        let mut backend = backend.lock();
        info!(
            "Loading expression models from {} ({} backend)",
            config.dir.display(),
            backend.name()
        );
        backend.load_models(&config)
    })
    .await
    .map_err(|e| MoodError::ModelLoadError(format!("Model loading task failed: {}", e)))?
}

/// Load the models and record the outcome in `state`
pub async fn load_into_state(
    backend: SharedBackend,
    config: ModelConfig,
    state: &SharedDetectorState,
) -> Result<()> {
    match load_models(backend, config).await {
        Ok(()) => {
            info!("Expression models loaded");
            state.apply(StateUpdate::ModelsLoaded);
            Ok(())
        }
        Err(e) => {
            error!("Failed to load expression models: {}", e);
            state.apply(StateUpdate::ModelsFailed(e.to_string()));
            Err(e)
        }
    }
}
