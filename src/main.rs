//! Moody Player - webcam mood detector
//!
//! Main entry point. Usage: `moody-player [config.toml]`

use anyhow::{Context, Result};
use eframe::egui;
use moody_player::camera::{FrameFeed, StillImageSource};
use moody_player::config::AppConfig;
use moody_player::processor::{default_backend, MoodDetector};
use moody_player::ui::MoodyApp;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moody_player=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Moody Player");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::resolve(config_path.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("moody-worker")
        .build()
        .context("Failed to start async runtime")?;

    let frames = match &config.camera.still_image {
        Some(path) => StillImageSource::open(path)?.feed(),
        None => FrameFeed::new(),
    };

    #[cfg(feature = "webcam")]
    let capture = if config.camera.still_image.is_none() {
        let mut capture = moody_player::camera::WebcamCapture::new(config.camera.index, frames.clone());
        match capture.start() {
            Ok(()) => Some(capture),
            Err(e) => {
                warn!("Camera unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    #[cfg(not(feature = "webcam"))]
    {
        if config.camera.still_image.is_none() {
            warn!("Built without webcam support and no still image configured, camera stays off");
        }
    }

    let detector = MoodDetector::new(
        &config,
        default_backend(),
        Arc::new(frames.clone()),
        runtime.handle().clone(),
    );

    let app = MoodyApp::new(detector, frames);
    #[cfg(feature = "webcam")]
    let app = match capture {
        Some(capture) => app.with_capture(capture),
        None => app,
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 820.0])
            .with_min_inner_size([360.0, 560.0])
            .with_title("Moody Player"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "Moody Player",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    );

    // A detection may still be running on the blocking pool
    runtime.shutdown_timeout(Duration::from_secs(1));

    result.map_err(|e| anyhow::anyhow!("UI error: {}", e))
}
