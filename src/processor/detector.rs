//! Mood detector
//!
//! Owns the detection lifecycle:
//! - loads the models once, on construction
//! - starts the polling loop when the models are loaded and the camera has a
//!   frame, whichever happens last
//! - stops the loop and closes the state on teardown
//!
//! The UI holds one of these and reads [`MoodDetector::state`] every frame.

use super::backend::{shared, ExpressionBackend};
use super::loader::load_into_state;
use super::polling::{LoopPhase, PollingLoop, TickContext};
use crate::camera::FrameSource;
use crate::config::AppConfig;
use crate::state::{DetectorEvent, SharedDetectorState};
use crossbeam_channel::{bounded, Receiver};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub struct MoodDetector {
    runtime: Handle,
    ctx: TickContext,
    polling: Arc<Mutex<PollingLoop>>,
    event_rx: Receiver<DetectorEvent>,
    load_task: Option<JoinHandle<()>>,
    shut_down: bool,
}

impl MoodDetector {
    /// Create the detector and kick off model loading
    pub fn new(
        config: &AppConfig,
        backend: Box<dyn ExpressionBackend>,
        frames: Arc<dyn FrameSource>,
        runtime: Handle,
    ) -> Self {
        let (event_tx, event_rx) = bounded(config.detection.event_buffer);

        let ctx = TickContext {
            state: SharedDetectorState::new(),
            backend: shared(backend),
            frames,
            events: event_tx,
        };
        let polling = Arc::new(Mutex::new(PollingLoop::new(config.detection.interval())));

        let load_task = {
            let ctx = ctx.clone();
            let polling = Arc::clone(&polling);
            let models = config.models.clone();
            let handle = runtime.clone();

            runtime.spawn(async move {
                let loaded =
                    load_into_state(Arc::clone(&ctx.backend), models, &ctx.state).await;
                match loaded {
                    Ok(()) => {
                        let _ = ctx.events.try_send(DetectorEvent::StateChanged);
                        try_start(&polling, &handle, &ctx);
                    }
                    Err(e) => {
                        let _ = ctx.events.try_send(DetectorEvent::Error(e.user_message()));
                    }
                }
            })
        };

        Self {
            runtime,
            ctx,
            polling,
            event_rx,
            load_task: Some(load_task),
            shut_down: false,
        }
    }

    /// Start periodic detection
    ///
    /// No effect until the models are loaded and the camera delivers frames,
    /// and no effect while already running. Returns `true` if this call
    /// started the loop.
    pub fn start_detection(&self) -> bool {
        if self.shut_down {
            return false;
        }
        try_start(&self.polling, &self.runtime, &self.ctx)
    }

    /// Tell the detector the camera is delivering frames
    pub fn camera_ready(&self) -> bool {
        debug!("Camera reported ready");
        self.start_detection()
    }

    /// Stop detection for good
    ///
    /// Aborts the timer and model loading, and closes the state so a detection
    /// still running on the blocking pool cannot write its result.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.polling.lock().stop();
        self.ctx.state.close();
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        let _ = self.ctx.events.try_send(DetectorEvent::Stopped);
        info!("Mood detector shut down");
    }

    pub fn state(&self) -> &SharedDetectorState {
        &self.ctx.state
    }

    /// Receiver for UI notifications
    pub fn events(&self) -> Receiver<DetectorEvent> {
        self.event_rx.clone()
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<DetectorEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn loop_phase(&self) -> LoopPhase {
        self.polling.lock().phase()
    }

    pub fn is_polling(&self) -> bool {
        self.polling.lock().is_running()
    }

    /// Timer ticks fired so far
    pub fn tick_count(&self) -> u64 {
        self.polling.lock().tick_count()
    }

    /// Whether model loading has finished (either way)
    pub fn load_finished(&self) -> bool {
        self.load_task
            .as_ref()
            .map_or(true, |task| task.is_finished())
    }
}

impl Drop for MoodDetector {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn try_start(polling: &Mutex<PollingLoop>, runtime: &Handle, ctx: &TickContext) -> bool {
    if !ctx.state.can_detect() {
        debug!("Models not ready, detection not started");
        return false;
    }
    if ctx.frames.current_frame().is_none() {
        debug!("No camera frame yet, detection not started");
        return false;
    }
    polling.lock().start(runtime, ctx.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{FrameFeed, VideoFrame};
    use crate::config::ModelConfig;
    use crate::error::{MoodError, Result};
    use crate::mood::Expressions;
    use crate::processor::backend::UnavailableBackend;
    use crate::state::DetectionStatus;
    use std::time::Duration;

    struct FixedBackend {
        expressions: Option<Expressions>,
    }

    impl ExpressionBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }

        fn load_models(&mut self, _config: &ModelConfig) -> Result<()> {
            Ok(())
        }

        fn detect(&mut self, _frame: &VideoFrame) -> Result<Option<Expressions>> {
            Ok(self.expressions.clone())
        }
    }

    fn config() -> AppConfig {
        AppConfig::default().with_interval_ms(20)
    }

    fn live_feed() -> FrameFeed {
        let feed = FrameFeed::new();
        feed.publish(VideoFrame::new(2, 2, vec![60; 12]));
        feed
    }

    async fn wait_for_load(detector: &MoodDetector) {
        for _ in 0..100 {
            if detector.load_finished() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("model loading did not finish");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_load_failure_disables_detection() {
        let detector = MoodDetector::new(
            &config(),
            Box::new(UnavailableBackend),
            Arc::new(live_feed()),
            Handle::current(),
        );
        wait_for_load(&detector).await;

        assert_eq!(detector.state().status(), DetectionStatus::Error);
        assert!(!detector.start_detection());
        assert!(!detector.camera_ready());
        assert_eq!(detector.loop_phase(), LoopPhase::Idle);

        let events: Vec<_> = detector.events().try_iter().collect();
        assert!(matches!(events.as_slice(), [DetectorEvent::Error(_)]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_starts_after_load_when_camera_live() {
        let backend = FixedBackend {
            expressions: Some(Expressions::new().with("sad", 0.8).with("happy", 0.1)),
        };
        let detector = MoodDetector::new(
            &config(),
            Box::new(backend),
            Arc::new(live_feed()),
            Handle::current(),
        );
        wait_for_load(&detector).await;

        assert!(detector.is_polling());
        // Already running
        assert!(!detector.start_detection());

        tokio::time::sleep(Duration::from_millis(100)).await;
        let reading = detector.state().reading();
        assert_eq!(reading.mood.label(), "SAD");
        assert_eq!(reading.confidence, 80);
        assert_eq!(detector.state().status(), DetectionStatus::Scanning);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waits_for_camera() {
        let feed = FrameFeed::new();
        let detector = MoodDetector::new(
            &config(),
            Box::new(FixedBackend { expressions: None }),
            Arc::new(feed.clone()),
            Handle::current(),
        );
        wait_for_load(&detector).await;

        assert_eq!(detector.state().status(), DetectionStatus::Ready);
        assert!(!detector.is_polling());
        assert!(!detector.camera_ready());

        feed.publish(VideoFrame::new(1, 1, vec![0, 0, 0]));
        assert!(detector.camera_ready());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(detector.state().reading().mood.label(), "NO FACE");
        assert_eq!(detector.state().reading().confidence, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_stops_everything() {
        let mut detector = MoodDetector::new(
            &config(),
            Box::new(FixedBackend { expressions: None }),
            Arc::new(live_feed()),
            Handle::current(),
        );
        wait_for_load(&detector).await;
        assert!(detector.is_polling());

        detector.shutdown();

        assert_eq!(detector.loop_phase(), LoopPhase::Stopped);
        assert!(detector.state().is_closed());
        assert!(!detector.start_detection());

        tokio::time::sleep(Duration::from_millis(30)).await;
        let ticks = detector.tick_count();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(detector.tick_count(), ticks);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_load_error_is_reported_as_user_message() {
        let detector = MoodDetector::new(
            &config(),
            Box::new(UnavailableBackend),
            Arc::new(FrameFeed::new()),
            Handle::current(),
        );
        wait_for_load(&detector).await;

        let expected = MoodError::ModelLoadError(String::new()).user_message();
        assert_eq!(
            detector.try_recv_event(),
            Some(DetectorEvent::Error(expected))
        );
    }
}
