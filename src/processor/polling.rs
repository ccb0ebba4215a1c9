//! Periodic detection loop
//!
//! One timer task per detector. Each tick reads the newest frame, runs the
//! backend on the blocking pool and writes the resolved mood. A tick is awaited
//! to completion before the next one may fire, and timer ticks missed while a
//! slow detection is in flight are skipped, so results are always written in
//! the order their frames were taken.

use super::backend::SharedBackend;
use crate::camera::FrameSource;
use crate::error::MoodError;
use crate::mood::{resolve, MoodReading};
use crate::state::{DetectorEvent, SharedDetectorState, StateUpdate};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

/// Lifecycle of the polling loop
///
/// `Idle -> Running -> Stopped`, or `Idle -> Stopped`. A stopped loop never
/// runs again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopPhase {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// Everything a tick needs
#[derive(Clone)]
pub struct TickContext {
    pub state: SharedDetectorState,
    pub backend: SharedBackend,
    pub frames: Arc<dyn FrameSource>,
    pub events: Sender<DetectorEvent>,
}

impl TickContext {
    fn notify(&self, event: DetectorEvent) {
        // UI only needs to know something changed; a full queue already says so
        let _ = self.events.try_send(event);
    }
}

/// What a single tick did
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// No decodable frame yet
    Skipped,
    /// Detection finished and was written
    Resolved(MoodReading),
    /// Detection failed; state untouched apart from `last_error`
    Failed(String),
    /// Detector was torn down while the tick ran
    Discarded,
}

/// Run one detection pass
pub async fn run_tick(ctx: &TickContext) -> TickOutcome {
    let frame = match ctx.frames.current_frame() {
        Some(frame) if frame.is_decodable() => frame,
        _ => {
            trace!("No decodable frame, skipping tick");
            return TickOutcome::Skipped;
        }
    };

    if !ctx.state.apply(StateUpdate::ScanStarted) {
        return TickOutcome::Discarded;
    }
    ctx.notify(DetectorEvent::StateChanged);

    let backend = Arc::clone(&ctx.backend);
    let sequence = frame.sequence;
    let result = tokio::task::spawn_blocking(move || backend.lock().detect(&frame))
        .await
        .unwrap_or_else(|e| {
            Err(MoodError::DetectionError(format!(
                "Detection task failed: {}",
                e
            )))
        });

    match result {
        Ok(detection) => {
            let reading = resolve(detection.as_ref());
            if !ctx.state.apply(StateUpdate::Resolved(reading.clone())) {
                debug!("Discarding detection for frame {} after teardown", sequence);
                return TickOutcome::Discarded;
            }
            debug!(
                "Frame {}: {} ({}%)",
                sequence, reading.mood, reading.confidence
            );
            ctx.notify(DetectorEvent::StateChanged);
            TickOutcome::Resolved(reading)
        }
        Err(e) => {
            if e.is_recoverable() {
                warn!("Detection failed for frame {}: {}", sequence, e);
            } else {
                error!("Detection failed for frame {}: {}", sequence, e);
            }
            if !ctx.state.apply(StateUpdate::TickFailed(e.to_string())) {
                return TickOutcome::Discarded;
            }
            ctx.notify(DetectorEvent::StateChanged);
            TickOutcome::Failed(e.to_string())
        }
    }
}

/// Timer driving [`run_tick`] at a fixed period
pub struct PollingLoop {
    period: Duration,
    phase: LoopPhase,
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl PollingLoop {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            phase: LoopPhase::Idle,
            running: Arc::new(AtomicBool::new(false)),
            ticks: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    /// Start the timer
    ///
    /// Returns `true` only when this call started it. Starting a running loop
    /// does nothing, and a stopped loop cannot be restarted.
    pub fn start(&mut self, runtime: &Handle, ctx: TickContext) -> bool {
        match self.phase {
            LoopPhase::Running => {
                debug!("Polling loop already running, ignoring start");
                return false;
            }
            LoopPhase::Stopped => {
                warn!("Polling loop was stopped, ignoring start");
                return false;
            }
            LoopPhase::Idle => {}
        }

        let period = self.period;
        let running = Arc::clone(&self.running);
        let ticks = Arc::clone(&self.ticks);
        running.store(true, Ordering::SeqCst);

        let task = runtime.spawn(async move {
            // First tick fires one period after start, like a plain interval timer
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                ticks.fetch_add(1, Ordering::SeqCst);
                run_tick(&ctx).await;
            }
        });

        self.task = Some(task);
        self.phase = LoopPhase::Running;
        info!("Polling loop started ({} ms period)", period.as_millis());
        true
    }

    /// Stop the timer for good
    pub fn stop(&mut self) {
        if self.phase == LoopPhase::Stopped {
            return;
        }

        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
            info!(
                "Polling loop stopped after {} ticks",
                self.ticks.load(Ordering::SeqCst)
            );
        }
        self.phase = LoopPhase::Stopped;
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == LoopPhase::Running
    }

    /// Number of timer ticks fired so far
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for PollingLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{FrameFeed, VideoFrame};
    use crate::config::ModelConfig;
    use crate::error::Result;
    use crate::mood::Expressions;
    use crate::processor::backend::{shared, ExpressionBackend};
    use crate::state::DetectionStatus;
    use crossbeam_channel::bounded;
    use std::sync::atomic::AtomicUsize;

    const PERIOD: Duration = Duration::from_millis(20);

    /// Reports `happy` with a score that grows by 0.01 per call
    #[derive(Clone, Default)]
    struct CountingBackend {
        calls: Arc<AtomicUsize>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
        delay: Duration,
        fail: bool,
    }

    impl ExpressionBackend for CountingBackend {
        fn name(&self) -> &str {
            "counting"
        }

        fn load_models(&mut self, _config: &ModelConfig) -> Result<()> {
            Ok(())
        }

        fn detect(&mut self, _frame: &VideoFrame) -> Result<Option<Expressions>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail {
                return Err(MoodError::DetectionError("scripted failure".into()));
            }
            Ok(Some(
                Expressions::new()
                    .with("happy", call as f32 / 100.0)
                    .with("neutral", 0.0),
            ))
        }
    }

    fn live_feed() -> FrameFeed {
        let feed = FrameFeed::new();
        feed.publish(VideoFrame::new(2, 2, vec![90; 12]));
        feed
    }

    fn context(backend: CountingBackend, feed: FrameFeed) -> TickContext {
        let state = SharedDetectorState::new();
        state.apply(StateUpdate::ModelsLoaded);
        let (events, _rx) = bounded(16);
        TickContext {
            state,
            backend: shared(Box::new(backend)),
            frames: Arc::new(feed),
            events,
        }
    }

    #[tokio::test]
    async fn test_tick_without_frame_is_skipped() {
        let ctx = context(CountingBackend::default(), FrameFeed::new());

        assert_eq!(run_tick(&ctx).await, TickOutcome::Skipped);
        assert_eq!(ctx.state.status(), DetectionStatus::Ready);
        assert_eq!(ctx.state.detections(), 0);
    }

    #[tokio::test]
    async fn test_tick_resolves_mood() {
        let ctx = context(CountingBackend::default(), live_feed());

        let outcome = run_tick(&ctx).await;

        let reading = ctx.state.reading();
        assert_eq!(outcome, TickOutcome::Resolved(reading.clone()));
        assert_eq!(reading.mood.label(), "HAPPY");
        assert_eq!(reading.confidence, 1);
        assert_eq!(ctx.state.status(), DetectionStatus::Scanning);
    }

    #[tokio::test]
    async fn test_failed_tick_is_recoverable() {
        let backend = CountingBackend {
            fail: true,
            ..Default::default()
        };
        let ctx = context(backend, live_feed());

        assert!(matches!(run_tick(&ctx).await, TickOutcome::Failed(_)));
        assert_eq!(ctx.state.reading(), MoodReading::default());
        assert!(ctx.state.can_detect());
        assert!(ctx.state.last_error().is_some());
    }

    /// Fails every detection with an environment error
    struct BrokenCameraBackend;

    impl ExpressionBackend for BrokenCameraBackend {
        fn name(&self) -> &str {
            "broken-camera"
        }

        fn load_models(&mut self, _config: &ModelConfig) -> Result<()> {
            Ok(())
        }

        fn detect(&mut self, _frame: &VideoFrame) -> Result<Option<Expressions>> {
            Err(MoodError::CameraError("device unplugged".into()))
        }
    }

    #[tokio::test]
    async fn test_unrecoverable_error_only_skips_the_tick() {
        let mut ctx = context(CountingBackend::default(), live_feed());
        ctx.backend = shared(Box::new(BrokenCameraBackend));

        let outcome = run_tick(&ctx).await;
        assert_eq!(
            outcome,
            TickOutcome::Failed("Camera error: device unplugged".into())
        );
        assert!(ctx.state.can_detect());
        assert_eq!(ctx.state.status(), DetectionStatus::Scanning);

        // Next tick runs and fails the same way
        assert!(matches!(run_tick(&ctx).await, TickOutcome::Failed(_)));
        assert_eq!(ctx.state.reading(), MoodReading::default());
    }

    #[tokio::test]
    async fn test_tick_after_close_is_discarded() {
        let ctx = context(CountingBackend::default(), live_feed());
        ctx.state.close();

        assert_eq!(run_tick(&ctx).await, TickOutcome::Discarded);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_double_start_runs_one_timer() {
        let backend = CountingBackend::default();
        let calls = Arc::clone(&backend.calls);
        let ctx = context(backend, live_feed());
        let mut polling = PollingLoop::new(PERIOD);

        assert!(polling.start(&Handle::current(), ctx.clone()));
        assert!(!polling.start(&Handle::current(), ctx.clone()));
        assert_eq!(polling.phase(), LoopPhase::Running);

        tokio::time::sleep(PERIOD * 10).await;
        polling.stop();

        // One timer fires about 10 times; a second one would double that
        let ticks = polling.tick_count();
        assert!(ticks >= 3, "expected ticks, got {}", ticks);
        assert!(ticks <= 12, "too many ticks for one timer: {}", ticks);
        assert!(calls.load(Ordering::SeqCst) as u64 <= ticks);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_prevents_further_ticks() {
        let ctx = context(CountingBackend::default(), live_feed());
        let mut polling = PollingLoop::new(PERIOD);

        polling.start(&Handle::current(), ctx.clone());
        tokio::time::sleep(PERIOD * 4).await;
        polling.stop();
        assert_eq!(polling.phase(), LoopPhase::Stopped);

        // Let an in-progress poll settle before taking the baseline
        tokio::time::sleep(PERIOD).await;
        let after_stop = polling.tick_count();
        tokio::time::sleep(PERIOD * 5).await;

        assert_eq!(polling.tick_count(), after_stop);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stopped_loop_cannot_restart() {
        let ctx = context(CountingBackend::default(), live_feed());
        let mut polling = PollingLoop::new(PERIOD);

        polling.stop();
        assert_eq!(polling.phase(), LoopPhase::Stopped);
        assert!(!polling.start(&Handle::current(), ctx));
        assert!(!polling.is_running());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_slow_detections_never_overlap() {
        let backend = CountingBackend {
            delay: PERIOD * 3,
            ..Default::default()
        };
        let calls = Arc::clone(&backend.calls);
        let max_in_flight = Arc::clone(&backend.max_in_flight);
        let ctx = context(backend, live_feed());
        let mut polling = PollingLoop::new(PERIOD);

        polling.start(&Handle::current(), ctx.clone());
        tokio::time::sleep(PERIOD * 15).await;
        polling.stop();
        tokio::time::sleep(PERIOD * 4).await;

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);

        // Each write came from the newest call, so the last reading matches
        // the number of completed detections
        let completed = calls.load(Ordering::SeqCst);
        assert!(completed >= 2);
        let state = ctx.state.snapshot();
        assert_eq!(state.reading.confidence as usize, state.detections as usize);
        assert!(state.detections as usize <= completed);
    }
}
