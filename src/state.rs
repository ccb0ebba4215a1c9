//! Detector state shared between the detection loop and the UI
//!
//! The loader and the polling loop are the only writers, and they write
//! exclusively through [`DetectorState::apply`]. The UI and tests only read,
//! either through the convenience getters or an owned snapshot.
//!
//! Closing the state on teardown makes every later write a no-op, so a
//! detection that finishes after its detector is gone cannot leak through.

use crate::mood::{Mood, MoodReading};
use chrono::{DateTime, Local};
use parking_lot::RwLock;
use std::sync::Arc;

/// Lifecycle status of the detector as shown in the header badge
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DetectionStatus {
    /// Models are being loaded
    #[default]
    Loading,
    /// Models loaded, waiting for the first scan
    Ready,
    /// Models failed to load; detection is disabled
    Error,
    /// At least one detection pass has started
    Scanning,
}

impl DetectionStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, DetectionStatus::Error)
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self, DetectionStatus::Scanning)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DetectionStatus::Loading => "LOADING",
            DetectionStatus::Ready => "READY",
            DetectionStatus::Error => "ERROR",
            DetectionStatus::Scanning => "SCANNING",
        }
    }
}

impl std::fmt::Display for DetectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single state transition
#[derive(Clone, Debug, PartialEq)]
pub enum StateUpdate {
    /// Both models loaded
    ModelsLoaded,
    /// Model loading failed
    ModelsFailed(String),
    /// A tick found a decodable frame and issued a detection
    ScanStarted,
    /// A detection completed
    Resolved(MoodReading),
    /// A detection failed; the tick is dropped
    TickFailed(String),
}

/// Detector state
#[derive(Clone, Debug, Default)]
pub struct DetectorState {
    pub status: DetectionStatus,
    /// Current mood and its confidence
    pub reading: MoodReading,
    /// Whether detection may run at all
    pub models_loaded: bool,
    /// Number of completed detections
    pub detections: u64,
    /// Last recoverable error (tick failure) or the load failure
    pub last_error: Option<String>,
    /// When the current reading was produced
    pub last_detection_at: Option<DateTime<Local>>,
    /// Set on teardown; no further updates are accepted
    pub closed: bool,
}

impl DetectorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a transition, returning whether it was accepted
    ///
    /// Once loading failed the state is frozen; nothing after it can bring
    /// detection back for this session.
    pub fn apply(&mut self, update: StateUpdate) -> bool {
        if self.closed || self.status.is_error() {
            return false;
        }

        match update {
            StateUpdate::ModelsLoaded => {
                self.models_loaded = true;
                self.status = DetectionStatus::Ready;
            }
            StateUpdate::ModelsFailed(message) => {
                self.models_loaded = false;
                self.status = DetectionStatus::Error;
                self.last_error = Some(message);
            }
            StateUpdate::ScanStarted => {
                if self.models_loaded {
                    self.status = DetectionStatus::Scanning;
                }
            }
            StateUpdate::Resolved(reading) => {
                if self.models_loaded {
                    self.reading = reading;
                    self.detections += 1;
                    self.last_detection_at = Some(Local::now());
                    self.last_error = None;
                }
            }
            StateUpdate::TickFailed(message) => {
                self.last_error = Some(message);
            }
        }
        true
    }

    pub fn mood(&self) -> &Mood {
        &self.reading.mood
    }

    pub fn confidence(&self) -> u8 {
        self.reading.confidence
    }

    /// Detection may be started (models loaded, not failed)
    pub fn can_detect(&self) -> bool {
        self.models_loaded && !self.status.is_error()
    }
}

/// Thread-safe shared detector state
#[derive(Clone, Default)]
pub struct SharedDetectorState {
    inner: Arc<RwLock<DetectorState>>,
}

impl SharedDetectorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a transition under the write lock
    pub fn apply(&self, update: StateUpdate) -> bool {
        self.inner.write().apply(update)
    }

    /// Stop accepting updates
    pub fn close(&self) {
        self.inner.write().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().closed
    }

    /// Get a read lock on the state
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, DetectorState> {
        self.inner.read()
    }

    /// Owned copy of the current state (no lock held after return)
    pub fn snapshot(&self) -> DetectorState {
        self.inner.read().clone()
    }

    // === Convenience read methods ===

    pub fn status(&self) -> DetectionStatus {
        self.inner.read().status
    }

    /// Current mood and confidence, read together
    pub fn reading(&self) -> MoodReading {
        self.inner.read().reading.clone()
    }

    pub fn models_loaded(&self) -> bool {
        self.inner.read().models_loaded
    }

    pub fn can_detect(&self) -> bool {
        self.inner.read().can_detect()
    }

    pub fn detections(&self) -> u64 {
        self.inner.read().detections
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.read().last_error.clone()
    }
}

/// Notifications for the UI
///
/// State itself is read from [`SharedDetectorState`]; events only tell the UI
/// that something changed and it should repaint.
#[derive(Clone, Debug, PartialEq)]
pub enum DetectorEvent {
    /// State has changed
    StateChanged,
    /// Error the user should see
    Error(String),
    /// Detector torn down
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::Mood;

    fn happy(confidence: u8) -> MoodReading {
        MoodReading {
            mood: Mood::detected("happy"),
            confidence,
        }
    }

    #[test]
    fn test_initial_state() {
        let state = DetectorState::new();
        assert_eq!(state.status, DetectionStatus::Loading);
        assert_eq!(state.mood().label(), "INITIALIZING");
        assert_eq!(state.confidence(), 0);
        assert!(!state.can_detect());
    }

    #[test]
    fn test_load_then_scan() {
        let mut state = DetectorState::new();
        state.apply(StateUpdate::ModelsLoaded);
        assert_eq!(state.status, DetectionStatus::Ready);
        assert!(state.can_detect());

        state.apply(StateUpdate::ScanStarted);
        assert_eq!(state.status, DetectionStatus::Scanning);

        state.apply(StateUpdate::Resolved(happy(91)));
        assert_eq!(state.mood().label(), "HAPPY");
        assert_eq!(state.confidence(), 91);
        assert_eq!(state.detections, 1);
        assert!(state.last_detection_at.is_some());
        // status stays SCANNING between ticks
        assert_eq!(state.status, DetectionStatus::Scanning);
    }

    #[test]
    fn test_load_failure_freezes_state() {
        let mut state = DetectorState::new();
        state.apply(StateUpdate::ModelsFailed("weights missing".into()));
        assert_eq!(state.status, DetectionStatus::Error);
        assert!(!state.can_detect());

        state.apply(StateUpdate::ModelsLoaded);
        state.apply(StateUpdate::ScanStarted);
        state.apply(StateUpdate::Resolved(happy(50)));

        assert_eq!(state.status, DetectionStatus::Error);
        assert_eq!(state.mood().label(), "INITIALIZING");
        assert_eq!(state.last_error.as_deref(), Some("weights missing"));
    }

    #[test]
    fn test_no_face_overrides_previous_mood() {
        let mut state = DetectorState::new();
        state.apply(StateUpdate::ModelsLoaded);
        state.apply(StateUpdate::Resolved(happy(80)));
        state.apply(StateUpdate::Resolved(MoodReading::no_face()));

        assert_eq!(state.mood().label(), "NO FACE");
        assert_eq!(state.confidence(), 0);
    }

    #[test]
    fn test_tick_failure_keeps_reading() {
        let mut state = DetectorState::new();
        state.apply(StateUpdate::ModelsLoaded);
        state.apply(StateUpdate::Resolved(happy(70)));
        state.apply(StateUpdate::TickFailed("backend hiccup".into()));

        assert_eq!(state.confidence(), 70);
        assert_eq!(state.mood().label(), "HAPPY");
        assert_eq!(state.last_error.as_deref(), Some("backend hiccup"));
        assert!(state.can_detect());
    }

    #[test]
    fn test_scan_before_load_is_ignored() {
        let mut state = DetectorState::new();
        state.apply(StateUpdate::ScanStarted);
        state.apply(StateUpdate::Resolved(happy(10)));
        assert_eq!(state.status, DetectionStatus::Loading);
        assert_eq!(state.detections, 0);
    }

    #[test]
    fn test_shared_state_snapshot_is_independent() {
        let shared = SharedDetectorState::new();
        let before = shared.snapshot();

        shared.apply(StateUpdate::ModelsLoaded);

        assert_eq!(before.status, DetectionStatus::Loading);
        assert_eq!(shared.status(), DetectionStatus::Ready);
        assert!(shared.models_loaded());
    }

    #[test]
    fn test_closed_state_rejects_updates() {
        let shared = SharedDetectorState::new();
        assert!(shared.apply(StateUpdate::ModelsLoaded));
        shared.close();

        assert!(!shared.apply(StateUpdate::Resolved(happy(99))));
        assert!(shared.is_closed());
        assert_eq!(shared.reading(), MoodReading::default());
        assert_eq!(shared.detections(), 0);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(DetectionStatus::Loading.to_string(), "LOADING");
        assert_eq!(DetectionStatus::Ready.to_string(), "READY");
        assert_eq!(DetectionStatus::Error.to_string(), "ERROR");
        assert_eq!(DetectionStatus::Scanning.to_string(), "SCANNING");
    }
}
