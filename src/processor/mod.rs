//! Detection pipeline
//!
//! - `backend`: the expression-detection capability
//! - `loader`: one-shot model loading
//! - `polling`: the periodic detection loop
//! - `detector`: lifecycle owner tying the three together
//! - `onnx`: ONNX Runtime backend (feature `onnx`)

pub mod backend;
pub mod detector;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod polling;

pub use backend::{default_backend, shared, ExpressionBackend, SharedBackend, UnavailableBackend};
pub use detector::MoodDetector;
pub use loader::{load_into_state, load_models};
#[cfg(feature = "onnx")]
pub use onnx::OnnxExpressionBackend;
pub use polling::{run_tick, LoopPhase, PollingLoop, TickContext, TickOutcome};
