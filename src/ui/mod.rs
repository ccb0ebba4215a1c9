//! UI components and application module
//!
//! The egui/eframe front end: header with status badge, camera preview,
//! mood card and song list.

mod app;
pub mod components;
pub mod mood_style;
mod theme;

pub use app::MoodyApp;
pub use components::{CameraView, MoodCard, PreviewTexture, SongList, StatusBadge};
pub use mood_style::MoodStyle;
pub use theme::Theme;
