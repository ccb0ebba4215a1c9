//! Reusable UI components

pub mod camera_view;
pub mod mood_card;
pub mod song_list;
pub mod status_badge;

pub use camera_view::{CameraView, PreviewTexture};
pub use mood_card::MoodCard;
pub use song_list::SongList;
pub use status_badge::StatusBadge;
