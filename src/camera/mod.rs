//! Camera capability
//!
//! Capture code publishes frames into a [`FrameFeed`]; the detection loop and
//! the preview only ever ask for the latest decodable frame.

mod still;
#[cfg(feature = "webcam")]
mod webcam;

pub use still::StillImageSource;
#[cfg(feature = "webcam")]
pub use webcam::WebcamCapture;

use crate::error::{MoodError, Result};
use image::RgbImage;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One RGB8 video frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGB8 rows
    pub rgb: Vec<u8>,
    /// Increases with every published frame
    pub sequence: u64,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgb,
            sequence: 0,
        }
    }

    /// Frame with both dimensions set and a buffer of the matching size
    pub fn is_decodable(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.rgb.len() == self.width as usize * self.height as usize * 3
    }

    /// Copy into an `image` buffer
    pub fn to_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.rgb.clone()).ok_or_else(|| {
            MoodError::ImageError(format!(
                "Frame buffer of {} bytes does not match {}x{}",
                self.rgb.len(),
                self.width,
                self.height
            ))
        })
    }
}

impl From<RgbImage> for VideoFrame {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        VideoFrame::new(width, height, image.into_raw())
    }
}

/// Something that can hand out the current camera frame
pub trait FrameSource: Send + Sync {
    /// Latest decodable frame, or `None` while the source is not producing
    fn current_frame(&self) -> Option<Arc<VideoFrame>>;
}

/// Latest-frame slot shared between capture and consumers
#[derive(Clone, Default)]
pub struct FrameFeed {
    latest: Arc<RwLock<Option<Arc<VideoFrame>>>>,
    sequence: Arc<AtomicU64>,
}

impl FrameFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current frame
    ///
    /// Undecodable frames are dropped so readers never see them.
    pub fn publish(&self, mut frame: VideoFrame) -> bool {
        if !frame.is_decodable() {
            return false;
        }
        frame.sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        *self.latest.write() = Some(Arc::new(frame));
        true
    }

    /// Forget the current frame (camera went away)
    pub fn clear(&self) {
        *self.latest.write() = None;
    }

    /// Number of frames published so far
    pub fn published(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub fn is_live(&self) -> bool {
        self.latest.read().is_some()
    }
}

impl FrameSource for FrameFeed {
    fn current_frame(&self) -> Option<Arc<VideoFrame>> {
        self.latest.read().clone()
    }
}
