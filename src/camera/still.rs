//! Still image frame source
//!
//! Serves one image as a permanently live camera. Handy on machines without a
//! webcam and for scripted runs against a known face.

use super::{FrameFeed, FrameSource, VideoFrame};
use crate::error::Result;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct StillImageSource {
    feed: FrameFeed,
}

impl StillImageSource {
    /// Decode an image file and publish it
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)?;
        info!(
            "Serving still image {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::from_image(image))
    }

    pub fn from_image(image: DynamicImage) -> Self {
        let feed = FrameFeed::new();
        feed.publish(VideoFrame::from(image.to_rgb8()));
        Self { feed }
    }

    /// The feed the image was published into
    pub fn feed(&self) -> FrameFeed {
        self.feed.clone()
    }
}

impl FrameSource for StillImageSource {
    fn current_frame(&self) -> Option<Arc<VideoFrame>> {
        self.feed.current_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_from_image_is_live() {
        let image = RgbImage::from_pixel(8, 6, Rgb([10, 20, 30]));
        let source = StillImageSource::from_image(DynamicImage::ImageRgb8(image));

        let frame = source.current_frame().unwrap();
        assert_eq!((frame.width, frame.height), (8, 6));
        assert_eq!(&frame.rgb[..3], &[10, 20, 30]);
        assert!(source.feed().is_live());
    }

    #[test]
    fn test_open_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        RgbImage::from_pixel(4, 4, Rgb([200, 150, 100]))
            .save(&path)
            .unwrap();

        let source = StillImageSource::open(&path).unwrap();
        assert!(source.current_frame().unwrap().is_decodable());
    }

    #[test]
    fn test_open_missing_file() {
        assert!(StillImageSource::open("/nonexistent/face.png").is_err());
    }
}
