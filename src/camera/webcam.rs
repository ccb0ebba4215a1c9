//! Webcam capture using OpenCV
//!
//! A background thread reads frames from the camera, converts them from BGR to
//! RGB and publishes them into a [`FrameFeed`].

use super::{FrameFeed, VideoFrame};
use crate::error::{MoodError, Result};
use crossbeam_channel::bounded;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Consecutive failed reads before the feed is cleared
const MAX_FAILED_READS: u32 = 30;

/// Webcam capture feeding a [`FrameFeed`]
pub struct WebcamCapture {
    index: i32,
    feed: FrameFeed,
    is_capturing: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WebcamCapture {
    pub fn new(index: i32, feed: FrameFeed) -> Self {
        Self {
            index,
            feed,
            is_capturing: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    /// Open the camera and start capturing
    ///
    /// Returns once the device is open (or failed to open). Calling this while
    /// already capturing does nothing.
    pub fn start(&mut self) -> Result<()> {
        if self.is_capturing.load(Ordering::SeqCst) {
            warn!("Already capturing, ignoring start request");
            return Ok(());
        }

        let index = self.index;
        let feed = self.feed.clone();
        let is_capturing = Arc::clone(&self.is_capturing);
        let (opened_tx, opened_rx) = bounded::<Result<()>>(1);

        is_capturing.store(true, Ordering::SeqCst);

        let handle = thread::Builder::new()
            .name("webcam-capture".to_string())
            .spawn(move || {
                let mut capture = match open_camera(index) {
                    Ok(capture) => {
                        let _ = opened_tx.send(Ok(()));
                        capture
                    }
                    Err(e) => {
                        is_capturing.store(false, Ordering::SeqCst);
                        let _ = opened_tx.send(Err(e));
                        return;
                    }
                };

                capture_loop(&mut capture, &feed, &is_capturing);
                feed.clear();
                info!("Webcam capture stopped");
            })
            .map_err(|e| MoodError::CameraError(format!("Failed to spawn capture thread: {}", e)))?;

        self.thread = Some(handle);

        opened_rx
            .recv()
            .map_err(|e| MoodError::ChannelError(format!("Capture thread vanished: {}", e)))?
    }

    /// Stop capturing and join the capture thread
    pub fn stop(&mut self) {
        self.is_capturing.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                error!("Webcam capture thread panicked");
            }
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.is_capturing.load(Ordering::SeqCst)
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

fn open_camera(index: i32) -> Result<VideoCapture> {
    let mut capture = VideoCapture::new(index, videoio::CAP_ANY)
        .map_err(|e| MoodError::CameraError(format!("Failed to open camera {}: {}", index, e)))?;

    let opened = capture
        .is_opened()
        .map_err(|e| MoodError::CameraError(e.to_string()))?;
    if !opened {
        return Err(MoodError::CameraError(format!(
            "Camera {} is not available",
            index
        )));
    }

    // Keep latency low: we only ever want the newest frame
    if let Err(e) = capture.set(CAP_PROP_BUFFERSIZE, 1.0) {
        debug!("Camera ignored buffer size hint: {}", e);
    }

    info!("Opened camera {}", index);
    Ok(capture)
}

fn capture_loop(capture: &mut VideoCapture, feed: &FrameFeed, is_capturing: &AtomicBool) {
    let mut bgr = Mat::default();
    let mut failed_reads = 0u32;

    while is_capturing.load(Ordering::SeqCst) {
        match read_frame(capture, &mut bgr) {
            Ok(Some(frame)) => {
                failed_reads = 0;
                feed.publish(frame);
            }
            Ok(None) => {
                failed_reads += 1;
                if failed_reads == MAX_FAILED_READS {
                    warn!("Camera stopped delivering frames");
                    feed.clear();
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                error!("Camera read failed: {}", e);
                is_capturing.store(false, Ordering::SeqCst);
            }
        }
    }
}

fn read_frame(capture: &mut VideoCapture, bgr: &mut Mat) -> Result<Option<VideoFrame>> {
    let grabbed = capture
        .read(bgr)
        .map_err(|e| MoodError::CameraError(e.to_string()))?;
    if !grabbed || bgr.empty() {
        return Ok(None);
    }

    let mut rgb = Mat::default();
    imgproc::cvt_color(bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
        .map_err(|e| MoodError::CameraError(format!("Color conversion failed: {}", e)))?;

    let bytes = rgb
        .data_bytes()
        .map_err(|e| MoodError::CameraError(format!("Frame not continuous: {}", e)))?;

    Ok(Some(VideoFrame::new(
        rgb.cols() as u32,
        rgb.rows() as u32,
        bytes.to_vec(),
    )))
}
