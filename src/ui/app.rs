//! Main application struct and eframe integration
//!
//! `MoodyApp` owns the detector and the camera feed, drains detector events
//! and renders the single-page view.

use crate::camera::{FrameFeed, FrameSource};
#[cfg(feature = "webcam")]
use crate::camera::WebcamCapture;
use crate::processor::MoodDetector;
use crate::songs;
use crate::state::{DetectorEvent, DetectorState};
use crate::ui::components::camera_view::preview_caption;
use crate::ui::components::{CameraView, MoodCard, PreviewTexture, SongList, StatusBadge};
use crate::ui::theme::Theme;
use egui::{CentralPanel, RichText, ScrollArea, TopBottomPanel};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Preview refresh while the camera is live
const PREVIEW_REPAINT: Duration = Duration::from_millis(50);

/// Main Moody Player application
pub struct MoodyApp {
    /// Whether the app has been initialized
    initialized: bool,
    detector: MoodDetector,
    frames: FrameFeed,
    #[cfg(feature = "webcam")]
    capture: Option<WebcamCapture>,
    theme: Theme,
    preview: PreviewTexture,
    /// Whether the detector has been told the camera is live
    camera_announced: bool,
    /// Last user-facing error from the detector
    notice: Option<String>,
}

impl MoodyApp {
    pub fn new(detector: MoodDetector, frames: FrameFeed) -> Self {
        Self {
            initialized: false,
            detector,
            frames,
            #[cfg(feature = "webcam")]
            capture: None,
            theme: Theme::dark(),
            preview: PreviewTexture::new(),
            camera_announced: false,
            notice: None,
        }
    }

    /// Keep a running webcam capture alive for the app's lifetime
    #[cfg(feature = "webcam")]
    pub fn with_capture(mut self, capture: WebcamCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn detector(&self) -> &MoodDetector {
        &self.detector
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Initialize the application (called on first frame)
    fn initialize(&mut self, ctx: &egui::Context) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.theme.apply(ctx);
        info!("Moody Player UI initialized");
    }

    /// Drain detector events; returns whether anything arrived
    fn process_events(&mut self) -> bool {
        let mut changed = false;
        while let Some(event) = self.detector.try_recv_event() {
            changed = true;
            match event {
                DetectorEvent::StateChanged => {}
                DetectorEvent::Error(message) => {
                    warn!("Detector error: {}", message);
                    self.notice = Some(message);
                }
                DetectorEvent::Stopped => debug!("Detector stopped"),
            }
        }
        changed
    }

    /// Upload the latest frame and tell the detector once frames flow
    fn process_camera(&mut self, ctx: &egui::Context) {
        let Some(frame) = self.frames.current_frame() else {
            return;
        };
        self.preview.update(ctx, &frame);

        if !self.camera_announced {
            self.camera_announced = true;
            info!("Camera live ({}x{})", frame.width, frame.height);
            self.detector.camera_ready();
        }
    }

    /// Render one frame of the view
    pub fn show(&mut self, ctx: &egui::Context) {
        self.initialize(ctx);

        if self.process_events() {
            ctx.request_repaint();
        }
        self.process_camera(ctx);

        let snapshot = self.detector.state().snapshot();

        self.show_header(ctx, &snapshot);
        self.show_footer(ctx, &snapshot);
        self.show_content(ctx, &snapshot);

        if self.frames.is_live() {
            ctx.request_repaint_after(PREVIEW_REPAINT);
        }
    }

    fn show_header(&self, ctx: &egui::Context, snapshot: &DetectorState) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("🎧 Moody Player")
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        StatusBadge::new(snapshot.status, &self.theme).show(ui);
                    });
                });
            });
    }

    fn show_footer(&self, ctx: &egui::Context, snapshot: &DetectorState) {
        TopBottomPanel::bottom("footer")
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(8.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Music engine pending integration")
                            .size(11.0)
                            .color(self.theme.text_muted),
                    );
                    if let Some(at) = snapshot.last_detection_at {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(
                                RichText::new(format!("Last detection {}", at.format("%H:%M:%S")))
                                    .size(11.0)
                                    .color(self.theme.text_muted),
                            );
                        });
                    }
                });
            });
    }

    fn show_content(&self, ctx: &egui::Context, snapshot: &DetectorState) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                    self.theme.card_frame().show(ui, |ui| {
                        CameraView::new(self.preview.texture(), &self.theme).show(ui);
                        ui.vertical_centered(|ui| {
                            ui.label(preview_caption(&self.theme, self.frames.is_live()));
                        });
                        ui.add_space(self.theme.spacing);
                        MoodCard::new(&snapshot.reading, &self.theme).show(ui);

                        if let Some(notice) = &self.notice {
                            ui.add_space(self.theme.spacing_sm);
                            ui.label(RichText::new(notice).size(12.0).color(self.theme.error));
                        }
                    });

                    ui.add_space(self.theme.spacing);

                    self.theme.card_frame().show(ui, |ui| {
                        ui.label(
                            RichText::new("Live Mood Detection")
                                .size(16.0)
                                .strong()
                                .color(self.theme.text_primary),
                        );
                        ui.label(
                            RichText::new(
                                "Your mood is analyzed in real time using facial expressions.",
                            )
                            .size(13.0)
                            .color(self.theme.text_secondary),
                        );
                    });

                    ui.add_space(self.theme.spacing);

                    self.theme.card_frame().show(ui, |ui| {
                        if let Some(song) = SongList::new(songs::recommended(), &self.theme).show(ui)
                        {
                            info!("Opening {}", song.track_url);
                        }
                    });
                });
            });
    }

    /// Tear down detection and capture
    pub fn shutdown(&mut self) {
        self.detector.shutdown();
        #[cfg(feature = "webcam")]
        {
            if let Some(mut capture) = self.capture.take() {
                capture.stop();
            }
        }
        self.frames.clear();
    }
}

impl eframe::App for MoodyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Moody Player shutting down");
        self.shutdown();
    }
}
