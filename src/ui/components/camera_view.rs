//! Live camera preview
//!
//! Frames are uploaded to a texture only when a new one arrives and drawn
//! mirrored, like a selfie camera.

use crate::camera::VideoFrame;
use crate::ui::theme::Theme;
use egui::{pos2, ColorImage, Rect, RichText, Sense, TextureHandle, TextureOptions, Vec2};

/// GPU copy of the most recent camera frame
#[derive(Default)]
pub struct PreviewTexture {
    handle: Option<TextureHandle>,
    sequence: Option<u64>,
}

impl PreviewTexture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload `frame` unless it is the one already shown
    ///
    /// Returns `true` if the texture changed.
    pub fn update(&mut self, ctx: &egui::Context, frame: &VideoFrame) -> bool {
        if self.sequence == Some(frame.sequence) || !frame.is_decodable() {
            return false;
        }

        let image = ColorImage::from_rgb(
            [frame.width as usize, frame.height as usize],
            &frame.rgb,
        );
        match self.handle.as_mut() {
            Some(handle) => handle.set(image, TextureOptions::LINEAR),
            None => {
                self.handle = Some(ctx.load_texture("camera-preview", image, TextureOptions::LINEAR))
            }
        }
        self.sequence = Some(frame.sequence);
        true
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.handle.as_ref()
    }

    /// Sequence number of the uploaded frame
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }
}

/// Preview area height
const PREVIEW_HEIGHT: f32 = 240.0;

pub struct CameraView<'a> {
    texture: Option<&'a TextureHandle>,
    theme: &'a Theme,
}

impl<'a> CameraView<'a> {
    pub fn new(texture: Option<&'a TextureHandle>, theme: &'a Theme) -> Self {
        Self { texture, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let width = ui.available_width();

        let response = match self.texture {
            Some(texture) => {
                let [w, h] = texture.size();
                let aspect = if h == 0 { 4.0 / 3.0 } else { w as f32 / h as f32 };
                let size = fit(Vec2::new(width, PREVIEW_HEIGHT), aspect);

                // Flip horizontally
                let image = egui::Image::from_texture(texture)
                    .uv(Rect::from_min_max(pos2(1.0, 0.0), pos2(0.0, 1.0)))
                    .fit_to_exact_size(size)
                    .rounding(self.theme.card_rounding);
                ui.vertical_centered(|ui| ui.add(image)).inner
            }
            None => self.show_placeholder(ui, Vec2::new(width, PREVIEW_HEIGHT)),
        };

        let live = self.texture.is_some();
        response.widget_info(|| {
            let label = if live {
                "Camera preview"
            } else {
                "Camera preview unavailable"
            };
            egui::WidgetInfo::labeled(egui::WidgetType::Other, true, label)
        });
        response
    }

    fn show_placeholder(&self, ui: &mut egui::Ui, size: Vec2) -> egui::Response {
        let (rect, response) = ui.allocate_exact_size(size, Sense::hover());
        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            painter.rect_filled(rect, self.theme.card_rounding, self.theme.bg_tertiary);
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Waiting for camera...",
                egui::FontId::proportional(14.0),
                self.theme.text_muted,
            );
        }
        response
    }
}

/// Largest size with `aspect` that fits in `bounds`
fn fit(bounds: Vec2, aspect: f32) -> Vec2 {
    let width = bounds.x.min(bounds.y * aspect);
    Vec2::new(width, width / aspect)
}

/// Caption shown under the preview
pub fn preview_caption(theme: &Theme, live: bool) -> RichText {
    if live {
        RichText::new("● Live").size(11.0).color(theme.error)
    } else {
        RichText::new("Camera off").size(11.0).color(theme.text_muted)
    }
}
