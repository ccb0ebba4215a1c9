//! Detection status badge shown in the header

use crate::state::DetectionStatus;
use crate::ui::theme::Theme;
use egui::{RichText, Stroke};

pub struct StatusBadge<'a> {
    status: DetectionStatus,
    theme: &'a Theme,
}

impl<'a> StatusBadge<'a> {
    pub fn new(status: DetectionStatus, theme: &'a Theme) -> Self {
        Self { status, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let color = match self.status {
            DetectionStatus::Error => self.theme.error,
            DetectionStatus::Scanning => {
                // Pulse between 40% and 100%
                let t = ui.ctx().input(|i| i.time);
                let pulse = ((t * 2.5).sin() * 0.3 + 0.7) as f32;
                ui.ctx().request_repaint();
                self.theme.scanning.gamma_multiply(pulse)
            }
            _ => self.theme.text_muted,
        };

        let frame = egui::Frame::none()
            .stroke(Stroke::new(1.0, color))
            .rounding(self.theme.button_rounding)
            .inner_margin(egui::Margin::symmetric(10.0, 4.0));

        let response = frame
            .show(ui, |ui| {
                ui.label(
                    RichText::new(self.status.label())
                        .size(11.0)
                        .strong()
                        .color(color),
                )
            })
            .inner;

        let status = self.status;
        response.widget_info(|| {
            egui::WidgetInfo::labeled(
                egui::WidgetType::Label,
                true,
                format!("Status: {}", status),
            )
        });
        response
    }
}
