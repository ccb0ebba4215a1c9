//! Mood card: icon, label and confidence for the current reading

use crate::mood::MoodReading;
use crate::ui::mood_style::MoodStyle;
use crate::ui::theme::Theme;
use egui::{Rect, RichText, Sense, Vec2};

pub struct MoodCard<'a> {
    reading: &'a MoodReading,
    theme: &'a Theme,
}

impl<'a> MoodCard<'a> {
    pub fn new(reading: &'a MoodReading, theme: &'a Theme) -> Self {
        Self { reading, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let style = MoodStyle::for_mood(&self.reading.mood);
        let label = self.reading.mood.label();

        ui.vertical_centered(|ui| {
            ui.label(RichText::new(style.icon).size(56.0));

            let response = ui.label(
                RichText::new(label)
                    .size(28.0)
                    .strong()
                    .color(style.color),
            );
            response.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::Label, true, format!("Mood: {}", label))
            });

            ui.label(
                RichText::new("Facial expression detected")
                    .size(12.0)
                    .color(self.theme.text_muted),
            );
        });

        ui.add_space(self.theme.spacing);
        self.show_confidence(ui);
    }

    fn show_confidence(&self, ui: &mut egui::Ui) {
        let confidence = self.reading.confidence.min(100);

        ui.horizontal(|ui| {
            ui.label(
                RichText::new("Confidence")
                    .size(12.0)
                    .color(self.theme.text_secondary),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let response = ui.label(
                    RichText::new(format!("{}%", confidence))
                        .size(12.0)
                        .strong()
                        .color(self.theme.text_primary),
                );
                response.widget_info(|| {
                    egui::WidgetInfo::labeled(
                        egui::WidgetType::Label,
                        true,
                        format!("Confidence: {}%", confidence),
                    )
                });
            });
        });

        let size = Vec2::new(ui.available_width(), 8.0);
        let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            painter.rect_filled(rect, 4.0, self.theme.bar_track);

            let fill_width = rect.width() * f32::from(confidence) / 100.0;
            if fill_width > 0.0 {
                let fill = Rect::from_min_size(rect.min, Vec2::new(fill_width, rect.height()));
                painter.rect_filled(fill, 4.0, self.theme.bar_fill);
            }
        }
    }
}
