//! "Recommended Songs" list

use crate::songs::Song;
use crate::ui::theme::Theme;
use egui::{RichText, Sense, Vec2};

pub struct SongList<'a> {
    songs: &'a [Song],
    theme: &'a Theme,
}

impl<'a> SongList<'a> {
    pub fn new(songs: &'a [Song], theme: &'a Theme) -> Self {
        Self { songs, theme }
    }

    /// Show the list; returns the song whose play button was clicked
    pub fn show(self, ui: &mut egui::Ui) -> Option<&'a Song> {
        ui.label(
            RichText::new("Recommended Songs")
                .size(16.0)
                .strong()
                .color(self.theme.text_primary),
        );
        ui.add_space(self.theme.spacing_sm);

        let mut played = None;
        for (index, song) in self.songs.iter().enumerate() {
            ui.push_id(index, |ui| {
                if self.show_row(ui, index + 1, song) {
                    played = Some(song);
                }
            });
        }

        if let Some(song) = played {
            ui.ctx().open_url(egui::OpenUrl::new_tab(song.track_url));
        }
        played
    }

    fn show_row(&self, ui: &mut egui::Ui, position: usize, song: &Song) -> bool {
        let mut clicked = false;

        egui::Frame::none()
            .fill(self.theme.bg_tertiary.gamma_multiply(0.5))
            .rounding(self.theme.button_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    self.show_cover(ui);

                    let details = ui.vertical(|ui| {
                        ui.label(
                            RichText::new(song.title)
                                .size(14.0)
                                .strong()
                                .color(self.theme.text_primary),
                        );
                        ui.label(
                            RichText::new(song.artist)
                                .size(12.0)
                                .color(self.theme.text_muted),
                        );
                    });
                    let description = format!("Song {}: {}", position, song.describe());
                    details.response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &description)
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let button = ui
                            .add(egui::Button::new(RichText::new("▶").size(14.0)))
                            .on_hover_text(song.track_url);
                        button.widget_info(|| {
                            egui::WidgetInfo::labeled(
                                egui::WidgetType::Button,
                                true,
                                format!("Play song {}: {}", position, song.describe()),
                            )
                        });
                        clicked = button.clicked();
                    });
                });
            });

        clicked
    }

    /// Cover art stand-in
    fn show_cover(&self, ui: &mut egui::Ui) {
        let (rect, _) = ui.allocate_exact_size(Vec2::splat(40.0), Sense::hover());
        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            painter.rect_filled(rect, self.theme.button_rounding, self.theme.primary.gamma_multiply(0.6));
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "♪",
                egui::FontId::proportional(18.0),
                self.theme.text_primary,
            );
        }
    }
}
