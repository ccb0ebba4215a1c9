//! Theme and styling for the Moody Player UI
//!
//! Colors, spacing and text styles. The mood palette lives in
//! [`crate::ui::mood_style`].

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Vec2, Visuals};

/// Application theme configuration
#[derive(Clone, Debug)]
pub struct Theme {
    /// Primary accent color
    pub primary: Color32,
    /// Scanning indicator color
    pub scanning: Color32,
    /// Error color (red)
    pub error: Color32,

    /// Background colors
    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub bg_tertiary: Color32,

    /// Text colors
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    /// Confidence bar fill
    pub bar_fill: Color32,
    /// Confidence bar track
    pub bar_track: Color32,

    /// Border radius for buttons and badges
    pub button_rounding: Rounding,
    /// Border radius for cards/panels
    pub card_rounding: Rounding,

    /// Standard spacing
    pub spacing: f32,
    /// Small spacing
    pub spacing_sm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Create a dark theme
    pub fn dark() -> Self {
        Self {
            primary: Color32::from_rgb(168, 85, 247),  // Purple
            scanning: Color32::from_rgb(192, 132, 252), // Light purple
            error: Color32::from_rgb(248, 113, 113),   // Red

            bg_primary: Color32::from_rgb(15, 23, 42),   // Slate 900
            bg_secondary: Color32::from_rgb(30, 41, 59), // Slate 800
            bg_tertiary: Color32::from_rgb(51, 65, 85),  // Slate 700

            text_primary: Color32::from_rgb(248, 250, 252),
            text_secondary: Color32::from_rgb(203, 213, 225),
            text_muted: Color32::from_rgb(148, 163, 184),

            bar_fill: Color32::from_rgb(168, 85, 247),
            bar_track: Color32::from_rgb(51, 65, 85),

            button_rounding: Rounding::same(8.0),
            card_rounding: Rounding::same(16.0),

            spacing: 16.0,
            spacing_sm: 8.0,
        }
    }

    /// Apply this theme to egui
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = Visuals::dark();

        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_secondary;
        visuals.extreme_bg_color = self.bg_tertiary;

        visuals.widgets.noninteractive.bg_fill = self.bg_secondary;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_muted);

        visuals.widgets.inactive.bg_fill = self.bg_tertiary;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_secondary);

        visuals.widgets.hovered.bg_fill = self.primary.gamma_multiply(0.8);
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.text_primary);

        visuals.widgets.active.bg_fill = self.primary;
        visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.text_primary);

        visuals.selection.bg_fill = self.primary.gamma_multiply(0.3);
        visuals.selection.stroke = Stroke::new(1.0, self.primary);
        visuals.hyperlink_color = self.primary;

        visuals.window_rounding = self.card_rounding;
        visuals.window_stroke = Stroke::new(1.0, self.bg_tertiary);

        ctx.set_visuals(visuals);

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = Vec2::splat(self.spacing_sm);
        style.spacing.window_margin = egui::Margin::same(self.spacing);
        style.spacing.button_padding = Vec2::new(self.spacing_sm, self.spacing_sm / 2.0);

        style.text_styles.insert(
            egui::TextStyle::Heading,
            FontId::new(22.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Body,
            FontId::new(14.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            FontId::new(14.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Small,
            FontId::new(12.0, FontFamily::Proportional),
        );

        ctx.set_style(style);
    }

    /// Card frame used for the main panels
    pub fn card_frame(&self) -> egui::Frame {
        egui::Frame::none()
            .fill(self.bg_secondary)
            .rounding(self.card_rounding)
            .stroke(Stroke::new(1.0, self.bg_tertiary))
            .inner_margin(self.spacing)
    }
}
