//! Colors and spacing for the chat widget

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Vec2, Visuals};

#[derive(Clone, Debug)]
pub struct Theme {
    /// Accent for buttons and links
    pub primary: Color32,

    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub bg_tertiary: Color32,

    pub text_primary: Color32,
    pub text_muted: Color32,

    /// Bubble fills and their text colors
    pub user_bubble: Color32,
    pub user_text: Color32,
    pub bot_bubble: Color32,
    pub bot_text: Color32,

    pub code_bg: Color32,
    pub card_bg: Color32,

    pub listening: Color32,

    pub button_rounding: Rounding,
    pub bubble_rounding: Rounding,
    pub card_rounding: Rounding,

    pub spacing: f32,
    pub spacing_sm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    pub fn light() -> Self {
        Self {
            primary: Color32::from_rgb(17, 24, 39),

            bg_primary: Color32::from_rgb(255, 255, 255),
            bg_secondary: Color32::from_rgb(243, 244, 246),
            bg_tertiary: Color32::from_rgb(229, 231, 235),

            text_primary: Color32::from_rgb(17, 24, 39),
            text_muted: Color32::from_rgb(107, 114, 128),

            user_bubble: Color32::from_rgb(17, 24, 39),
            user_text: Color32::WHITE,
            bot_bubble: Color32::from_rgb(229, 231, 235),
            bot_text: Color32::BLACK,

            code_bg: Color32::from_rgb(209, 213, 219),
            card_bg: Color32::WHITE,

            listening: Color32::from_rgb(220, 38, 38),

            button_rounding: Rounding::same(8.0),
            bubble_rounding: Rounding::same(12.0),
            card_rounding: Rounding::same(8.0),

            spacing: 16.0,
            spacing_sm: 8.0,
        }
    }

    /// Apply this theme to egui
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = Visuals::light();

        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_secondary;
        visuals.extreme_bg_color = self.bg_secondary;

        visuals.widgets.inactive.bg_fill = self.bg_tertiary;
        visuals.widgets.hovered.bg_fill = self.primary.gamma_multiply(0.8);
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.bg_primary);
        visuals.widgets.active.bg_fill = self.primary;

        visuals.selection.bg_fill = self.primary.gamma_multiply(0.3);
        visuals.selection.stroke = Stroke::new(1.0, self.primary);

        visuals.hyperlink_color = Color32::from_rgb(37, 99, 235);
        visuals.window_rounding = self.card_rounding;

        ctx.set_visuals(visuals);

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = Vec2::splat(self.spacing_sm);
        style.spacing.button_padding = Vec2::new(self.spacing_sm * 1.5, self.spacing_sm);

        style.text_styles.insert(
            egui::TextStyle::Heading,
            FontId::new(20.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Body,
            FontId::new(14.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Monospace,
            FontId::new(13.0, FontFamily::Monospace),
        );
        style.text_styles.insert(
            egui::TextStyle::Small,
            FontId::new(11.0, FontFamily::Proportional),
        );

        ctx.set_style(style);
    }
}
