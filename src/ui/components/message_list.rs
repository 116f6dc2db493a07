//! Message list component
//!
//! Displays the transcript in bubbles. Bot bubbles carry a play/pause button,
//! an optional image and location cards.

use super::markdown_view::MarkdownView;
use crate::messages::{Location, Message, MessageId};
use crate::speech::PlaybackState;
use crate::ui::state::ChatSession;
use crate::ui::theme::Theme;
use egui::{self, Align, RichText, Vec2};

const CARD_WIDTH: f32 = 240.0;

pub struct MessageList<'a> {
    session: &'a mut ChatSession,
    theme: &'a Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(session: &'a mut ChatSession, theme: &'a Theme) -> Self {
        Self { session, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        let playback = self.session.playback_state();
        let mut toggled = None;

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.add_space(self.theme.spacing);

                    if self.session.messages().is_empty() && !self.session.is_pending() {
                        self.show_empty_state(ui);
                    }

                    for message in self.session.messages() {
                        if let Some(id) = self.show_message(ui, message, playback) {
                            toggled = Some(id);
                        }
                        ui.add_space(self.theme.spacing_sm);
                    }

                    if self.session.is_pending() {
                        self.show_typing_indicator(ui);
                    }

                    ui.add_space(self.theme.spacing);
                });
            });

        if let Some(id) = toggled {
            self.session.toggle_speech(id);
        }
    }

    fn show_empty_state(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.label(
                RichText::new("Ask me anything")
                    .size(20.0)
                    .color(self.theme.text_primary),
            );
            ui.label(
                RichText::new("Type a question below or use the microphone.")
                    .color(self.theme.text_muted),
            );
        });
    }

    /// Returns the message id when its play/pause button was clicked
    fn show_message(
        &self,
        ui: &mut egui::Ui,
        message: &Message,
        playback: PlaybackState,
    ) -> Option<MessageId> {
        let is_user = message.is_user();
        let (fill, text_color) = if is_user {
            (self.theme.user_bubble, self.theme.user_text)
        } else {
            (self.theme.bot_bubble, self.theme.bot_text)
        };
        let align = if is_user { Align::RIGHT } else { Align::LEFT };
        let mut clicked = None;

        ui.with_layout(egui::Layout::top_down(align), |ui| {
            let max_width = ui.available_width() * 0.75;

            egui::Frame::none()
                .fill(fill)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);

                    if is_user {
                        let response = ui.label(RichText::new(message.text()).color(text_color));
                        let label = format!("User message: {}", message.text());
                        response.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &label)
                        });
                        return;
                    }

                    ui.horizontal_top(|ui| {
                        if self.show_speech_button(ui, message.id(), playback) {
                            clicked = Some(message.id());
                        }

                        ui.vertical(|ui| {
                            MarkdownView::new(message.text(), self.theme)
                                .text_color(text_color)
                                .id_salt(message.id())
                                .show(ui);

                            if let Some(url) = message.image_url() {
                                ui.add_space(self.theme.spacing_sm);
                                ui.add(
                                    egui::Image::from_uri(url)
                                        .max_width(max_width.min(400.0))
                                        .rounding(self.theme.card_rounding),
                                );
                            }
                        });
                    });

                    if !message.locations().is_empty() {
                        ui.add_space(self.theme.spacing_sm);
                        self.show_locations(ui, message.id(), message.locations());
                    }
                });

            ui.label(
                RichText::new(message.timestamp().format("%H:%M").to_string())
                    .size(10.0)
                    .color(self.theme.text_muted),
            );
        });

        clicked
    }

    /// Pause glyph only while this message is actively speaking
    fn show_speech_button(&self, ui: &mut egui::Ui, id: MessageId, playback: PlaybackState) -> bool {
        let speaking = playback == PlaybackState::Speaking(id);
        let (icon, label) = if speaking {
            ("⏸", format!("Pause message {}", id))
        } else {
            ("▶", format!("Play message {}", id))
        };

        let response = ui.add(
            egui::Button::new(RichText::new(icon).size(14.0))
                .min_size(Vec2::splat(28.0))
                .rounding(self.theme.button_rounding),
        );
        response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Button, true, &label));

        response.clicked()
    }

    fn show_locations(&self, ui: &mut egui::Ui, message: MessageId, locations: &[Location]) {
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = Vec2::splat(self.theme.spacing_sm);
            for (index, location) in locations.iter().enumerate() {
                self.show_location_card(ui, (message, index), location);
            }
        });
    }

    fn show_location_card(&self, ui: &mut egui::Ui, salt: (MessageId, usize), location: &Location) {
        egui::Frame::none()
            .fill(self.theme.card_bg)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.set_width(CARD_WIDTH);
                ui.vertical(|ui| {
                    if let Some(url) = &location.image_url {
                        ui.add(
                            egui::Image::from_uri(url)
                                .max_width(CARD_WIDTH)
                                .max_height(160.0)
                                .rounding(self.theme.card_rounding),
                        );
                    }

                    MarkdownView::new(&location.name, self.theme)
                        .text_color(self.theme.text_primary)
                        .id_salt(salt)
                        .show(ui);

                    ui.hyperlink_to("View on Google Maps", &location.map_link);
                });
            });
    }

    fn show_typing_indicator(&self, ui: &mut egui::Ui) {
        ui.with_layout(egui::Layout::top_down(Align::LEFT), |ui| {
            egui::Frame::none()
                .fill(self.theme.bot_bubble)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    let t = ui.ctx().input(|i| i.time);
                    let alpha = ((t * 3.0).sin() * 0.25 + 0.75) as f32;
                    ui.label(
                        RichText::new("Bot is typing...")
                            .italics()
                            .color(self.theme.text_muted.gamma_multiply(alpha)),
                    );
                });
        });
    }
}
