//! Input bar component
//!
//! Multiline question box, microphone button and send button. Enter submits,
//! Shift+Enter inserts a newline.

use crate::ui::state::ChatSession;
use crate::ui::theme::Theme;
use egui::{self, Event, InputState, Key, RichText, Vec2};

pub struct InputBar<'a> {
    session: &'a mut ChatSession,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(session: &'a mut ChatSession, theme: &'a Theme) -> Self {
        Self { session, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.bubble_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    self.show_text_input(ui);

                    ui.add_space(self.theme.spacing_sm);

                    // The microphone is only offered for an empty box; the send
                    // button stays up while a request is in flight
                    if self.session.input_text.is_empty() {
                        self.show_mic_button(ui);
                    }
                    if !self.session.input_text.is_empty() || self.session.is_pending() {
                        self.show_send_button(ui);
                    }
                });
            });
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let id = egui::Id::new("askbot_message_input");

        // Consume plain Enter before the TextEdit turns it into a newline.
        // Typed questions are accepted even while earlier ones are in flight.
        let has_focus = ui.memory(|m| m.has_focus(id));
        let submit = has_focus && ui.input_mut(consume_plain_enter);

        let available_width = ui.available_width() - 110.0;
        let response = ui.add(
            egui::TextEdit::multiline(&mut self.session.input_text)
                .id(id)
                .hint_text("Ask a question...")
                .desired_rows(1)
                .desired_width(available_width)
                .font(egui::TextStyle::Body)
                .margin(egui::Margin::symmetric(8.0, 6.0)),
        );
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "Message input")
        });

        if submit {
            self.session.submit_input();
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        let pending = self.session.is_pending();
        let enabled = !pending && !self.session.input_text.trim().is_empty();

        let text = if pending {
            RichText::new("Sending...").size(13.0)
        } else {
            RichText::new("➤").size(18.0).color(egui::Color32::WHITE)
        };

        let button = egui::Button::new(text)
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding)
            .fill(if enabled {
                self.theme.primary
            } else {
                self.theme.bg_tertiary
            });

        let response = ui.add_enabled(enabled, button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, "Send message")
        });

        if response.clicked() {
            self.session.submit_input();
        }
    }

    fn show_mic_button(&mut self, ui: &mut egui::Ui) {
        if self.session.is_listening() {
            ui.label(
                RichText::new("Listening...")
                    .italics()
                    .color(self.theme.listening),
            );
            ui.ctx().request_repaint();
            return;
        }

        let button = egui::Button::new(RichText::new("🎤").size(18.0))
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding);

        let response = ui.add(button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Start voice input")
        });

        let response = if self.session.can_listen() {
            response.on_hover_text("Ask by voice")
        } else {
            response.on_hover_text("Speech recognition is not available")
        };

        if response.clicked() {
            self.session.start_listening();
        }
    }
}

/// `consume_key` ignores Shift, so Shift+Enter is filtered out by hand and
/// left for the TextEdit
fn consume_plain_enter(input: &mut InputState) -> bool {
    let before = input.events.len();
    input.events.retain(|event| {
        !matches!(
            event,
            Event::Key {
                key: Key::Enter,
                pressed: true,
                modifiers,
                ..
            } if !modifiers.shift && !modifiers.alt && !modifiers.command
        )
    });
    input.events.len() != before
}
