//! Main application struct and eframe integration

use crate::ui::components::{InputBar, MessageList};
use crate::ui::state::ChatSession;
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, RichText, TopBottomPanel};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct AskbotApp {
    session: ChatSession,
    theme: Theme,
    /// Keeps request tasks alive for the lifetime of the window
    _runtime: Option<tokio::runtime::Runtime>,
}

impl AskbotApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        mut session: ChatSession,
        runtime: Option<tokio::runtime::Runtime>,
    ) -> Self {
        let theme = Theme::light();
        theme.apply(&cc.egui_ctx);
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let ctx = cc.egui_ctx.clone();
        session.set_repaint_callback(Arc::new(move || ctx.request_repaint()));

        Self {
            session,
            theme,
            _runtime: runtime,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Render one frame into `ctx`
    pub fn ui(&mut self, ctx: &egui::Context) {
        self.session.poll_events();

        self.show_header(ctx);
        self.show_input_area(ctx);
        self.show_content(ctx);

        // Typing indicator, listening and speech completion are all polled
        if self.session.is_pending()
            || self.session.is_listening()
            || self.session.playback_state().message().is_some()
        {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn show_header(&self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Askbot")
                            .size(18.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );
                });
            });
    }

    fn show_input_area(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input_area")
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                InputBar::new(&mut self.session, &self.theme).show(ui);
            });
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                MessageList::new(&mut self.session, &self.theme).show(ui);
            });
    }
}

impl eframe::App for AskbotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Shutting down, cancelling speech");
        self.session.stop_speech();
    }
}
