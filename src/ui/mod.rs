//! Desktop chat window built on eframe

pub mod app;
pub mod components;
pub mod state;
pub mod theme;

pub use app::AskbotApp;
pub use state::{ChatSession, SessionEvent, ANSWER_ERROR_TEXT};
pub use theme::Theme;

/// Open the chat window and block until it closes
pub fn run(
    session: ChatSession,
    runtime: tokio::runtime::Runtime,
) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 760.0])
            .with_min_inner_size([420.0, 480.0])
            .with_title("Askbot"),
        ..Default::default()
    };

    eframe::run_native(
        "Askbot",
        options,
        Box::new(move |cc| Ok(Box::new(AskbotApp::new(cc, session, Some(runtime))))),
    )
}
