//! Paints [`Block`]s produced by the markdown module

use crate::markdown::{self, Block, Span};
use crate::ui::theme::Theme;
use egui::{self, Color32, RichText};

pub struct MarkdownView<'a> {
    source: &'a str,
    theme: &'a Theme,
    text_color: Color32,
    id_salt: egui::Id,
}

impl<'a> MarkdownView<'a> {
    pub fn new(source: &'a str, theme: &'a Theme) -> Self {
        Self {
            source,
            theme,
            text_color: theme.text_primary,
            id_salt: egui::Id::new(source),
        }
    }

    pub fn text_color(mut self, color: Color32) -> Self {
        self.text_color = color;
        self
    }

    /// Distinguishes tables when the same markdown appears twice
    pub fn id_salt(mut self, salt: impl std::hash::Hash) -> Self {
        self.id_salt = egui::Id::new(salt);
        self
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let blocks = markdown::parse(self.source);

        ui.vertical(|ui| {
            ui.spacing_mut().item_spacing.y = 4.0;
            for (index, block) in blocks.iter().enumerate() {
                self.show_block(ui, index, block);
            }
        });
    }

    fn show_block(&self, ui: &mut egui::Ui, index: usize, block: &Block) {
        match block {
            Block::Paragraph(spans) => self.show_spans(ui, spans, None),
            Block::Heading { level, spans } => {
                let size = match level {
                    1 => 22.0,
                    2 => 19.0,
                    3 => 17.0,
                    _ => 15.0,
                };
                self.show_spans(ui, spans, Some(size));
            }
            Block::ListItem {
                depth,
                marker,
                spans,
            } => {
                ui.horizontal_wrapped(|ui| {
                    ui.add_space(*depth as f32 * 16.0);
                    ui.label(RichText::new(marker).color(self.text_color));
                    self.inline(ui, spans, None, false);
                });
            }
            Block::CodeBlock { code, .. } => {
                egui::Frame::none()
                    .fill(self.theme.code_bg)
                    .rounding(4.0)
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ui.label(RichText::new(code.trim_end()).monospace().color(self.text_color));
                    });
            }
            Block::Table { header, rows } => {
                egui::Grid::new(self.id_salt.with(("table", index)))
                    .striped(true)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        for cell in header {
                            ui.horizontal_wrapped(|ui| self.inline(ui, cell, None, true));
                        }
                        ui.end_row();

                        for row in rows {
                            for cell in row {
                                ui.horizontal_wrapped(|ui| self.inline(ui, cell, None, false));
                            }
                            ui.end_row();
                        }
                    });
            }
            Block::Html(html) => {
                ui.label(
                    RichText::new(html.trim_end())
                        .monospace()
                        .color(self.theme.text_muted),
                );
            }
            Block::Rule => {
                ui.separator();
            }
        }
    }

    fn show_spans(&self, ui: &mut egui::Ui, spans: &[Span], size: Option<f32>) {
        ui.horizontal_wrapped(|ui| {
            self.inline(ui, spans, size, size.is_some());
        });
    }

    fn inline(&self, ui: &mut egui::Ui, spans: &[Span], size: Option<f32>, strong: bool) {
        ui.spacing_mut().item_spacing.x = 0.0;

        for span in spans {
            let mut text = RichText::new(&span.text);
            if let Some(size) = size {
                text = text.size(size);
            }
            if strong || span.style.strong {
                text = text.strong();
            }
            if span.style.emphasis {
                text = text.italics();
            }
            if span.style.strikethrough {
                text = text.strikethrough();
            }
            if span.style.code {
                text = text.code();
            } else if span.style.html {
                text = text.monospace().color(self.theme.text_muted);
            }

            match &span.link {
                Some(url) => {
                    ui.hyperlink_to(text, url);
                }
                None => {
                    let text = if span.style.html || span.style.strong || strong {
                        text
                    } else {
                        text.color(self.text_color)
                    };
                    ui.label(text);
                }
            }
        }
    }
}
