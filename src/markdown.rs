//! Markdown render model
//!
//! Bot answers and location names are markdown with the table extension and
//! raw HTML allowed. This module turns them into a flat list of [`Block`]s
//! that the UI paints, and into plain text for speech synthesis.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// Inline styling for a run of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub strong: bool,
    pub emphasis: bool,
    pub strikethrough: bool,
    pub code: bool,
    /// Raw inline HTML, shown verbatim
    pub html: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
    pub link: Option<String>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: SpanStyle::default(),
            link: None,
        }
    }
}

pub type Cell = Vec<Span>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Span>),
    Heading { level: u8, spans: Vec<Span> },
    ListItem { depth: usize, marker: String, spans: Vec<Span> },
    CodeBlock { language: Option<String>, code: String },
    Table { header: Vec<Cell>, rows: Vec<Vec<Cell>> },
    /// Raw HTML block, passed through untouched
    Html(String),
    Rule,
}

#[derive(Default)]
struct TableBuilder {
    header: Vec<Cell>,
    rows: Vec<Vec<Cell>>,
    row: Vec<Cell>,
}

#[derive(Default)]
struct Builder {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    style: SpanStyle,
    strong: usize,
    emphasis: usize,
    strikethrough: usize,
    links: Vec<String>,
    /// Next ordinal for each open list, `None` for bullet lists
    lists: Vec<Option<u64>>,
    item_marker: Option<String>,
    heading: Option<u8>,
    code_block: Option<(Option<String>, String)>,
    html_block: Option<String>,
    table: Option<TableBuilder>,
}

impl Builder {
    fn refresh_style(&mut self) {
        self.style.strong = self.strong > 0;
        self.style.emphasis = self.emphasis > 0;
        self.style.strikethrough = self.strikethrough > 0;
    }

    fn push_text(&mut self, text: &str, code: bool, html: bool) {
        let style = SpanStyle {
            code,
            html,
            ..self.style
        };
        let link = self.links.last().cloned();

        // Merge with the previous run when nothing changed
        if let Some(last) = self.spans.last_mut() {
            if last.style == style && last.link == link {
                last.text.push_str(text);
                return;
            }
        }

        self.spans.push(Span {
            text: text.to_string(),
            style,
            link,
        });
    }

    fn flush_item(&mut self) {
        if let Some(marker) = self.item_marker.take() {
            let spans = std::mem::take(&mut self.spans);
            if !spans.is_empty() {
                self.blocks.push(Block::ListItem {
                    depth: self.lists.len().saturating_sub(1),
                    marker,
                    spans,
                });
            }
        }
    }

    fn flush_paragraph(&mut self) {
        let spans = std::mem::take(&mut self.spans);
        if spans.is_empty() {
            return;
        }
        match self.heading.take() {
            Some(level) => self.blocks.push(Block::Heading { level, spans }),
            None => self.blocks.push(Block::Paragraph(spans)),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_paragraph();
                self.heading = Some(level as u8);
            }
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                self.code_block = Some((language, String::new()));
            }
            Tag::HtmlBlock => {
                self.html_block = Some(String::new());
            }
            Tag::List(start) => {
                // A nested list ends the text of its parent item
                self.flush_item();
                self.lists.push(start);
            }
            Tag::Item => {
                let marker = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let marker = format!("{}.", next);
                        *next += 1;
                        marker
                    }
                    _ => "•".to_string(),
                };
                self.item_marker = Some(marker);
            }
            Tag::Table(_) => {
                self.flush_paragraph();
                self.table = Some(TableBuilder::default());
            }
            Tag::TableCell => {
                self.spans.clear();
            }
            Tag::Emphasis => {
                self.emphasis += 1;
                self.refresh_style();
            }
            Tag::Strong => {
                self.strong += 1;
                self.refresh_style();
            }
            Tag::Strikethrough => {
                self.strikethrough += 1;
                self.refresh_style();
            }
            Tag::Link { dest_url, .. } => {
                self.links.push(dest_url.to_string());
            }
            Tag::Image { dest_url, .. } => {
                self.links.push(dest_url.to_string());
                self.push_text("🖼 ", false, false);
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.item_marker.is_some() {
                    // Loose list items keep accumulating into the item
                    self.push_text(" ", false, false);
                } else {
                    self.flush_paragraph();
                }
            }
            TagEnd::Heading(_) => self.flush_paragraph(),
            TagEnd::CodeBlock => {
                if let Some((language, code)) = self.code_block.take() {
                    self.blocks.push(Block::CodeBlock { language, code });
                }
            }
            TagEnd::HtmlBlock => {
                if let Some(html) = self.html_block.take() {
                    let html = html.trim_end().to_string();
                    if !html.is_empty() {
                        self.blocks.push(Block::Html(html));
                    }
                }
            }
            TagEnd::List(_) => {
                self.flush_item();
                self.lists.pop();
            }
            TagEnd::Item => {
                if let Some(last) = self.spans.last_mut() {
                    let trimmed = last.text.trim_end().len();
                    last.text.truncate(trimmed);
                }
                self.flush_item();
            }
            TagEnd::TableCell => {
                let cell = std::mem::take(&mut self.spans);
                if let Some(table) = self.table.as_mut() {
                    table.row.push(cell);
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.header = std::mem::take(&mut table.row);
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.blocks.push(Block::Table {
                        header: table.header,
                        rows: table.rows,
                    });
                }
            }
            TagEnd::Emphasis => {
                self.emphasis = self.emphasis.saturating_sub(1);
                self.refresh_style();
            }
            TagEnd::Strong => {
                self.strong = self.strong.saturating_sub(1);
                self.refresh_style();
            }
            TagEnd::Strikethrough => {
                self.strikethrough = self.strikethrough.saturating_sub(1);
                self.refresh_style();
            }
            TagEnd::Link | TagEnd::Image => {
                self.links.pop();
            }
            _ => {}
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some((_, code)) = self.code_block.as_mut() {
                    code.push_str(&text);
                } else {
                    self.push_text(&text, false, false);
                }
            }
            Event::Code(code) => self.push_text(&code, true, false),
            Event::Html(html) => match self.html_block.as_mut() {
                Some(block) => block.push_str(&html),
                None => {
                    self.flush_paragraph();
                    self.blocks.push(Block::Html(html.trim_end().to_string()));
                }
            },
            Event::InlineHtml(html) => self.push_text(&html, false, true),
            Event::SoftBreak => self.push_text(" ", false, false),
            Event::HardBreak => self.push_text("\n", false, false),
            Event::Rule => {
                self.flush_paragraph();
                self.blocks.push(Block::Rule);
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush_item();
        self.flush_paragraph();
        self.blocks
    }
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
}

/// Parse markdown into render blocks
pub fn parse(markdown: &str) -> Vec<Block> {
    let mut builder = Builder::default();
    for event in Parser::new_ext(markdown, options()) {
        builder.event(event);
    }
    builder.finish()
}

fn spans_text(spans: &[Span]) -> String {
    spans
        .iter()
        .filter(|span| !span.style.html)
        .map(|span| span.text.as_str())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Render markdown as speakable plain text. Markup and raw HTML are dropped.
pub fn to_plain_text(markdown: &str) -> String {
    let mut lines = Vec::new();

    for block in parse(markdown) {
        match block {
            Block::Paragraph(spans) | Block::Heading { spans, .. } | Block::ListItem { spans, .. } => {
                lines.push(spans_text(&spans));
            }
            Block::CodeBlock { code, .. } => lines.push(code.trim().to_string()),
            Block::Table { header, rows } => {
                for row in std::iter::once(&header).chain(rows.iter()) {
                    let cells: Vec<String> = row.iter().map(|cell| spans_text(cell)).collect();
                    lines.push(cells.join(", "));
                }
            }
            Block::Html(_) | Block::Rule => {}
        }
    }

    lines.retain(|line| !line.is_empty());
    lines.join("\n")
}
