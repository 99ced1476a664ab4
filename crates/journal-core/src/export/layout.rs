//! Backend-agnostic page layout.
//!
//! Produces a [`LaidOutDocument`]: pages of positioned draw operations.
//! Coordinates are millimetres from the top-left corner of the page; text
//! `y` is the baseline. Backends only translate the operations.

use journal_types::config::ExportConfig;
use crate::markup::{self, Block, Emphasis, ListKind};
use super::metrics::{TextMeasure, PT_TO_MM};

const TITLE_GAP_MM: f32 = 10.0;
const FOOTER_SIZE_PT: f32 = 9.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x_mm: f32,
        y_mm: f32,
        text: String,
        style: FontStyle,
        size_pt: f32,
        align: Align,
    },
    /// Box the watermark image (or label) is fitted into; `y_mm` is its top edge
    Watermark {
        x_mm: f32,
        y_mm: f32,
        width_mm: f32,
        height_mm: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page number
    pub number: usize,
    /// Index of the response that produced this page
    pub group: usize,
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn has_watermark(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DrawOp::Watermark { .. }))
    }

    /// Text of every text operation on the page, in drawing order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Watermark { .. } => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub title: String,
    pub width_mm: f32,
    pub height_mm: f32,
    pub pages: Vec<Page>,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of distinct responses laid out
    pub fn group_count(&self) -> usize {
        let mut groups: Vec<usize> = self.pages.iter().map(|p| p.group).collect();
        groups.dedup();
        groups.len()
    }

    pub fn first_page_of_group(&self, group: usize) -> Option<&Page> {
        self.pages.iter().find(|p| p.group == group)
    }
}

pub struct LayoutEngine {
    config: ExportConfig,
    measure: Box<dyn TextMeasure>,
}

impl LayoutEngine {
    pub fn new(config: ExportConfig, measure: Box<dyn TextMeasure>) -> Self {
        Self { config, measure }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn line_height_mm(&self) -> f32 {
        self.config.text_size_pt * PT_TO_MM * self.config.line_spacing
    }

    pub fn content_width_mm(&self) -> f32 {
        self.config.page_width_mm - 2.0 * self.config.margin_mm
    }

    /// Vertical space available for body text on a continuation page
    pub fn content_height_mm(&self) -> f32 {
        self.config.page_height_mm - 2.0 * self.config.margin_mm
    }

    /// Lay out `responses` (markup fragments) under `title`. Each response
    /// after the first starts on a fresh page.
    pub fn layout(&self, title: &str, responses: &[&str]) -> LaidOutDocument {
        let mut cursor = Cursor {
            engine: self,
            doc: LaidOutDocument {
                title: title.to_string(),
                width_mm: self.config.page_width_mm,
                height_mm: self.config.page_height_mm,
                pages: Vec::new(),
            },
            y: 0.0,
            group: 0,
        };

        cursor.open_page();
        cursor.push_text(
            self.config.page_width_mm / 2.0,
            title,
            FontStyle::Bold,
            self.config.title_size_pt,
            Align::Center,
        );
        cursor.y = self.config.margin_mm + self.config.title_size_pt * PT_TO_MM + TITLE_GAP_MM;

        for (index, response) in responses.iter().enumerate() {
            if index > 0 {
                cursor.group = index;
                cursor.open_page();
            }
            cursor.render_blocks(&markup::parse(response));
        }

        let mut doc = cursor.doc;
        if self.config.page_numbers {
            self.stamp_page_numbers(&mut doc);
        }
        doc
    }

    /// Greedy word wrap to `max_width_mm`. Explicit `\n` always breaks;
    /// words wider than a line are split between characters.
    pub fn wrap(&self, text: &str, style: FontStyle, size_pt: f32, max_width_mm: f32) -> Vec<String> {
        let fits = |candidate: &str| self.measure.width_mm(candidate, style, size_pt) <= max_width_mm;
        let mut lines = Vec::new();

        for segment in text.split('\n') {
            let mut current = String::new();
            for word in segment.split_whitespace() {
                let candidate = if current.is_empty() {
                    word.to_string()
                } else {
                    format!("{current} {word}")
                };
                if fits(&candidate) {
                    current = candidate;
                    continue;
                }
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                if fits(word) {
                    current = word.to_string();
                    continue;
                }
                for ch in word.chars() {
                    current.push(ch);
                    if !fits(&current) && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(ch);
                    }
                }
            }
            if !current.is_empty() || segment.trim().is_empty() {
                lines.push(current);
            }
        }
        lines
    }

    fn stamp_page_numbers(&self, doc: &mut LaidOutDocument) {
        let total = doc.pages.len();
        let x = self.config.page_width_mm / 2.0;
        let y = self.config.page_height_mm - self.config.margin_mm / 2.0;
        for page in &mut doc.pages {
            page.ops.push(DrawOp::Text {
                x_mm: x,
                y_mm: y,
                text: format!("{} / {}", page.number, total),
                style: FontStyle::Normal,
                size_pt: FOOTER_SIZE_PT,
                align: Align::Center,
            });
        }
    }
}

/// Write position while laying out
struct Cursor<'a> {
    engine: &'a LayoutEngine,
    doc: LaidOutDocument,
    y: f32,
    group: usize,
}

impl Cursor<'_> {
    fn config(&self) -> &ExportConfig {
        &self.engine.config
    }

    fn open_page(&mut self) {
        let cfg = &self.engine.config;
        let watermark = DrawOp::Watermark {
            x_mm: cfg.page_width_mm - cfg.watermark.right_offset_mm - cfg.watermark.width_mm,
            y_mm: cfg.page_height_mm - cfg.watermark.bottom_offset_mm - cfg.watermark.height_mm,
            width_mm: cfg.watermark.width_mm,
            height_mm: cfg.watermark.height_mm,
        };
        let number = self.doc.pages.len() + 1;
        self.doc.pages.push(Page {
            number,
            group: self.group,
            ops: vec![watermark],
        });
        self.y = cfg.margin_mm;
    }

    fn push_text(&mut self, x_mm: f32, text: &str, style: FontStyle, size_pt: f32, align: Align) {
        if let Some(page) = self.doc.pages.last_mut() {
            page.ops.push(DrawOp::Text {
                x_mm,
                y_mm: self.y,
                text: text.to_string(),
                style,
                size_pt,
                align,
            });
        }
    }

    /// Emit one line at the left margin plus `indent_mm`, breaking the page
    /// first when the line would run into the bottom margin.
    fn line(&mut self, text: &str, indent_mm: f32, style: FontStyle) {
        let line_height = self.engine.line_height_mm();
        let limit = self.config().page_height_mm - self.config().margin_mm;
        if self.y + line_height > limit {
            self.open_page();
        }
        let x = self.config().margin_mm + indent_mm;
        let size = self.config().text_size_pt;
        self.push_text(x, text, style, size, Align::Left);
        self.y += line_height;
    }

    fn wrapped(&mut self, text: &str, style: FontStyle) {
        let width = self.engine.content_width_mm();
        let size = self.config().text_size_pt;
        for line in self.engine.wrap(text, style, size, width) {
            self.line(&line, 0.0, style);
        }
    }

    fn gap(&mut self) {
        self.y += self.engine.line_height_mm() / 2.0;
    }

    fn render_blocks(&mut self, blocks: &[Block]) {
        let mut previous_break = false;
        for block in blocks {
            match block {
                Block::Paragraph(text) => {
                    self.wrapped(text, FontStyle::Normal);
                    self.gap();
                }
                Block::Heading { text, .. } => self.wrapped(text, FontStyle::Bold),
                Block::Emphasis { style, text } => {
                    let style = match style {
                        Emphasis::Bold => FontStyle::Bold,
                        Emphasis::Italic => FontStyle::Italic,
                    };
                    self.wrapped(text, style);
                }
                Block::List { kind, items } => {
                    self.list(*kind, items);
                    self.gap();
                }
                Block::Text(text) => self.wrapped(text, FontStyle::Normal),
                // Lines already end at block boundaries; only a repeated
                // break leaves a blank line.
                Block::Break => {
                    if previous_break {
                        self.y += self.engine.line_height_mm();
                    }
                }
            }
            previous_break = matches!(block, Block::Break);
        }
    }

    fn list(&mut self, kind: ListKind, items: &[String]) {
        let size = self.config().text_size_pt;
        let available = self.engine.content_width_mm() - self.config().list_indent_mm;
        for (index, item) in items.iter().enumerate() {
            let marker = match kind {
                ListKind::Unordered => "• ".to_string(),
                ListKind::Ordered => format!("{}. ", index + 1),
            };
            let hang = self.engine.measure.width_mm(&marker, FontStyle::Normal, size);
            let lines = self.engine.wrap(item, FontStyle::Normal, size, available - hang);
            for (line_index, line) in lines.iter().enumerate() {
                if line_index == 0 {
                    self.line(&format!("{marker}{line}"), 0.0, FontStyle::Normal);
                } else {
                    self.line(line, hang, FontStyle::Normal);
                }
            }
        }
    }
}
