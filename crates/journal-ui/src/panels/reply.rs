//! Renders an assistant reply fragment with egui widgets.

use egui::{RichText, Ui};
use journal_core::markup::{self, Block, Emphasis, ListKind};
use crate::theme::*;

const BODY_SIZE: f32 = 14.0;

pub fn render_reply(ui: &mut Ui, fragment: &str) {
    let mut previous_break = false;
    for block in markup::parse(fragment) {
        let is_break = block == Block::Break;
        match block {
            Block::Heading { level, text } => {
                let size = if level <= 3 { 18.0 } else { 16.0 };
                ui.label(RichText::new(text).size(size).strong().color(BRAND));
            }
            Block::Paragraph(text) | Block::Text(text) => {
                ui.label(RichText::new(text).size(BODY_SIZE).color(TEXT_PRIMARY));
            }
            Block::Emphasis { style, text } => {
                let rich = RichText::new(text).size(BODY_SIZE).color(TEXT_PRIMARY);
                ui.label(match style {
                    Emphasis::Bold => rich.strong(),
                    Emphasis::Italic => rich.italics(),
                });
            }
            Block::List { kind, items } => {
                for (index, item) in items.iter().enumerate() {
                    let marker = match kind {
                        ListKind::Unordered => "•".to_string(),
                        ListKind::Ordered => format!("{}.", index + 1),
                    };
                    ui.horizontal_wrapped(|ui| {
                        ui.add_space(8.0);
                        ui.label(RichText::new(marker).size(BODY_SIZE).color(BRAND));
                        ui.label(RichText::new(item).size(BODY_SIZE).color(TEXT_PRIMARY));
                    });
                }
            }
            Block::Break => {
                if previous_break {
                    ui.add_space(BODY_SIZE * 0.75);
                }
            }
        }
        previous_break = is_break;
    }
}
