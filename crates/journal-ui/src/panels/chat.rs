//! Chat panel: message log, consent checkbox, input form and notices.
//!
//! The panel never mutates session state itself. It returns the user's
//! intents as [`ChatAction`]s for the app to forward to the controller.

use egui::{self, Align, Checkbox, Layout, RichText, ScrollArea, Vec2};
use journal_types::event::NoticeLevel;
use journal_types::locale::Locale;
use journal_types::message::{Message, MessageKind};
use crate::panels::reply::render_reply;
use crate::state::UiState;
use crate::theme::*;

/// Something the user did this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    UpdateInput(String),
    ToggleConsent,
    /// Open the native file picker
    ChooseFile,
    ClearAttachment,
    Submit,
    /// Start a new conversation
    Reset,
    SetLocale(Locale),
    DismissNotice(usize),
}

/// Render the chat panel and collect this frame's actions.
pub fn chat_panel(ui: &mut egui::Ui, state: &mut UiState, terms_url: &str) -> Vec<ChatAction> {
    let mut actions = Vec::new();

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                header(ui, state, &mut actions);
                notices(ui, state, &mut actions);
                ui.separator();

                let available_height = ui.available_height() - 170.0;
                ScrollArea::vertical()
                    .max_height(available_height.max(120.0))
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for message in &state.messages {
                            render_message(ui, state, message);
                            ui.add_space(6.0);
                        }
                        if state.is_loading {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label(RichText::new(state.t("chat.loading")).color(TEXT_SECONDARY).italics());
                            });
                        }
                    });

                ui.add_space(8.0);
                input_form(ui, state, terms_url, &mut actions);
            });
        });

    actions
}

fn header(ui: &mut egui::Ui, state: &UiState, actions: &mut Vec<ChatAction>) {
    ui.horizontal(|ui| {
        ui.heading(RichText::new(state.t("chat.bot_name")).color(BRAND).strong());
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            let mut selected = state.locale;
            egui::ComboBox::from_id_salt("journal_locale")
                .selected_text(selected.label())
                .show_ui(ui, |ui| {
                    for locale in Locale::all() {
                        ui.selectable_value(&mut selected, *locale, locale.label());
                    }
                });
            if selected != state.locale {
                actions.push(ChatAction::SetLocale(selected));
            }
        });
    });
}

fn notices(ui: &mut egui::Ui, state: &UiState, actions: &mut Vec<ChatAction>) {
    for (index, notice) in state.notices.iter().enumerate() {
        let (bg, fg) = match notice.level {
            NoticeLevel::Error => (NOTICE_ERROR_BG, ERROR),
            NoticeLevel::Info => (NOTICE_INFO_BG, TEXT_PRIMARY),
        };
        egui::Frame::default()
            .fill(bg)
            .corner_radius(PANEL_ROUNDING)
            .inner_margin(6.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&notice.text).color(fg));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.small_button("×").clicked() {
                            actions.push(ChatAction::DismissNotice(index));
                        }
                    });
                });
            });
    }
}

fn render_message(ui: &mut egui::Ui, state: &UiState, message: &Message) {
    let (layout, bg) = match message.kind {
        MessageKind::Question => (Layout::top_down(Align::Max), BG_QUESTION),
        MessageKind::Response => (Layout::top_down(Align::Min), BG_RESPONSE),
    };
    let max_width = ui.available_width() * 0.85;

    ui.with_layout(layout, |ui| {
        egui::Frame::default()
            .fill(bg)
            .corner_radius(BUBBLE_ROUNDING)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_max_width(max_width);
                match message.kind {
                    MessageKind::Question => {
                        ui.label(RichText::new(&message.text).color(TEXT_PRIMARY));
                    }
                    MessageKind::Response => {
                        ui.label(RichText::new(state.t("chat.bot_name")).color(BRAND).strong().small());
                        render_reply(ui, &message.text);
                    }
                }
            });
    });
}

fn input_form(ui: &mut egui::Ui, state: &mut UiState, terms_url: &str, actions: &mut Vec<ChatAction>) {
    let enabled = state.can_submit();

    if let Some(error) = &state.last_error {
        ui.label(RichText::new(error).color(ERROR));
    }

    match state.attached_file.clone() {
        Some(name) => {
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("{}: {}", state.t("chat.file_selected"), name)).color(TEXT_PRIMARY));
                if ui.add_enabled(enabled, egui::Button::new(state.t("chat.remove_file")).small()).clicked() {
                    actions.push(ChatAction::ClearAttachment);
                }
            });
        }
        None => {
            ui.horizontal(|ui| {
                if ui.add_enabled(enabled, egui::Button::new(state.t("chat.choose_file")).small()).clicked() {
                    actions.push(ChatAction::ChooseFile);
                }
                ui.label(RichText::new(state.t("chat.drop_hint")).color(TEXT_SECONDARY).small());
            });
        }
    }

    let placeholder = state.t("chat.placeholder");
    let response = ui.add_enabled(
        enabled,
        egui::TextEdit::multiline(&mut state.input_text)
            .hint_text(placeholder)
            .desired_rows(3)
            .desired_width(f32::INFINITY),
    );
    if response.changed() {
        actions.push(ChatAction::UpdateInput(state.input_text.clone()));
    }

    ui.horizontal(|ui| {
        let mut consent = state.consent_given;
        if ui.add_enabled(enabled, Checkbox::new(&mut consent, "")).changed() {
            actions.push(ChatAction::ToggleConsent);
        }
        ui.hyperlink_to(state.t("chat.terms"), terms_url);

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            let label = if state.is_loading {
                state.t("chat.submitting")
            } else {
                state.t("chat.submit")
            };
            let button = egui::Button::new(RichText::new(label).color(egui::Color32::WHITE).strong())
                .fill(if enabled { BRAND } else { TEXT_SECONDARY })
                .corner_radius(PANEL_ROUNDING)
                .min_size(Vec2::new(110.0, 32.0));
            if ui.add_enabled(enabled, button).clicked() {
                actions.push(ChatAction::Submit);
            }
            if ui.add_enabled(enabled, egui::Button::new(state.t("chat.reset")).small()).clicked() {
                actions.push(ChatAction::Reset);
            }
        });
    });
}
