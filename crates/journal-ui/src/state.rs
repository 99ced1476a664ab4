//! UI-level state that drives rendering.
//! This is a read-only projection of the chat session controller,
//! updated each frame by draining the EventBus.

use journal_types::event::{ChatEvent, Notice};
use journal_types::locale::{self, Locale};
use journal_types::message::Message;

/// Notices kept on screen at once; older ones are dropped first.
pub const MAX_NOTICES: usize = 3;

/// State visible to UI panels
pub struct UiState {
    /// Chat log, greeting first
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub notices: Vec<Notice>,
    pub consent_given: bool,
    /// Input field content
    pub input_text: String,
    /// Name of the attached file, if any
    pub attached_file: Option<String>,
    pub locale: Locale,
}

impl UiState {
    pub fn new(locale: Locale) -> Self {
        Self {
            messages: Vec::new(),
            is_loading: false,
            last_error: None,
            notices: Vec::new(),
            consent_given: false,
            input_text: String::new(),
            attached_file: None,
            locale,
        }
    }

    /// Localized text for `key` in the current locale
    pub fn t<'a>(&self, key: &'a str) -> &'a str {
        locale::text(self.locale, key)
    }

    /// Process events from the EventBus and update UI state
    pub fn process_events(&mut self, events: Vec<ChatEvent>) {
        for event in events {
            match event {
                ChatEvent::SessionLoaded { messages } => {
                    self.messages = messages;
                }
                ChatEvent::SubmitStart { .. } => {
                    self.is_loading = true;
                }
                ChatEvent::MessageAppended { message } => {
                    self.messages.push(message);
                }
                ChatEvent::SubmitEnd { .. } => {
                    self.is_loading = false;
                }
                ChatEvent::ConsentChanged { given } => {
                    self.consent_given = given;
                }
                ChatEvent::InputChanged { text } => {
                    self.input_text = text;
                }
                ChatEvent::AttachmentChanged { file_name } => {
                    self.attached_file = file_name;
                }
                ChatEvent::Notice { notice } => self.push_notice(notice),
                ChatEvent::Error { message } => {
                    self.last_error = message;
                }
                ChatEvent::Exported { file_name, pages } => {
                    log::debug!("Exported {} ({} pages)", file_name, pages);
                }
            }
        }
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
        if self.notices.len() > MAX_NOTICES {
            let excess = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..excess);
        }
    }

    pub fn dismiss_notice(&mut self, index: usize) {
        if index < self.notices.len() {
            self.notices.remove(index);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading
    }

    /// Submission allowed from the UI's point of view; the controller
    /// re-checks every gate.
    pub fn can_submit(&self) -> bool {
        !self.is_loading
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}
