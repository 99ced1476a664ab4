use serde::{Deserialize, Serialize};
use crate::message::Message;

/// Severity of a toast-style notice shown next to the chat widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }
}

/// Events emitted by the chat session controller.
/// The UI drains these each frame to keep its projection current.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatEvent {
    /// The whole log was replaced (mount, restore, reset)
    SessionLoaded { messages: Vec<Message> },

    /// A submission passed its gates and a request is about to start
    SubmitStart { submit_id: u64 },

    /// A message was appended to the log
    MessageAppended { message: Message },

    /// The submission finished, successfully or not
    SubmitEnd { submit_id: u64 },

    /// Consent checkbox state changed
    ConsentChanged { given: bool },

    /// Input buffer was replaced
    InputChanged { text: String },

    /// An attachment was set or cleared
    AttachmentChanged { file_name: Option<String> },

    /// A rejected submission or recoverable failure the user should see
    Notice { notice: Notice },

    /// `last_error` was set or cleared
    Error { message: Option<String> },

    /// A document was handed to the download sink
    Exported { file_name: String, pages: usize },
}
