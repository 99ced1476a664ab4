use serde::{Deserialize, Serialize};

/// Who produced a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Text the user pasted, or the name of the file they attached
    Question,
    /// Reply from the assistant; may carry limited markup
    Response,
}

/// A single entry in the chat log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub text: String,
}

impl Message {
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Question,
            text: text.into(),
        }
    }

    pub fn response(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Response,
            text: text.into(),
        }
    }

    pub fn is_response(&self) -> bool {
        self.kind == MessageKind::Response
    }
}
