use serde::{Deserialize, Serialize};
use crate::message::Message;

/// A file the user attached instead of typing text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FileRef {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// State of one chat widget instance.
///
/// Only the message log survives a save/restore cycle. Consent, the input
/// buffer, the attachment and the error and loading flags are tied to the
/// live widget and must be given again after a reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub messages: Vec<Message>,
    #[serde(skip)]
    pub pending_input: String,
    #[serde(skip)]
    pub is_loading: bool,
    #[serde(skip)]
    pub last_error: Option<String>,
    #[serde(skip)]
    pub consent_given: bool,
    #[serde(skip)]
    pub attached_file: Option<FileRef>,
    pub created_at: String,
    pub updated_at: String,
}

impl ChatSession {
    /// New session seeded with a single greeting response.
    pub fn new(greeting: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            messages: vec![Message::response(greeting)],
            pending_input: String::new(),
            is_loading: false,
            last_error: None,
            consent_given: false,
            attached_file: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Response messages other than a seeded greeting, in log order.
    /// `greetings` lists the greeting text of every locale.
    pub fn exportable_responses<'a>(&'a self, greetings: &'a [&'a str]) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages
            .iter()
            .filter(move |m| m.is_response() && !greetings.contains(&m.text.as_str()))
    }
}
