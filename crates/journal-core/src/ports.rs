//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `journal-core` (pure Rust).
//! Browser implementations live in `journal-platform`, server-side ones in
//! `journal-server`. The core never imports platform code.

use async_trait::async_trait;
use journal_types::{
    Result,
    run::AssistantRun,
    session::ChatSession,
};
use crate::export::layout::LaidOutDocument;

// ─── Assistant Port (widget → proxy endpoint) ────────────────

#[async_trait(?Send)]
pub trait AssistantPort {
    /// Send the user's text to the proxy endpoint and return the
    /// formatted reply fragment.
    async fn ask(&self, question: &str) -> Result<String>;
}

// ─── Assistant Platform Port (proxy → remote assistant API) ──

/// Assistant definition as returned by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantInfo {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadRole {
    User,
    Assistant,
}

/// A message on a platform thread, reduced to its text parts
#[derive(Debug, Clone)]
pub struct ThreadMessage {
    pub role: ThreadRole,
    pub text_parts: Vec<String>,
}

#[async_trait(?Send)]
pub trait AssistantPlatformPort {
    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<AssistantInfo>;

    /// Create an empty conversation thread and return its id
    async fn create_thread(&self) -> Result<String>;

    async fn add_user_message(&self, thread_id: &str, content: &str) -> Result<()>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<AssistantRun>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<AssistantRun>;

    /// Thread messages, newest first
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;
}

// ─── Sleep Port ──────────────────────────────────────────────

#[async_trait(?Send)]
pub trait SleepPort {
    async fn sleep(&self, ms: u64);
}

// ─── OCR Port ────────────────────────────────────────────────

#[async_trait(?Send)]
pub trait OcrPort {
    /// Recognise text in an encoded image (PNG, JPEG, ...)
    async fn recognize(&self, image: &[u8], mime: &str, language: &str) -> Result<String>;

    fn engine_name(&self) -> &str;
}

// ─── Document Ports ──────────────────────────────────────────

/// Turns a laid-out document into a file format (PDF, ...)
pub trait DocumentBackend {
    fn render(&self, doc: &LaidOutDocument) -> Result<Vec<u8>>;

    fn content_type(&self) -> &str;
}

/// Destination of an exported document (browser download, file, ...)
pub trait DocumentSink {
    /// False while the export anchor is not mounted; exports are then skipped.
    fn is_mounted(&self) -> bool;

    fn save(&self, file_name: &str, content_type: &str, bytes: &[u8]) -> Result<()>;
}

// ─── Storage Ports ───────────────────────────────────────────

#[async_trait(?Send)]
pub trait StoragePort {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

/// Persists the chat session across reloads
#[async_trait(?Send)]
pub trait SessionStore {
    async fn load(&self) -> Result<Option<ChatSession>>;

    async fn save(&self, session: &ChatSession) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}
