//! Chat session controller: the widget's state machine.
//!
//! Owns the [`ChatSession`] and mediates between the input form, the
//! assistant proxy ([`AssistantPort`]) and the document exporter. Every
//! method takes `&self` and borrows the session only between awaits, so
//! the UI can keep editing input or consent while a request is in flight.
//!
//! `submit` runs:
//! 1. Gates: already loading (ignored), consent, empty input
//! 2. Normalise the attachment, if any
//! 3. Append the question, ask the proxy
//! 4. Append the reply, clear the form, export

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use journal_types::{
    ErrorKind, Result,
    event::{ChatEvent, Notice},
    locale::{self, Locale},
    message::Message,
    session::{ChatSession, FileRef},
};
use crate::event_bus::EventBus;
use crate::export::{DocumentExporter, ExportReport};
use crate::normalizer::InputNormalizer;
use crate::ports::{AssistantPort, SessionStore};

/// Result of one `submit` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A reply was appended to the log
    Answered,
    /// A request was already in flight; nothing happened
    Ignored,
    /// Blocked before any network call
    Rejected(ErrorKind),
    /// The request started but did not produce a reply
    Failed(ErrorKind),
}

pub struct ChatController {
    session: RefCell<ChatSession>,
    locale: Cell<Locale>,
    event_bus: EventBus,
    assistant: Rc<dyn AssistantPort>,
    normalizer: InputNormalizer,
    exporter: DocumentExporter,
    store: Option<Rc<dyn SessionStore>>,
    submit_counter: Cell<u64>,
}

impl ChatController {
    pub fn new(
        locale: Locale,
        event_bus: EventBus,
        assistant: Rc<dyn AssistantPort>,
        normalizer: InputNormalizer,
        exporter: DocumentExporter,
    ) -> Self {
        let session = ChatSession::new(locale::text(locale, "chat.greeting"));
        event_bus.emit(ChatEvent::SessionLoaded {
            messages: session.messages.clone(),
        });

        Self {
            session: RefCell::new(session),
            locale: Cell::new(locale),
            event_bus,
            assistant,
            normalizer,
            exporter,
            store: None,
            submit_counter: Cell::new(0),
        }
    }

    pub fn with_store(mut self, store: Rc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the seeded session with the stored one, if any.
    pub async fn restore(&self) -> Result<bool> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        let Some(stored) = store.load().await? else {
            return Ok(false);
        };

        // Only the log comes back; consent is asked for again.
        let messages = {
            let mut session = self.session.borrow_mut();
            if session.is_loading {
                log::warn!("Session restore skipped: a request is in flight");
                return Ok(false);
            }
            session.id = stored.id;
            session.messages = stored.messages;
            session.created_at = stored.created_at;
            session.updated_at = stored.updated_at;
            session.messages.clone()
        };

        log::info!("Restored chat session with {} message(s)", messages.len());
        self.event_bus.emit(ChatEvent::SessionLoaded { messages });
        Ok(true)
    }

    // ─── Accessors ───────────────────────────────────────────

    pub fn snapshot(&self) -> ChatSession {
        self.session.borrow().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.session.borrow().messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.session.borrow().is_loading
    }

    pub fn locale(&self) -> Locale {
        self.locale.get()
    }

    /// Switch locale. An untouched session gets its greeting re-seeded.
    pub fn set_locale(&self, locale: Locale) {
        let previous = self.locale.replace(locale);
        if previous == locale {
            return;
        }

        let greeting = locale::text(locale, "chat.greeting");
        let messages = {
            let mut session = self.session.borrow_mut();
            match session.messages.as_mut_slice() {
                [only] if only.text == locale::text(previous, "chat.greeting") => {
                    only.text = greeting.to_string();
                }
                _ => return,
            }
            session.messages.clone()
        };
        self.event_bus.emit(ChatEvent::SessionLoaded { messages });
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // ─── Local state mutations ───────────────────────────────

    pub fn toggle_consent(&self) -> bool {
        let given = {
            let mut session = self.session.borrow_mut();
            session.consent_given = !session.consent_given;
            session.consent_given
        };
        self.event_bus.emit(ChatEvent::ConsentChanged { given });
        given
    }

    pub fn update_input(&self, text: impl Into<String>) {
        let text = text.into();
        self.session.borrow_mut().pending_input = text.clone();
        self.event_bus.emit(ChatEvent::InputChanged { text });
    }

    pub fn attach_file(&self, file: FileRef) {
        let file_name = Some(file.name.clone());
        self.session.borrow_mut().attached_file = Some(file);
        self.event_bus.emit(ChatEvent::AttachmentChanged { file_name });
    }

    pub fn clear_attachment(&self) {
        self.session.borrow_mut().attached_file = None;
        self.event_bus.emit(ChatEvent::AttachmentChanged { file_name: None });
    }

    // ─── Submission ──────────────────────────────────────────

    pub async fn submit(&self) -> SubmitOutcome {
        let (question, file) = {
            let session = self.session.borrow();
            if session.is_loading {
                log::debug!("Submit ignored: a request is already in flight");
                return SubmitOutcome::Ignored;
            }
            if !session.consent_given {
                drop(session);
                self.notify("notice.consent_required");
                return SubmitOutcome::Rejected(ErrorKind::Consent);
            }
            if session.pending_input.trim().is_empty() && session.attached_file.is_none() {
                drop(session);
                self.notify("notice.input_required");
                return SubmitOutcome::Rejected(ErrorKind::Validation);
            }
            (session.pending_input.clone(), session.attached_file.clone())
        };

        let _loading = LoadingGuard::engage(self);

        let text_to_send = match &file {
            Some(file) => match self.normalizer.normalize(file).await {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Could not read {}: {}", file.name, e);
                    let key = if InputNormalizer::supports(&file.mime) {
                        "error.ocr_failed"
                    } else {
                        "error.unsupported_file"
                    };
                    self.fail(key);
                    return SubmitOutcome::Failed(ErrorKind::Normalizer);
                }
            },
            None => question.clone(),
        };

        let label = match &file {
            Some(file) => file.name.clone(),
            None => question,
        };
        self.append(Message::question(label));

        match self.assistant.ask(&text_to_send).await {
            Ok(reply) => {
                self.append(Message::response(reply));
                self.clear_form();
                self.export();
                self.persist().await;
                SubmitOutcome::Answered
            }
            Err(e) => {
                log::error!("Assistant request failed: {}", e);
                self.fail("error.fetch_failed");
                self.persist().await;
                SubmitOutcome::Failed(e.kind())
            }
        }
    }

    /// Convenience for callers without a form: set the input and submit.
    pub async fn ask(&self, question: impl Into<String>) -> SubmitOutcome {
        if self.is_loading() {
            return SubmitOutcome::Ignored;
        }
        self.update_input(question);
        self.submit().await
    }

    /// Export all replies except the greeting. A missing export anchor or
    /// an export failure never affects the chat itself.
    pub fn export(&self) -> Option<ExportReport> {
        let locale = self.locale.get();
        let greetings: Vec<&str> = Locale::all()
            .iter()
            .map(|l| locale::text(*l, "chat.greeting"))
            .collect();
        let responses: Vec<String> = self
            .session
            .borrow()
            .exportable_responses(&greetings)
            .map(|m| m.text.clone())
            .collect();
        let refs: Vec<&str> = responses.iter().map(String::as_str).collect();

        match self.exporter.export(locale::text(locale, "export.title"), &refs) {
            Ok(Some(report)) => {
                self.event_bus.emit(ChatEvent::Exported {
                    file_name: report.file_name.clone(),
                    pages: report.pages,
                });
                self.notify_info("notice.exported");
                Some(report)
            }
            Ok(None) => None,
            Err(e) => {
                log::error!("Export failed: {}", e);
                None
            }
        }
    }

    /// Start over with only the greeting. Consent is kept.
    pub async fn reset(&self) {
        let messages = {
            let mut session = self.session.borrow_mut();
            if session.is_loading {
                return;
            }
            let consent = session.consent_given;
            *session = ChatSession::new(locale::text(self.locale.get(), "chat.greeting"));
            session.consent_given = consent;
            session.messages.clone()
        };
        self.event_bus.emit(ChatEvent::SessionLoaded { messages });
        self.event_bus.emit(ChatEvent::InputChanged { text: String::new() });
        self.event_bus.emit(ChatEvent::AttachmentChanged { file_name: None });
        self.event_bus.emit(ChatEvent::Error { message: None });
        self.persist().await;
    }

    // ─── Helpers ─────────────────────────────────────────────

    fn append(&self, message: Message) {
        {
            let mut session = self.session.borrow_mut();
            session.messages.push(message.clone());
            session.touch();
        }
        self.event_bus.emit(ChatEvent::MessageAppended { message });
    }

    fn clear_form(&self) {
        {
            let mut session = self.session.borrow_mut();
            session.pending_input.clear();
            session.attached_file = None;
        }
        self.event_bus.emit(ChatEvent::InputChanged { text: String::new() });
        self.event_bus.emit(ChatEvent::AttachmentChanged { file_name: None });
    }

    fn fail(&self, key: &str) {
        let message = locale::text(self.locale.get(), key).to_string();
        self.session.borrow_mut().last_error = Some(message.clone());
        self.event_bus.emit(ChatEvent::Error {
            message: Some(message.clone()),
        });
        self.event_bus.emit(ChatEvent::Notice {
            notice: Notice::error(message),
        });
    }

    fn notify(&self, key: &str) {
        let text = locale::text(self.locale.get(), key);
        self.event_bus.emit(ChatEvent::Notice {
            notice: Notice::error(text),
        });
    }

    fn notify_info(&self, key: &str) {
        let text = locale::text(self.locale.get(), key);
        self.event_bus.emit(ChatEvent::Notice {
            notice: Notice::info(text),
        });
    }

    async fn persist(&self) {
        let Some(store) = &self.store else { return };
        let snapshot = self.session.borrow().clone();
        if let Err(e) = store.save(&snapshot).await {
            log::warn!("Could not save chat session: {}", e);
        }
    }
}

/// Holds `is_loading` for the duration of a submission and clears it on
/// every exit path, including a dropped future.
struct LoadingGuard<'a> {
    controller: &'a ChatController,
    submit_id: u64,
}

impl<'a> LoadingGuard<'a> {
    fn engage(controller: &'a ChatController) -> Self {
        let submit_id = controller.submit_counter.get() + 1;
        controller.submit_counter.set(submit_id);
        {
            let mut session = controller.session.borrow_mut();
            session.is_loading = true;
            session.last_error = None;
        }
        controller.event_bus.emit(ChatEvent::Error { message: None });
        controller.event_bus.emit(ChatEvent::SubmitStart { submit_id });
        Self {
            controller,
            submit_id,
        }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut session) = self.controller.session.try_borrow_mut() {
            session.is_loading = false;
        }
        self.controller.event_bus.emit(ChatEvent::SubmitEnd {
            submit_id: self.submit_id,
        });
    }
}
