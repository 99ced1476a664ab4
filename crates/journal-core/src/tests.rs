#[cfg(test)]
mod tests {
    use crate::controller::{ChatController, SubmitOutcome};
    use crate::event_bus::EventBus;
    use crate::export::layout::{DrawOp, LaidOutDocument, LayoutEngine};
    use crate::export::metrics::{HelveticaMetrics, TextMeasure, PT_TO_MM};
    use crate::export::layout::FontStyle;
    use crate::export::DocumentExporter;
    use crate::markup::{self, Block, Emphasis, ListKind};
    use crate::normalizer::{InputNormalizer, ATTACH_EXTENSIONS};
    use crate::ports::*;
    use crate::proxy::{self, AssistantProxy, format_reply};
    use journal_types::config::{AssistantConfig, ExportConfig};
    use journal_types::event::{ChatEvent, NoticeLevel};
    use journal_types::locale::{self, Locale};
    use journal_types::message::{Message, MessageKind};
    use journal_types::run::{AssistantRun, RunStatus};
    use journal_types::session::{ChatSession, FileRef};
    use journal_types::{ErrorKind, JournalError};
    use async_trait::async_trait;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    // Simple executor for single-threaded tests; the mocks resolve
    // immediately, so this never actually spins.
    fn block_on<F: std::future::Future<Output = T>, T>(f: F) -> T {
        use std::task::{Context, Poll, Wake, Waker};
        use std::sync::Arc;

        struct NoopWaker;
        impl Wake for NoopWaker {
            fn wake(self: Arc<Self>) {}
        }

        let waker = Waker::from(Arc::new(NoopWaker));
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(val) => return val,
                Poll::Pending => std::thread::yield_now(),
            }
        }
    }

    // ─── Mocks ───────────────────────────────────────────────

    struct MockAssistant {
        reply: journal_types::Result<String>,
        questions: RefCell<Vec<String>>,
    }

    impl MockAssistant {
        fn replying(text: &str) -> Rc<Self> {
            Rc::new(Self {
                reply: Ok(text.to_string()),
                questions: RefCell::new(Vec::new()),
            })
        }

        fn failing(error: JournalError) -> Rc<Self> {
            Rc::new(Self {
                reply: Err(error),
                questions: RefCell::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.questions.borrow().len()
        }
    }

    #[async_trait(?Send)]
    impl AssistantPort for MockAssistant {
        async fn ask(&self, question: &str) -> journal_types::Result<String> {
            self.questions.borrow_mut().push(question.to_string());
            self.reply.clone()
        }
    }

    /// Answers only once the test releases the gate
    struct GatedAssistant {
        gate: RefCell<Option<futures::channel::oneshot::Receiver<String>>>,
    }

    #[async_trait(?Send)]
    impl AssistantPort for GatedAssistant {
        async fn ask(&self, _question: &str) -> journal_types::Result<String> {
            let rx = self.gate.borrow_mut().take();
            match rx {
                Some(rx) => rx.await.map_err(|e| JournalError::Network(e.to_string())),
                None => Err(JournalError::Other("gate already used".to_string())),
            }
        }
    }

    struct MockOcr {
        result: journal_types::Result<String>,
        calls: Cell<usize>,
    }

    impl MockOcr {
        fn reading(text: &str) -> Rc<Self> {
            Rc::new(Self {
                result: Ok(text.to_string()),
                calls: Cell::new(0),
            })
        }

        fn failing() -> Rc<Self> {
            Rc::new(Self {
                result: Err(JournalError::JsInterop("worker crashed".to_string())),
                calls: Cell::new(0),
            })
        }
    }

    #[async_trait(?Send)]
    impl OcrPort for MockOcr {
        async fn recognize(&self, _image: &[u8], _mime: &str, _language: &str) -> journal_types::Result<String> {
            self.calls.set(self.calls.get() + 1);
            self.result.clone()
        }

        fn engine_name(&self) -> &str {
            "mock"
        }
    }

    /// Renders every text op as a line; remembers the last layout
    #[derive(Default)]
    struct PlainBackend {
        last: RefCell<Option<LaidOutDocument>>,
    }

    impl DocumentBackend for PlainBackend {
        fn render(&self, doc: &LaidOutDocument) -> journal_types::Result<Vec<u8>> {
            *self.last.borrow_mut() = Some(doc.clone());
            let text: Vec<&str> = doc.pages.iter().flat_map(|p| p.texts()).collect();
            Ok(text.join("\n").into_bytes())
        }

        fn content_type(&self) -> &str {
            "text/plain"
        }
    }

    struct RecordingSink {
        mounted: bool,
        saved: RefCell<Vec<(String, String, usize)>>,
    }

    impl RecordingSink {
        fn new(mounted: bool) -> Rc<Self> {
            Rc::new(Self {
                mounted,
                saved: RefCell::new(Vec::new()),
            })
        }
    }

    impl DocumentSink for RecordingSink {
        fn is_mounted(&self) -> bool {
            self.mounted
        }

        fn save(&self, file_name: &str, content_type: &str, bytes: &[u8]) -> journal_types::Result<()> {
            self.saved
                .borrow_mut()
                .push((file_name.to_string(), content_type.to_string(), bytes.len()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemorySessionStore {
        stored: RefCell<Option<ChatSession>>,
        saves: Cell<usize>,
    }

    #[async_trait(?Send)]
    impl SessionStore for MemorySessionStore {
        async fn load(&self) -> journal_types::Result<Option<ChatSession>> {
            Ok(self.stored.borrow().clone())
        }

        async fn save(&self, session: &ChatSession) -> journal_types::Result<()> {
            self.saves.set(self.saves.get() + 1);
            *self.stored.borrow_mut() = Some(session.clone());
            Ok(())
        }

        async fn clear(&self) -> journal_types::Result<()> {
            *self.stored.borrow_mut() = None;
            Ok(())
        }
    }

    struct Fixture {
        controller: ChatController,
        bus: EventBus,
        sink: Rc<RecordingSink>,
        backend: Rc<PlainBackend>,
    }

    fn fixture_with(assistant: Rc<dyn AssistantPort>, ocr: Rc<dyn OcrPort>, mounted: bool) -> Fixture {
        let bus = EventBus::new();
        let sink = RecordingSink::new(mounted);
        let backend = Rc::new(PlainBackend::default());
        let exporter = DocumentExporter::new(ExportConfig::default(), backend.clone(), sink.clone());
        let controller = ChatController::new(
            Locale::Sv,
            bus.clone(),
            assistant,
            InputNormalizer::new(ocr, "eng"),
            exporter,
        );
        Fixture {
            controller,
            bus,
            sink,
            backend,
        }
    }

    fn fixture(assistant: Rc<dyn AssistantPort>) -> Fixture {
        fixture_with(assistant, MockOcr::reading("ocr text"), true)
    }

    fn sv(key: &str) -> String {
        locale::text(Locale::Sv, key).to_string()
    }

    // ─── EventBus Tests ──────────────────────────────────────

    #[test]
    fn test_event_bus_new_is_empty() {
        let bus = EventBus::new();
        assert!(!bus.has_pending());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_bus_clone_shares_state() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        bus1.emit(ChatEvent::SubmitStart { submit_id: 1 });
        assert!(bus2.has_pending());

        let events = bus2.drain();
        assert_eq!(events.len(), 1);
        assert!(!bus1.has_pending());
    }

    // ─── Controller Tests ────────────────────────────────────

    #[test]
    fn test_controller_seeds_greeting() {
        let f = fixture(MockAssistant::replying("hej"));
        let messages = f.controller.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::Response);
        assert_eq!(messages[0].text, sv("chat.greeting"));

        let events = f.bus.drain();
        assert!(matches!(&events[0], ChatEvent::SessionLoaded { messages } if messages.len() == 1));
    }

    #[test]
    fn test_submit_without_consent_makes_no_call() {
        let assistant = MockAssistant::replying("hej");
        let f = fixture(assistant.clone());
        f.controller.update_input("Vad betyder CRP 5?");

        let outcome = block_on(f.controller.submit());

        assert_eq!(outcome, SubmitOutcome::Rejected(ErrorKind::Consent));
        assert_eq!(assistant.calls(), 0);
        assert_eq!(f.controller.messages().len(), 1);
        assert!(!f.controller.is_loading());

        let notice = f.bus.drain().into_iter().find_map(|e| match e {
            ChatEvent::Notice { notice } => Some(notice),
            _ => None,
        });
        let notice = notice.expect("consent notice");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.text, sv("notice.consent_required"));
    }

    #[test]
    fn test_submit_empty_input_makes_no_call() {
        let assistant = MockAssistant::replying("hej");
        let f = fixture(assistant.clone());
        f.controller.toggle_consent();
        f.controller.update_input("   \n\t");

        let outcome = block_on(f.controller.submit());

        assert_eq!(outcome, SubmitOutcome::Rejected(ErrorKind::Validation));
        assert_eq!(assistant.calls(), 0);
        assert_eq!(f.controller.messages().len(), 1);
    }

    #[test]
    fn test_submit_appends_question_and_answer() {
        let assistant = MockAssistant::replying("<h3>PSA</h3><br />Värdet är normalt.");
        let f = fixture(assistant.clone());
        f.controller.toggle_consent();
        f.controller.update_input("PSA 4.5");
        let _ = f.bus.drain();

        let outcome = block_on(f.controller.submit());

        assert_eq!(outcome, SubmitOutcome::Answered);
        assert_eq!(assistant.questions.borrow().as_slice(), ["PSA 4.5"]);

        let messages = f.controller.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], Message::question("PSA 4.5"));
        assert_eq!(messages[2], Message::response("<h3>PSA</h3><br />Värdet är normalt."));

        let session = f.controller.snapshot();
        assert!(!session.is_loading);
        assert!(session.pending_input.is_empty());
        assert!(session.last_error.is_none());

        let events = f.bus.drain();
        let start = events.iter().position(|e| matches!(e, ChatEvent::SubmitStart { .. }));
        let end = events.iter().position(|e| matches!(e, ChatEvent::SubmitEnd { .. }));
        assert!(start.is_some() && end.is_some());
        assert!(start < end);
        let appended = events
            .iter()
            .filter(|e| matches!(e, ChatEvent::MessageAppended { .. }))
            .count();
        assert_eq!(appended, 2);
    }

    #[test]
    fn test_submit_exports_responses_without_greeting() {
        let f = fixture(MockAssistant::replying("Svar ett"));
        f.controller.toggle_consent();
        f.controller.update_input("fråga");
        block_on(f.controller.submit());

        let saved = f.sink.saved.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "Journalkollen_AI_Svar.pdf");

        let doc = f.backend.last.borrow().clone().expect("rendered document");
        assert_eq!(doc.title, sv("export.title"));
        assert_eq!(doc.group_count(), 1);
        let text: Vec<&str> = doc.pages.iter().flat_map(|p| p.texts()).collect();
        assert!(text.contains(&"Svar ett"));
        assert!(!text.iter().any(|t| t.contains("chatbot")));

        let exported = f.bus.drain().into_iter().any(|e| matches!(
            e,
            ChatEvent::Exported { ref file_name, pages: 1 } if file_name == "Journalkollen_AI_Svar.pdf"
        ));
        assert!(exported);
    }

    #[test]
    fn test_submit_with_unmounted_sink_still_answers() {
        let f = fixture_with(MockAssistant::replying("ok"), MockOcr::reading("x"), false);
        f.controller.toggle_consent();
        f.controller.update_input("fråga");

        assert_eq!(block_on(f.controller.submit()), SubmitOutcome::Answered);
        assert!(f.sink.saved.borrow().is_empty());
        assert!(f.backend.last.borrow().is_none());
        assert_eq!(f.controller.export(), None);
    }

    #[test]
    fn test_submit_failure_keeps_question_and_sets_error() {
        let assistant = MockAssistant::failing(JournalError::Network("offline".to_string()));
        let f = fixture(assistant.clone());
        f.controller.toggle_consent();
        f.controller.update_input("Hb 120");

        let outcome = block_on(f.controller.submit());

        assert_eq!(outcome, SubmitOutcome::Failed(ErrorKind::Upstream));
        let messages = f.controller.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], Message::question("Hb 120"));

        let session = f.controller.snapshot();
        assert!(!session.is_loading);
        assert_eq!(session.last_error, Some(sv("error.fetch_failed")));
        assert_eq!(session.pending_input, "Hb 120");
        assert!(f.sink.saved.borrow().is_empty());
    }

    #[test]
    fn test_next_submit_clears_previous_error() {
        let f = fixture(MockAssistant::failing(JournalError::Upstream("boom".to_string())));
        f.controller.toggle_consent();
        f.controller.update_input("a");
        block_on(f.controller.submit());
        assert!(f.controller.snapshot().last_error.is_some());
        let _ = f.bus.drain();

        block_on(f.controller.submit());
        let events = f.bus.drain();
        assert!(matches!(events[0], ChatEvent::Error { message: None }));
    }

    #[test]
    fn test_submit_while_loading_is_ignored() {
        let (tx, rx) = futures::channel::oneshot::channel::<String>();
        let assistant = Rc::new(GatedAssistant {
            gate: RefCell::new(Some(rx)),
        });
        let f = fixture(assistant);
        f.controller.toggle_consent();
        f.controller.update_input("första");

        block_on(async {
            let first = f.controller.submit();
            futures::pin_mut!(first);
            assert!(futures::poll!(first.as_mut()).is_pending());
            assert!(f.controller.is_loading());

            assert_eq!(f.controller.submit().await, SubmitOutcome::Ignored);
            assert_eq!(f.controller.messages().len(), 2);

            tx.send("svar".to_string()).expect("receiver alive");
            assert_eq!(first.await, SubmitOutcome::Answered);
        });

        assert!(!f.controller.is_loading());
        assert_eq!(f.controller.messages().len(), 3);
    }

    #[test]
    fn test_dropped_submit_clears_loading() {
        let (_tx, rx) = futures::channel::oneshot::channel::<String>();
        let f = fixture(Rc::new(GatedAssistant {
            gate: RefCell::new(Some(rx)),
        }));
        f.controller.toggle_consent();
        f.controller.update_input("fråga");

        block_on(async {
            let mut first = Box::pin(f.controller.submit());
            assert!(futures::poll!(first.as_mut()).is_pending());
            assert!(f.controller.is_loading());
            drop(first);
        });

        assert!(!f.controller.is_loading());
        let ends = f
            .bus
            .drain()
            .into_iter()
            .filter(|e| matches!(e, ChatEvent::SubmitEnd { .. }))
            .count();
        assert_eq!(ends, 1);
    }

    #[test]
    fn test_image_attachment_goes_through_ocr() {
        let assistant = MockAssistant::replying("tolkning");
        let ocr = MockOcr::reading("Hb 140 g/L");
        let f = fixture_with(assistant.clone(), ocr.clone(), true);
        f.controller.toggle_consent();
        f.controller.attach_file(FileRef::new("prov.png", "image/png", vec![1, 2, 3]));

        let outcome = block_on(f.controller.submit());

        assert_eq!(outcome, SubmitOutcome::Answered);
        assert_eq!(ocr.calls.get(), 1);
        assert_eq!(assistant.questions.borrow().as_slice(), ["Hb 140 g/L"]);
        assert_eq!(f.controller.messages()[1], Message::question("prov.png"));
        assert!(f.controller.snapshot().attached_file.is_none());
    }

    #[test]
    fn test_ocr_failure_leaves_log_untouched() {
        let assistant = MockAssistant::replying("x");
        let f = fixture_with(assistant.clone(), MockOcr::failing(), true);
        f.controller.toggle_consent();
        f.controller.attach_file(FileRef::new("prov.jpg", "image/jpeg", vec![0xff, 0xd8]));

        let outcome = block_on(f.controller.submit());

        assert_eq!(outcome, SubmitOutcome::Failed(ErrorKind::Normalizer));
        assert_eq!(assistant.calls(), 0);
        assert_eq!(f.controller.messages().len(), 1);
        let session = f.controller.snapshot();
        assert_eq!(session.last_error, Some(sv("error.ocr_failed")));
        assert!(!session.is_loading);
    }

    #[test]
    fn test_unsupported_attachment_is_rejected() {
        let assistant = MockAssistant::replying("x");
        let f = fixture(assistant.clone());
        f.controller.toggle_consent();
        f.controller.attach_file(FileRef::new("svar.docx", "application/msword", vec![1]));

        let outcome = block_on(f.controller.submit());

        assert_eq!(outcome, SubmitOutcome::Failed(ErrorKind::Normalizer));
        assert_eq!(assistant.calls(), 0);
        assert_eq!(
            f.controller.snapshot().last_error,
            Some(sv("error.unsupported_file"))
        );
    }

    #[test]
    fn test_restore_and_persist_session() {
        let store = Rc::new(MemorySessionStore::default());
        let mut stored = ChatSession::new("hej");
        stored.messages.push(Message::question("gammal fråga"));
        stored.consent_given = true;
        *store.stored.borrow_mut() = Some(stored);

        let f = fixture(MockAssistant::replying("nytt svar"));
        let controller = f.controller.with_store(store.clone());

        assert!(block_on(controller.restore()).unwrap());
        assert_eq!(controller.messages().len(), 2);
        assert!(!controller.snapshot().consent_given);

        controller.update_input("ny fråga");
        assert_eq!(block_on(controller.submit()), SubmitOutcome::Rejected(ErrorKind::Consent));
        controller.toggle_consent();
        assert_eq!(block_on(controller.submit()), SubmitOutcome::Answered);
        assert_eq!(store.saves.get(), 1);
        assert_eq!(store.stored.borrow().as_ref().map(|s| s.messages.len()), Some(4));
    }

    #[test]
    fn test_restore_without_store_is_noop() {
        let f = fixture(MockAssistant::replying("x"));
        assert!(!block_on(f.controller.restore()).unwrap());
        assert_eq!(f.controller.messages().len(), 1);
    }

    #[test]
    fn test_reset_keeps_consent() {
        let f = fixture(MockAssistant::replying("svar"));
        f.controller.toggle_consent();
        block_on(f.controller.ask("fråga"));
        assert_eq!(f.controller.messages().len(), 3);

        block_on(f.controller.reset());
        let session = f.controller.snapshot();
        assert_eq!(session.messages.len(), 1);
        assert!(session.consent_given);
    }

    #[test]
    fn test_locale_switch_changes_notice_text() {
        let f = fixture(MockAssistant::replying("x"));
        f.controller.set_locale(Locale::En);
        f.controller.update_input("question");
        let _ = f.bus.drain();

        block_on(f.controller.submit());

        let text = f.bus.drain().into_iter().find_map(|e| match e {
            ChatEvent::Notice { notice } => Some(notice.text),
            _ => None,
        });
        assert_eq!(text.as_deref(), Some(locale::text(Locale::En, "notice.consent_required")));
    }

    #[test]
    fn test_locale_switch_reseeds_untouched_greeting() {
        let f = fixture(MockAssistant::replying("x"));
        let _ = f.bus.drain();

        f.controller.set_locale(Locale::En);

        let messages = f.controller.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, locale::text(Locale::En, "chat.greeting"));
        assert!(f
            .bus
            .drain()
            .iter()
            .any(|e| matches!(e, ChatEvent::SessionLoaded { .. })));
    }

    #[test]
    fn test_locale_switch_keeps_started_conversation() {
        let f = fixture(MockAssistant::replying("svar"));
        f.controller.toggle_consent();
        block_on(f.controller.ask("fråga"));

        f.controller.set_locale(Locale::En);

        let messages = f.controller.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].text, sv("chat.greeting"));
    }

    // ─── Normalizer Tests ────────────────────────────────────

    #[test]
    fn test_normalizer_supported_types() {
        assert!(InputNormalizer::supports("image/png"));
        assert!(InputNormalizer::supports("image/jpeg"));
        assert!(InputNormalizer::supports("text/plain; charset=utf-8"));
        assert!(InputNormalizer::supports("application/pdf"));
        assert!(!InputNormalizer::supports("application/zip"));
    }

    #[test]
    fn test_normalizer_mime_from_file_name() {
        assert_eq!(InputNormalizer::mime_for("Provsvar.JPG"), "image/jpeg");
        assert_eq!(InputNormalizer::mime_for("anteckning.txt"), "text/plain");
        assert_eq!(InputNormalizer::mime_for("remiss.v2.pdf"), "application/pdf");
        assert_eq!(InputNormalizer::mime_for("README"), "application/octet-stream");
        for ext in ATTACH_EXTENSIONS {
            let mime = InputNormalizer::mime_for(&format!("fil.{ext}"));
            assert!(InputNormalizer::supports(mime), "{ext} -> {mime}");
        }
    }

    #[test]
    fn test_normalizer_reads_text_files() {
        let normalizer = InputNormalizer::new(MockOcr::reading("unused"), "eng");
        let file = FileRef::new("svar.txt", "text/plain; charset=utf-8", "Kreatinin 80".as_bytes().to_vec());
        assert_eq!(block_on(normalizer.normalize(&file)).unwrap(), "Kreatinin 80");
    }

    #[test]
    fn test_normalizer_empty_text_is_error() {
        let normalizer = InputNormalizer::new(MockOcr::reading("  \n "), "eng");
        let file = FileRef::new("tom.png", "image/png", vec![0]);
        let err = block_on(normalizer.normalize(&file)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Normalizer);
    }

    #[test]
    fn test_normalizer_wraps_ocr_errors() {
        let normalizer = InputNormalizer::new(MockOcr::failing(), "eng");
        let file = FileRef::new("prov.png", "image/png", vec![0]);
        let err = block_on(normalizer.normalize(&file)).unwrap_err();
        assert!(matches!(err, JournalError::Normalizer(_)));
    }

    // ─── Proxy Tests ─────────────────────────────────────────

    struct MockPlatform {
        statuses: RefCell<VecDeque<RunStatus>>,
        messages: Vec<ThreadMessage>,
        posted: RefCell<Vec<String>>,
        polls: Cell<u32>,
    }

    impl MockPlatform {
        fn new(statuses: &[RunStatus], messages: Vec<ThreadMessage>) -> Rc<Self> {
            Rc::new(Self {
                statuses: RefCell::new(statuses.iter().copied().collect()),
                messages,
                posted: RefCell::new(Vec::new()),
                polls: Cell::new(0),
            })
        }
    }

    #[async_trait(?Send)]
    impl AssistantPlatformPort for MockPlatform {
        async fn retrieve_assistant(&self, assistant_id: &str) -> journal_types::Result<AssistantInfo> {
            Ok(AssistantInfo {
                id: assistant_id.to_string(),
                name: Some("Journalkollen".to_string()),
            })
        }

        async fn create_thread(&self) -> journal_types::Result<String> {
            Ok("thread_1".to_string())
        }

        async fn add_user_message(&self, _thread_id: &str, content: &str) -> journal_types::Result<()> {
            self.posted.borrow_mut().push(content.to_string());
            Ok(())
        }

        async fn create_run(&self, thread_id: &str, _assistant_id: &str) -> journal_types::Result<AssistantRun> {
            Ok(AssistantRun {
                thread_id: thread_id.to_string(),
                run_id: "run_1".to_string(),
                status: RunStatus::Queued,
            })
        }

        async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> journal_types::Result<AssistantRun> {
            self.polls.set(self.polls.get() + 1);
            let mut statuses = self.statuses.borrow_mut();
            let status = if statuses.len() > 1 {
                statuses.pop_front().unwrap_or(RunStatus::Completed)
            } else {
                statuses.front().copied().unwrap_or(RunStatus::Completed)
            };
            Ok(AssistantRun {
                thread_id: thread_id.to_string(),
                run_id: run_id.to_string(),
                status,
            })
        }

        async fn list_messages(&self, _thread_id: &str) -> journal_types::Result<Vec<ThreadMessage>> {
            Ok(self.messages.clone())
        }
    }

    #[derive(Default)]
    struct CountingSleep {
        total_ms: Cell<u64>,
    }

    #[async_trait(?Send)]
    impl SleepPort for CountingSleep {
        async fn sleep(&self, ms: u64) {
            self.total_ms.set(self.total_ms.get() + ms);
        }
    }

    fn assistant_says(parts: &[&str]) -> ThreadMessage {
        ThreadMessage {
            role: ThreadRole::Assistant,
            text_parts: parts.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn user_says(text: &str) -> ThreadMessage {
        ThreadMessage {
            role: ThreadRole::User,
            text_parts: vec![text.to_string()],
        }
    }

    fn proxy_config(interval: u64, attempts: u32, duration: u64) -> AssistantConfig {
        AssistantConfig {
            assistant_id: "asst_test".to_string(),
            poll_interval_ms: interval,
            max_poll_attempts: attempts,
            max_duration_ms: duration,
            ..AssistantConfig::default()
        }
    }

    #[test]
    fn test_proxy_returns_formatted_reply() {
        let platform = MockPlatform::new(
            &[RunStatus::Queued, RunStatus::InProgress, RunStatus::Completed],
            vec![assistant_says(&["### PSA\nVärdet är normalt."]), user_says("PSA 4.5")],
        );
        let sleeper = Rc::new(CountingSleep::default());
        let proxy = AssistantProxy::new(platform.clone(), sleeper.clone(), proxy_config(10, 10, 1_000));

        let reply = block_on(proxy.answer("PSA 4.5")).unwrap();

        assert_eq!(reply, "<h3>PSA</h3><br />Värdet är normalt.");
        assert_eq!(platform.posted.borrow().as_slice(), ["PSA 4.5"]);
        assert_eq!(platform.polls.get(), 3);
        assert_eq!(sleeper.total_ms.get(), 20);
    }

    #[test]
    fn test_proxy_joins_text_parts() {
        let platform = MockPlatform::new(
            &[RunStatus::Completed],
            vec![assistant_says(&["Del ett", "Del två"])],
        );
        let proxy = AssistantProxy::new(platform, Rc::new(CountingSleep::default()), proxy_config(10, 3, 1_000));
        assert_eq!(block_on(proxy.answer("q")).unwrap(), "Del ett<br />Del två");
    }

    #[test]
    fn test_proxy_without_assistant_message_uses_fallback() {
        let platform = MockPlatform::new(&[RunStatus::Completed], vec![user_says("q")]);
        let proxy = AssistantProxy::new(platform, Rc::new(CountingSleep::default()), proxy_config(10, 3, 1_000));
        assert_eq!(block_on(proxy.answer("q")).unwrap(), proxy::NO_RESPONSE);
    }

    #[test]
    fn test_proxy_rejects_blank_question() {
        let platform = MockPlatform::new(&[RunStatus::Completed], vec![]);
        let proxy = AssistantProxy::new(platform.clone(), Rc::new(CountingSleep::default()), proxy_config(10, 3, 1_000));

        let err = block_on(proxy.answer("  ")).unwrap_err();

        assert_eq!(err, JournalError::Validation(proxy::MISSING_QUESTION.to_string()));
        assert_eq!(err.http_status(), 400);
        assert!(platform.posted.borrow().is_empty());
    }

    #[test]
    fn test_proxy_times_out_after_max_attempts() {
        let platform = MockPlatform::new(&[RunStatus::InProgress], vec![]);
        let sleeper = Rc::new(CountingSleep::default());
        let proxy = AssistantProxy::new(platform.clone(), sleeper.clone(), proxy_config(10, 3, 1_000));

        let err = block_on(proxy.answer("q")).unwrap_err();

        assert_eq!(err, JournalError::TimedOut { attempts: 3, waited_ms: 20 });
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(platform.polls.get(), 3);
    }

    #[test]
    fn test_proxy_times_out_on_duration_budget() {
        let platform = MockPlatform::new(&[RunStatus::InProgress], vec![]);
        let sleeper = Rc::new(CountingSleep::default());
        let proxy = AssistantProxy::new(platform, sleeper.clone(), proxy_config(100, 10, 250));

        let err = block_on(proxy.answer("q")).unwrap_err();

        assert_eq!(err, JournalError::TimedOut { attempts: 3, waited_ms: 200 });
        assert!(sleeper.total_ms.get() <= 250);
    }

    #[test]
    fn test_proxy_terminal_failure_is_upstream() {
        let platform = MockPlatform::new(&[RunStatus::InProgress, RunStatus::Failed], vec![]);
        let proxy = AssistantProxy::new(platform, Rc::new(CountingSleep::default()), proxy_config(10, 10, 1_000));

        let err = block_on(proxy.answer("q")).unwrap_err();

        assert!(matches!(err, JournalError::Upstream(ref msg) if msg.contains("failed")));
        assert_eq!(err.http_status(), 500);
    }

    // ─── Reply formatting ────────────────────────────────────

    #[test]
    fn test_format_reply_headings() {
        assert_eq!(format_reply("### Rubrik"), "<h3>Rubrik</h3>");
        assert_eq!(format_reply("#### Underrubrik"), "<h4>Underrubrik</h4>");
        assert_eq!(format_reply("##### Djup"), "<h4>Djup</h4>");
        assert_eq!(format_reply("## Kvar"), "## Kvar");
    }

    #[test]
    fn test_format_reply_line_breaks() {
        assert_eq!(format_reply("a\nb"), "a<br />b");
        assert_eq!(format_reply("a\r\nb"), "a<br />b");
        assert_eq!(format_reply("a\n\nb"), "a<br /><br />b");
    }

    #[test]
    fn test_format_reply_never_leaves_markers_or_newlines() {
        let samples = [
            "### A\n#### B\ntext ### mitt i\n####### många",
            "\r\n###\n####\n",
            "inga rubriker alls\nbara rader",
        ];
        for sample in samples {
            let out = format_reply(sample);
            assert!(!out.contains("###"), "{out}");
            assert!(!out.contains('\n'), "{out}");
            assert!(!out.contains('\r'), "{out}");
        }
    }

    // ─── Markup Tests ────────────────────────────────────────

    #[test]
    fn test_markup_heading_and_breaks() {
        let blocks = markup::parse("<h3>Rubrik</h3><br />Text här");
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 3, text: "Rubrik".to_string() },
                Block::Break,
                Block::Text("Text här".to_string()),
            ]
        );
    }

    #[test]
    fn test_markup_emphasis_and_paragraph() {
        let blocks = markup::parse("<p>Stycke  med   luft</p><b>Viktigt</b><em>obs</em>");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("Stycke med luft".to_string()),
                Block::Emphasis { style: Emphasis::Bold, text: "Viktigt".to_string() },
                Block::Emphasis { style: Emphasis::Italic, text: "obs".to_string() },
            ]
        );
    }

    #[test]
    fn test_markup_lists() {
        let blocks = markup::parse("<ul><li>ett<li>två</ul><ol><li>a</li><li>b</li></ol>");
        assert_eq!(
            blocks,
            vec![
                Block::List { kind: ListKind::Unordered, items: vec!["ett".to_string(), "två".to_string()] },
                Block::List { kind: ListKind::Ordered, items: vec!["a".to_string(), "b".to_string()] },
            ]
        );
    }

    #[test]
    fn test_markup_nested_list_items_stay_separate() {
        let blocks = markup::parse("<ul><li>Blodvärden<ul><li>Hb</li><li>CRP</li></ul></li><li>Urin</li></ul>");
        assert_eq!(
            blocks,
            vec![Block::List {
                kind: ListKind::Unordered,
                items: vec![
                    "Blodvärden".to_string(),
                    "Hb".to_string(),
                    "CRP".to_string(),
                    "Urin".to_string(),
                ],
            }]
        );
    }

    #[test]
    fn test_plain_text_separates_blocks() {
        assert_eq!(markup::to_plain_text("<p>ett</p><p>två</p>"), "ett\ntvå");
        assert_eq!(markup::to_plain_text("<div><h3>Rubrik</h3>text</div>"), "Rubrik\ntext");
    }

    #[test]
    fn test_markup_dash_lines_become_list() {
        let blocks = markup::parse("- ett<br />- två<br />efter");
        assert_eq!(
            blocks,
            vec![
                Block::List { kind: ListKind::Unordered, items: vec!["ett".to_string(), "två".to_string()] },
                Block::Break,
                Block::Text("efter".to_string()),
            ]
        );
    }

    #[test]
    fn test_markup_entities_and_stray_brackets() {
        assert_eq!(markup::to_plain_text("A &amp; B &lt;3 &#229;"), "A & B <3 å");
        assert_eq!(markup::to_plain_text("a < b"), "a < b");
        assert_eq!(markup::to_plain_text("x<!-- dold -->y"), "xy");
        assert_eq!(markup::to_plain_text("<b>öppen"), "öppen");
    }

    // ─── Layout Tests ────────────────────────────────────────

    fn engine() -> LayoutEngine {
        LayoutEngine::new(ExportConfig::default(), Box::new(HelveticaMetrics))
    }

    #[test]
    fn test_line_height_is_in_millimetres() {
        let lh = engine().line_height_mm();
        assert!((lh - 12.0 * PT_TO_MM * 1.5).abs() < 1e-4);
        assert!((lh - 6.35).abs() < 0.01);
    }

    #[test]
    fn test_layout_paginates_long_reply() {
        let engine = engine();
        let reply = (0..100).map(|i| format!("Rad {i}")).collect::<Vec<_>>().join("<br />");
        let doc = engine.layout("Titel", &[&reply]);

        let needed = (100.0 * engine.line_height_mm() / engine.content_height_mm()).ceil() as usize;
        assert!(doc.page_count() >= needed, "{} < {}", doc.page_count(), needed);
        assert!(doc.pages.iter().all(|p| p.has_watermark()));

        let limit = 297.0 - 20.0;
        for page in &doc.pages {
            for op in &page.ops {
                if let DrawOp::Text { y_mm, size_pt, .. } = op {
                    if *size_pt == 12.0 {
                        assert!(*y_mm + engine.line_height_mm() <= limit + 1e-3);
                    }
                }
            }
        }
    }

    #[test]
    fn test_layout_watermark_position() {
        let doc = engine().layout("Titel", &["kort"]);
        let watermark = doc.pages[0].ops.iter().find_map(|op| match op {
            DrawOp::Watermark { x_mm, y_mm, width_mm, height_mm } => Some((*x_mm, *y_mm, *width_mm, *height_mm)),
            _ => None,
        });
        assert_eq!(watermark, Some((120.0, 247.0, 70.0, 30.0)));
    }

    #[test]
    fn test_layout_each_response_starts_new_page() {
        let doc = engine().layout("Titel", &["första svaret", "andra svaret"]);
        assert_eq!(doc.group_count(), 2);
        assert_eq!(doc.page_count(), 2);
        let second = doc.first_page_of_group(1).expect("second group");
        assert_eq!(second.number, 2);
        assert!(second.texts().any(|t| t == "andra svaret"));
    }

    #[test]
    fn test_layout_title_and_footer() {
        let doc = engine().layout("Journalkollen AI Svar", &["a", "b"]);
        let first: Vec<&str> = doc.pages[0].texts().collect();
        assert_eq!(first[0], "Journalkollen AI Svar");
        assert!(first.contains(&"1 / 2"));
        assert!(doc.pages[1].texts().any(|t| t == "2 / 2"));
    }

    #[test]
    fn test_wrap_respects_width() {
        let engine = engine();
        let text = "Detta är en ganska lång mening som måste brytas över flera rader i dokumentet.";
        let lines = engine.wrap(text, FontStyle::Normal, 12.0, 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(HelveticaMetrics.width_mm(line, FontStyle::Normal, 12.0) <= 60.0);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_exporter_skips_empty_and_unmounted() {
        let sink = RecordingSink::new(true);
        let exporter = DocumentExporter::new(ExportConfig::default(), Rc::new(PlainBackend::default()), sink.clone());
        assert_eq!(exporter.export("Titel", &[]).unwrap(), None);

        let unmounted = DocumentExporter::new(
            ExportConfig::default(),
            Rc::new(PlainBackend::default()),
            RecordingSink::new(false),
        );
        assert_eq!(unmounted.export("Titel", &["svar"]).unwrap(), None);

        let report = exporter.export("Titel", &["ett", "två"]).unwrap().expect("report");
        assert_eq!(report.groups, 2);
        assert_eq!(sink.saved.borrow().len(), 1);
    }
}
