//! Main egui application: wires the chat controller to the chat panel.

use std::rc::Rc;

use egui::{self, CentralPanel};
use gloo_net::http::Request;
use wasm_bindgen::JsValue;

use journal_core::controller::ChatController;
use journal_core::event_bus::EventBus;
use journal_core::export::DocumentExporter;
use journal_core::normalizer::{InputNormalizer, ATTACH_EXTENSIONS};
use journal_platform::assistant::ProxyClient;
use journal_platform::download::BrowserDownload;
use journal_platform::ocr::TesseractJsOcr;
use journal_platform::pdf::PrintPdfBackend;
use journal_platform::session_store::StorageSessionStore;
use journal_platform::storage::auto_detect_storage;
use journal_types::config::AppConfig;
use journal_types::session::FileRef;
use journal_ui::panels::chat::{chat_panel, ChatAction};
use journal_ui::state::UiState;
use journal_ui::theme;

/// Page global the host can set to override the defaults
const CONFIG_GLOBAL: &str = "journalkollenConfig";

pub struct JournalApp {
    ui_state: UiState,
    config: AppConfig,
    event_bus: EventBus,
    controller: Rc<ChatController>,
    first_frame: bool,
}

impl JournalApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config = load_config();
        let event_bus = EventBus::new();

        let storage = auto_detect_storage(&config.storage.backend);
        let store = Rc::new(StorageSessionStore::new(storage));

        let pdf = Rc::new(PrintPdfBackend::new(config.export.watermark.label.clone()));
        if let Some(url) = &config.export.watermark.image_url {
            Self::load_watermark(url.clone(), pdf.clone());
        }

        let exporter = DocumentExporter::new(
            config.export.clone(),
            pdf,
            Rc::new(BrowserDownload::new(crate::CANVAS_ID)),
        );
        let normalizer = InputNormalizer::new(
            Rc::new(TesseractJsOcr::new(config.widget.ocr_timeout_ms)),
            config.widget.ocr_language.clone(),
        );
        let controller = ChatController::new(
            config.widget.locale,
            event_bus.clone(),
            Rc::new(ProxyClient::new(config.widget.endpoint.clone())),
            normalizer,
            exporter,
        )
        .with_store(store);
        let controller = Rc::new(controller);

        Self::restore_session(controller.clone());

        Self {
            ui_state: UiState::new(config.widget.locale),
            config,
            event_bus,
            controller,
            first_frame: true,
        }
    }

    fn restore_session(controller: Rc<ChatController>) {
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = controller.restore().await {
                log::warn!("Could not restore chat session: {}", e);
            }
        });
    }

    /// Fetch the watermark PNG; until it arrives the text label is used.
    fn load_watermark(url: String, pdf: Rc<PrintPdfBackend>) {
        wasm_bindgen_futures::spawn_local(async move {
            let bytes = match Request::get(&url).send().await {
                Ok(resp) if resp.ok() => resp.binary().await,
                Ok(resp) => {
                    log::warn!("Watermark {} returned HTTP {}", url, resp.status());
                    return;
                }
                Err(e) => Err(e),
            };
            match bytes {
                Ok(png) => {
                    log::info!("Watermark image loaded ({} bytes)", png.len());
                    pdf.set_watermark_image(&png);
                }
                Err(e) => log::warn!("Failed to fetch watermark {}: {}", url, e),
            }
        });
    }

    fn attach_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if self.ui_state.is_busy() {
            return;
        }
        // Only one attachment at a time: the last dropped file wins.
        if let Some(file) = dropped.into_iter().rev().find(|f| f.bytes.is_some()) {
            let mime = if file.mime.is_empty() {
                InputNormalizer::mime_for(&file.name).to_string()
            } else {
                file.mime.clone()
            };
            let bytes = file.bytes.map(|b| b.to_vec()).unwrap_or_default();
            log::info!("Attached {} ({}, {} bytes)", file.name, mime, bytes.len());
            self.controller.attach_file(FileRef::new(file.name, mime, bytes));
        }
    }

    /// Ask the browser for one file and attach it once read.
    fn choose_file(&self, ctx: &egui::Context) {
        let controller = self.controller.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter("Journal", ATTACH_EXTENSIONS)
                .pick_file()
                .await
            else {
                log::debug!("File picker closed without a selection");
                return;
            };
            let name = handle.file_name();
            let bytes = handle.read().await;
            let mime = InputNormalizer::mime_for(&name);
            log::info!("Attached {} ({}, {} bytes)", name, mime, bytes.len());
            controller.attach_file(FileRef::new(name, mime, bytes));
            ctx.request_repaint();
        });
    }

    fn dispatch(&mut self, action: ChatAction, ctx: &egui::Context) {
        match action {
            ChatAction::UpdateInput(text) => self.controller.update_input(text),
            ChatAction::ToggleConsent => {
                self.controller.toggle_consent();
            }
            ChatAction::ChooseFile => self.choose_file(ctx),
            ChatAction::Reset => {
                let controller = self.controller.clone();
                let ctx = ctx.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    controller.reset().await;
                    ctx.request_repaint();
                });
            }
            ChatAction::ClearAttachment => self.controller.clear_attachment(),
            ChatAction::Submit => {
                let controller = self.controller.clone();
                let ctx = ctx.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let outcome = controller.submit().await;
                    log::debug!("Submission finished: {:?}", outcome);
                    ctx.request_repaint();
                });
            }
            ChatAction::SetLocale(locale) => {
                self.controller.set_locale(locale);
                self.ui_state.locale = locale;
                self.config.widget.locale = locale;
            }
            ChatAction::DismissNotice(index) => self.ui_state.dismiss_notice(index),
        }
    }
}

impl eframe::App for JournalApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            self.first_frame = false;
        }

        self.attach_dropped_files(ctx);

        // Drain events from the chat controller
        let events = self.event_bus.drain();
        if !events.is_empty() {
            self.ui_state.process_events(events);
            ctx.request_repaint();
        }

        if self.ui_state.is_busy() {
            ctx.request_repaint();
        }

        let terms_url = self.config.widget.terms_url.clone();
        let actions = CentralPanel::default()
            .show(ctx, |ui| chat_panel(ui, &mut self.ui_state, &terms_url))
            .inner;
        for action in actions {
            self.dispatch(action, ctx);
        }
    }
}

/// Configuration from the page global, falling back to defaults.
fn load_config() -> AppConfig {
    let value = match js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(CONFIG_GLOBAL)) {
        Ok(v) if v.is_object() => v,
        _ => return AppConfig::default(),
    };
    let json: Option<String> = js_sys::JSON::stringify(&value).ok().map(Into::into);
    match json.as_deref().map(serde_json::from_str::<AppConfig>) {
        Some(Ok(config)) => {
            log::info!("Config loaded from window.{}", CONFIG_GLOBAL);
            config
        }
        Some(Err(e)) => {
            log::warn!("Ignoring invalid window.{}: {}", CONFIG_GLOBAL, e);
            AppConfig::default()
        }
        None => AppConfig::default(),
    }
}
