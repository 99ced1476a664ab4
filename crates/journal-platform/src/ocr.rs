//! OCR adapter: bridges to Tesseract.js loaded on the host page.
//!
//! The page includes the Tesseract.js script, which exposes a global
//! `Tesseract` object. `Tesseract.recognize(image, lang)` resolves to
//! `{ data: { text } }`.

use async_trait::async_trait;
use futures::future::{self, Either};
use gloo_timers::future::TimeoutFuture;
use js_sys::{Array, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag};

use journal_core::ports::OcrPort;
use journal_types::{JournalError, Result};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = Tesseract, js_name = recognize, catch)]
    fn tesseract_recognize(image: &JsValue, lang: &str) -> std::result::Result<js_sys::Promise, JsValue>;
}

pub struct TesseractJsOcr {
    timeout_ms: u32,
}

impl TesseractJsOcr {
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }

    /// Whether the Tesseract global is present on the page.
    pub fn is_available() -> bool {
        let global = js_sys::global();
        Reflect::get(&global, &JsValue::from_str("Tesseract"))
            .map(|v| !v.is_undefined() && !v.is_null())
            .unwrap_or(false)
    }
}

fn to_blob(bytes: &[u8], mime: &str) -> Result<Blob> {
    let parts = Array::of1(&Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(mime);
    Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(|e| JournalError::JsInterop(format!("{:?}", e)))
}

fn extract_text(result: &JsValue) -> Result<String> {
    let data = Reflect::get(result, &JsValue::from_str("data"))
        .map_err(|e| JournalError::JsInterop(format!("{:?}", e)))?;
    Reflect::get(&data, &JsValue::from_str("text"))
        .map_err(|e| JournalError::JsInterop(format!("{:?}", e)))?
        .as_string()
        .ok_or_else(|| JournalError::JsInterop("OCR result has no text".to_string()))
}

#[async_trait(?Send)]
impl OcrPort for TesseractJsOcr {
    async fn recognize(&self, image: &[u8], mime: &str, language: &str) -> Result<String> {
        if !Self::is_available() {
            return Err(JournalError::JsInterop("Tesseract.js is not loaded".to_string()));
        }

        let blob = to_blob(image, mime)?;
        let promise = tesseract_recognize(&blob, language)
            .map_err(|e| JournalError::JsInterop(format!("{:?}", e)))?;

        let recognition = JsFuture::from(promise);
        let timeout = TimeoutFuture::new(self.timeout_ms);
        futures::pin_mut!(recognition);

        match future::select(recognition, timeout).await {
            Either::Left((Ok(result), _)) => extract_text(&result),
            Either::Left((Err(e), _)) => Err(JournalError::Normalizer(format!("OCR failed: {:?}", e))),
            Either::Right(_) => Err(JournalError::Normalizer(format!(
                "OCR did not finish within {}ms",
                self.timeout_ms
            ))),
        }
    }

    fn engine_name(&self) -> &str {
        "tesseract.js"
    }
}
