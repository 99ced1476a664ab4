//! Browser download sink: wraps the bytes in a Blob and clicks a temporary
//! `<a download>` pointing at its object URL.

use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use js_sys::{Array, Uint8Array};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use journal_core::ports::DocumentSink;
use journal_types::{JournalError, Result};

/// Object URLs outlive the click by this much so the browser can start
/// reading the blob.
pub const REVOKE_DELAY_MS: u32 = 60_000;

pub struct BrowserDownload {
    /// Element that must be present before anything is exported
    mount_id: String,
}

fn interop(e: wasm_bindgen::JsValue) -> JournalError {
    JournalError::JsInterop(format!("{:?}", e))
}

impl BrowserDownload {
    pub fn new(mount_id: impl Into<String>) -> Self {
        Self {
            mount_id: mount_id.into(),
        }
    }
}

impl DocumentSink for BrowserDownload {
    fn is_mounted(&self) -> bool {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(&self.mount_id))
            .is_some()
    }

    fn save(&self, file_name: &str, content_type: &str, bytes: &[u8]) -> Result<()> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JournalError::JsInterop("no document to download from".to_string()))?;
        let body = document
            .body()
            .ok_or_else(|| JournalError::JsInterop("document has no body".to_string()))?;

        let parts = Array::of1(&Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type(content_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(interop)?;
        let url = Url::create_object_url_with_blob(&blob).map_err(interop)?;

        let anchor: HtmlAnchorElement = document
            .create_element("a")
            .map_err(interop)?
            .dyn_into()
            .map_err(|_| JournalError::JsInterop("created element is not an anchor".to_string()))?;
        anchor.set_href(&url);
        anchor.set_download(file_name);
        // Some browsers ignore clicks on detached anchors.
        body.append_child(&anchor).map_err(interop)?;
        anchor.click();
        anchor.remove();

        Timeout::new(REVOKE_DELAY_MS, move || {
            if let Err(e) = Url::revoke_object_url(&url) {
                log::debug!("Object URL already gone: {:?}", e);
            }
        })
        .forget();
        log::debug!("Download triggered for {} ({} bytes)", file_name, bytes.len());
        Ok(())
    }
}
