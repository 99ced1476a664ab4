//! Web Storage backends: sessionStorage and localStorage.
//!
//! sessionStorage lives as long as the tab, localStorage until the user
//! clears it. Values must be UTF-8 since the browser stores strings; keys
//! are namespaced so several widgets can share an origin.

use async_trait::async_trait;
use web_sys::Storage;

use journal_core::ports::StoragePort;
use journal_types::{JournalError, Result};

const KEY_PREFIX: &str = "journalkollen:";

pub struct WebStorage {
    storage: Storage,
    name: &'static str,
}

fn storage_err(e: wasm_bindgen::JsValue) -> JournalError {
    JournalError::Storage(format!("{:?}", e))
}

/// No `window` outside a page (Node, workers).
fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| JournalError::Storage("no window".to_string()))
}

impl WebStorage {
    /// Tab-scoped storage, cleared when the tab closes.
    pub fn session() -> Result<Self> {
        let storage = window()?.session_storage().map_err(storage_err)?;
        Self::wrap(storage, "sessionStorage")
    }

    /// Origin-scoped storage that survives reloads and restarts.
    pub fn local() -> Result<Self> {
        let storage = window()?.local_storage().map_err(storage_err)?;
        Self::wrap(storage, "localStorage")
    }

    fn wrap(storage: Option<Storage>, name: &'static str) -> Result<Self> {
        let storage = storage
            .ok_or_else(|| JournalError::Storage(format!("{} not available", name)))?;
        Ok(Self { storage, name })
    }

    fn full_key(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }
}

#[async_trait(?Send)]
impl StoragePort for WebStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .storage
            .get_item(&Self::full_key(key))
            .map_err(storage_err)?;
        Ok(value.map(String::into_bytes))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(value)
            .map_err(|e| JournalError::Storage(format!("value for {} is not UTF-8: {}", key, e)))?;
        self.storage
            .set_item(&Self::full_key(key), text)
            .map_err(storage_err)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.storage
            .remove_item(&Self::full_key(key))
            .map_err(storage_err)
    }

    fn backend_name(&self) -> &str {
        self.name
    }
}
