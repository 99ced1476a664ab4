//! WASM-target tests for journal-platform (Node.js runtime).
//!
//! Covers MemoryStorage, StorageSessionStore and the download sink's
//! failure path under wasm32-unknown-unknown via `wasm-pack test --node`.
//! Web Storage, Tesseract.js and real downloads need a browser page and
//! are not run here.

use wasm_bindgen_test::*;

use journal_core::ports::{DocumentSink, SessionStore, StoragePort};
use journal_platform::download::{BrowserDownload, REVOKE_DELAY_MS};
use journal_platform::session_store::StorageSessionStore;
use journal_platform::storage::{auto_detect_storage, MemoryStorage};
use journal_types::config::StorageBackendType;
use journal_types::session::ChatSession;
use std::rc::Rc;

#[wasm_bindgen_test]
fn memory_storage_backend_name() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.backend_name(), "memory");
}

#[wasm_bindgen_test]
async fn memory_storage_set_and_get() {
    let storage = MemoryStorage::new();
    storage.set("key1", b"value1").await.unwrap();
    assert_eq!(storage.get("key1").await.unwrap(), Some(b"value1".to_vec()));
}

#[wasm_bindgen_test]
async fn memory_storage_delete_nonexistent() {
    let storage = MemoryStorage::new();
    storage.delete("nonexistent").await.unwrap();
}

#[wasm_bindgen_test]
async fn session_store_roundtrip() {
    let store = StorageSessionStore::new(Rc::new(MemoryStorage::new()));
    let session = ChatSession::new("hej");
    store.save(&session).await.unwrap();

    let loaded = store.load().await.unwrap().expect("stored session");
    assert_eq!(loaded.id, session.id);
    assert_eq!(loaded.messages.len(), 1);
}

#[wasm_bindgen_test]
fn auto_storage_without_window_is_memory() {
    // Node has no sessionStorage; nothing is persisted beyond the process.
    let storage = auto_detect_storage(&StorageBackendType::Auto);
    assert_eq!(storage.backend_name(), "memory");
}

#[wasm_bindgen_test]
fn download_without_document_is_an_error() {
    let sink = BrowserDownload::new("journalkollen");
    assert!(!sink.is_mounted());
    assert!(sink.save("svar.pdf", "application/pdf", b"%PDF-1.3").is_err());
}

#[wasm_bindgen_test]
fn download_url_outlives_the_click() {
    assert!(REVOKE_DELAY_MS >= 1_000);
}
