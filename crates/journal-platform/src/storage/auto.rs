//! Pick a storage backend from configuration.
//!
//! `Auto` uses sessionStorage so a conversation lasts as long as the tab,
//! and falls back to memory. localStorage is only used when configured.

use std::rc::Rc;
use journal_core::ports::StoragePort;
use journal_types::config::StorageBackendType;
use journal_types::Result;
use super::{MemoryStorage, WebStorage};

pub fn auto_detect_storage(backend: &StorageBackendType) -> Rc<dyn StoragePort> {
    match backend {
        StorageBackendType::Memory => {
            log::info!("Storage backend: memory (configured)");
            Rc::new(MemoryStorage::new())
        }
        StorageBackendType::SessionStorage | StorageBackendType::Auto => {
            or_memory(WebStorage::session())
        }
        StorageBackendType::LocalStorage => or_memory(WebStorage::local()),
    }
}

fn or_memory(opened: Result<WebStorage>) -> Rc<dyn StoragePort> {
    match opened {
        Ok(storage) => {
            log::info!("Storage backend: {}", storage.backend_name());
            Rc::new(storage)
        }
        Err(e) => {
            log::warn!("{}, falling back to memory", e);
            Rc::new(MemoryStorage::new())
        }
    }
}
