//! Chat session persistence on top of any [`StoragePort`].

use std::rc::Rc;
use async_trait::async_trait;

use journal_core::ports::{SessionStore, StoragePort};
use journal_types::{Result, session::ChatSession};

pub const SESSION_KEY: &str = "session:current";

pub struct StorageSessionStore {
    storage: Rc<dyn StoragePort>,
    key: String,
}

impl StorageSessionStore {
    pub fn new(storage: Rc<dyn StoragePort>) -> Self {
        Self::with_key(storage, SESSION_KEY)
    }

    pub fn with_key(storage: Rc<dyn StoragePort>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }
}

#[async_trait(?Send)]
impl SessionStore for StorageSessionStore {
    async fn load(&self) -> Result<Option<ChatSession>> {
        let Some(bytes) = self.storage.get(&self.key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // A stale or foreign value must not block the widget.
                log::warn!("Discarding unreadable session in {}: {}", self.storage.backend_name(), e);
                self.storage.delete(&self.key).await?;
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &ChatSession) -> Result<()> {
        let bytes = serde_json::to_vec(session)?;
        self.storage.set(&self.key, &bytes).await
    }

    async fn clear(&self) -> Result<()> {
        self.storage.delete(&self.key).await
    }
}
