use super::TokenStore;
use crate::types::{SessionStatus, Token};
use std::sync::Arc;
use tokio::sync::Mutex;

enum Slot {
    /// Persistent storage not consulted yet in this process.
    Unloaded,
    Loaded(Option<Token>),
}

struct Inner {
    slot: Slot,
    status: SessionStatus,
}

/// App-wide owner of the access token. Clones share the same slot.
#[derive(Clone)]
pub struct SessionState {
    store: Arc<dyn TokenStore>,
    inner: Arc<Mutex<Inner>>,
}

impl SessionState {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            inner: Arc::new(Mutex::new(Inner {
                slot: Slot::Unloaded,
                status: SessionStatus::Unauthenticated,
            })),
        }
    }

    pub async fn get(&self) -> Option<Token> {
        let mut guard = self.inner.lock().await;
        if let Slot::Loaded(token) = &guard.slot {
            return token.clone();
        }

        // A failed load leaves the slot unloaded so the next call retries.
        let token = match self.store.load() {
            Ok(raw) => raw.as_deref().and_then(Token::parse),
            Err(e) => {
                log::warn!("token store load failed: {e}");
                return None;
            }
        };
        if token.is_some() {
            guard.status = SessionStatus::Authenticated;
        }
        guard.slot = Slot::Loaded(token.clone());
        token
    }

    pub async fn set(&self, token: Token) {
        let mut guard = self.inner.lock().await;
        if let Err(e) = self.store.save(token.as_str()) {
            log::warn!("token store save failed: {e}");
        }
        guard.slot = Slot::Loaded(Some(token));
        guard.status = SessionStatus::Authenticated;
    }

    /// Drops the token and records the resulting status.
    pub(crate) async fn drop_token(&self, status: SessionStatus) {
        let mut guard = self.inner.lock().await;
        if let Err(e) = self.store.delete() {
            log::warn!("token store delete failed: {e}");
        }
        guard.slot = Slot::Loaded(None);
        guard.status = status;
    }

    pub async fn clear(&self) {
        self.drop_token(SessionStatus::Unauthenticated).await;
    }

    pub async fn status(&self) -> SessionStatus {
        self.inner.lock().await.status
    }
}
