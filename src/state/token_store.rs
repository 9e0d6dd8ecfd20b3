use crate::config::TokenStoreKind;
use std::sync::{Arc, Mutex};
use thiserror::Error;

const KEYRING_SERVICE: &str = "site.shareticon.client";
pub const KEYRING_USER_ACCESS_TOKEN: &str = "access_token";
pub const KEYRING_USER_REFRESH_COOKIES: &str = "refresh_cookies";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("token storage unavailable: {0}")]
    Unavailable(String),
}

/// One persisted secret string: the access token, or the saved refresh
/// cookies.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&self, token: &str) -> Result<(), StoreError>;
    /// Removing a missing entry is not an error.
    fn delete(&self) -> Result<(), StoreError>;

    /// Whether the backend answers at all; an empty slot still counts.
    fn is_available(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    user: &'static str,
}

impl KeyringTokenStore {
    pub fn new(user: &'static str) -> Self {
        Self { user }
    }

    fn entry(&self) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(KEYRING_SERVICE, self.user)
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new(KEYRING_USER_ACCESS_TOKEN)
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match self.entry()?.get_password() {
            Ok(pwd) => {
                let trimmed = pwd.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::NoStorageAccess(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(keyring::Error::PlatformFailure(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(_) => Ok(None),
        }
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        self.entry()?
            .set_password(token)
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn delete(&self) -> Result<(), StoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::Unavailable(e.to_string())),
        }
    }

    fn is_available(&self) -> bool {
        match self.entry().map(|entry| entry.get_password()) {
            Ok(Ok(_)) => true,
            Ok(Err(
                keyring::Error::NoEntry
                | keyring::Error::BadEncoding(_)
                | keyring::Error::Ambiguous(_),
            )) => true,
            _ => false,
        }
    }
}

/// Process-local store; shares its slot across clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.to_string()))),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, StoreError> {
        self.slot
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        *self.lock()? = Some(token.to_string());
        Ok(())
    }

    fn delete(&self) -> Result<(), StoreError> {
        *self.lock()? = None;
        Ok(())
    }
}

/// The two secrets a session persists, kept on the same backend.
#[derive(Clone)]
pub struct SessionStores {
    pub token: Arc<dyn TokenStore>,
    pub cookies: Arc<dyn TokenStore>,
}

impl SessionStores {
    pub fn memory() -> Self {
        Self {
            token: Arc::new(MemoryTokenStore::new()),
            cookies: Arc::new(MemoryTokenStore::new()),
        }
    }

    pub fn keyring() -> Self {
        Self {
            token: Arc::new(KeyringTokenStore::default()),
            cookies: Arc::new(KeyringTokenStore::new(KEYRING_USER_REFRESH_COOKIES)),
        }
    }

    /// Keeps these stores when their backend answers, else memory stores.
    pub fn or_memory(self) -> Self {
        if self.token.is_available() {
            self
        } else {
            log::warn!("secure storage unavailable, session will not survive restart");
            Self::memory()
        }
    }

    pub fn open(kind: TokenStoreKind) -> Self {
        match kind {
            TokenStoreKind::Keyring => Self::keyring().or_memory(),
            TokenStoreKind::Memory => Self::memory(),
        }
    }
}
