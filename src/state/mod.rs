mod session_state;
mod token_store;

pub use session_state::SessionState;
pub use token_store::{
    KeyringTokenStore, MemoryTokenStore, SessionStores, StoreError, TokenStore,
    KEYRING_USER_ACCESS_TOKEN, KEYRING_USER_REFRESH_COOKIES,
};
