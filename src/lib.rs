pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod redact;
pub mod session;
pub mod state;
pub mod types;
pub mod vouchers;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, ErrorKind, SessionError};
pub use guard::{AuthFailurePolicy, GuardOutcome, RouteGuard};
pub use session::SessionClient;
pub use types::{SessionStatus, Token};
