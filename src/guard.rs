use crate::error::{ErrorKind, SessionError};
use crate::session::SessionClient;
use crate::types::Token;

pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// What a protected screen does when the session cannot be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailurePolicy {
    /// Navigate to the login entry point without showing anything.
    Redirect,
    /// Stay on the screen and show an "auth required" interstitial.
    Interstitial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Authenticated(Token),
    Redirect { to: String },
    AuthRequired,
    /// Retry surface; never the login prompt.
    ServerUnreachable,
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    policy: AuthFailurePolicy,
    login_path: String,
}

impl RouteGuard {
    pub fn new(policy: AuthFailurePolicy) -> Self {
        Self {
            policy,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn policy(&self) -> AuthFailurePolicy {
        self.policy
    }

    pub(crate) fn outcome_for_error(&self, err: &SessionError) -> GuardOutcome {
        match err.kind() {
            ErrorKind::Network | ErrorKind::Server => GuardOutcome::ServerUnreachable,
            ErrorKind::AuthExpired | ErrorKind::Protocol => match self.policy {
                AuthFailurePolicy::Redirect => GuardOutcome::Redirect {
                    to: self.login_path.clone(),
                },
                AuthFailurePolicy::Interstitial => GuardOutcome::AuthRequired,
            },
        }
    }

    /// A held token is trusted as-is; otherwise one reissue attempt decides.
    pub async fn check(&self, client: &SessionClient) -> GuardOutcome {
        if let Some(token) = client.get_token().await {
            return GuardOutcome::Authenticated(token);
        }

        match client.reissue().await {
            Ok(token) => GuardOutcome::Authenticated(token),
            Err(e) => {
                log::info!("route guard: {e}");
                self.outcome_for_error(&e)
            }
        }
    }
}
