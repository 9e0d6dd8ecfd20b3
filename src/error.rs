use thiserror::Error;

/// Category tag callers branch on. Assigned where the failure originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AuthExpired,
    Network,
    Protocol,
    Server,
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// The server answered and rejected the credential.
    #[error("authentication expired ({status})")]
    AuthExpired { status: u16 },
    /// No response exists: the request never reached the server.
    #[error("network error: {0}")]
    Network(String),
    /// A well-formed response broke the expected contract.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The server answered but could not serve the call (5xx and the like).
    #[error("server error ({status})")]
    Server { status: u16 },
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthExpired { .. } => ErrorKind::AuthExpired,
            Self::Network(_) => ErrorKind::Network,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Server { .. } => ErrorKind::Server,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Session(e) => Some(e.kind()),
            _ => None,
        }
    }
}
