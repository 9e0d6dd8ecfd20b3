mod groups;
mod profile;
mod vouchers;

pub use vouchers::NewVoucher;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::redact::redact_secrets;
use crate::session::SessionClient;
use serde::de::DeserializeOwned;
use serde_json::Value;

const MAX_ERROR_MESSAGE_CHARS: usize = 300;

/// Prefers the backend's `message` field, falls back to the raw body.
fn error_message(res: &HttpResponse) -> String {
    let text = res.text();
    let from_json = serde_json::from_str::<Value>(&text).ok().and_then(|v| {
        v.get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    });
    let message = from_json.unwrap_or_else(|| text.trim().to_string());
    let message = if message.is_empty() {
        res.status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
    };
    redact_secrets(&message).into_owned()
}

/// Typed endpoints of the gifticon backend. Every call recovers from an
/// expired token at most once.
#[derive(Clone)]
pub struct ApiClient {
    session: SessionClient,
}

impl ApiClient {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        self.session.url(path)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let res = self.session.request_with_reissue(request).await?;
        if !res.status.is_success() {
            let message = error_message(&res);
            log::warn!("API error ({}): {}", res.status.as_u16(), message);
            return Err(ApiError::Status {
                status: res.status.as_u16(),
                message,
            });
        }
        Ok(res)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ApiError> {
        let res = self.send(request).await?;
        Ok(res.json()?)
    }
}
