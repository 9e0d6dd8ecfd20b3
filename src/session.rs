use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::http::{
    CookieScope, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, SessionCookies,
    TransportError,
};
use crate::redact::token_preview;
use crate::state::{SessionState, SessionStores};
use crate::types::{SessionStatus, Token};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use std::sync::Arc;

const REISSUE_PATH: &str = "/reissue";
const LOGOUT_PATH: &str = "/logout";

fn authorization_header(token: &Token) -> Result<HeaderValue, SessionError> {
    HeaderValue::from_str(&token.authorization_value())
        .map_err(|_| SessionError::Protocol("token is not a valid header value".to_string()))
}

fn map_transport_error(err: TransportError) -> SessionError {
    match err {
        TransportError::Connect(msg) => SessionError::Network(msg),
        err @ TransportError::Body { .. } => SessionError::Protocol(err.to_string()),
        TransportError::InvalidRequest(msg) => SessionError::Protocol(msg),
    }
}

/// Outbound HTTP with bearer attachment and expiry detection.
///
/// `request` never reissues on its own; callers that want transparent
/// recovery use [`SessionClient::request_with_reissue`], which performs at
/// most one reissue and one retry.
#[derive(Clone)]
pub struct SessionClient {
    config: ClientConfig,
    state: SessionState,
    transport: Arc<dyn HttpTransport>,
}

impl SessionClient {
    pub fn new(config: ClientConfig, state: SessionState, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            state,
            transport,
        }
    }

    /// Wires the configured stores: the access token and the `HttpOnly`
    /// refresh cookies both persist across runs.
    pub fn from_config(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let stores = SessionStores::open(config.token_store);
        let cookies = Arc::new(SessionCookies::persistent(stores.cookies));
        let transport = Arc::new(ReqwestTransport::with_cookies(config.http_timeout, cookies)?);
        Ok(Self::new(config, SessionState::new(stores.token), transport))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        self.config.api_url(path)
    }

    pub async fn get_token(&self) -> Option<Token> {
        self.state.get().await
    }

    pub async fn set_token(&self, token: Token) {
        self.state.set(token).await;
    }

    pub async fn clear_token(&self) {
        self.state.clear().await;
        self.transport.clear_cookies(CookieScope::Visible);
    }

    async fn expire(&self) {
        self.state.drop_token(SessionStatus::Expired).await;
        self.transport.clear_cookies(CookieScope::Visible);
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.status().await
    }

    /// Accepts the token handed over by the OAuth callback.
    pub async fn login(&self, raw_token: &str) -> Result<Token, SessionError> {
        let token = Token::parse(raw_token)
            .ok_or_else(|| SessionError::Protocol("login callback carried no token".to_string()))?;
        authorization_header(&token)?;
        log::info!("session established ({})", token_preview(token.as_str()));
        self.set_token(token.clone()).await;
        Ok(token)
    }

    pub async fn reissue(&self) -> Result<Token, SessionError> {
        let request = HttpRequest::get(self.url(REISSUE_PATH));
        let res = match self.transport.send(request).await {
            Ok(res) => res,
            Err(e) => {
                log::warn!("reissue unreachable: {e}");
                return Err(map_transport_error(e));
            }
        };

        match res.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                log::info!("reissue rejected ({})", res.status.as_u16());
                self.clear_token().await;
                return Err(SessionError::AuthExpired {
                    status: res.status.as_u16(),
                });
            }
            status if !status.is_success() => {
                log::warn!("reissue failed with status {}", status.as_u16());
                return Err(SessionError::Server {
                    status: status.as_u16(),
                });
            }
            _ => {}
        }

        let token = res
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(Token::parse);
        let Some(token) = token else {
            log::warn!("reissue response carried no credential");
            self.clear_token().await;
            return Err(SessionError::Protocol(
                "missing reissued credential".to_string(),
            ));
        };

        log::info!("token reissued ({})", token_preview(token.as_str()));
        self.set_token(token.clone()).await;
        Ok(token)
    }

    pub async fn request(&self, mut request: HttpRequest) -> Result<HttpResponse, SessionError> {
        let token = self.get_token().await;
        if let Some(token) = &token {
            request
                .headers
                .insert(AUTHORIZATION, authorization_header(token)?);
        }
        log::debug!(
            "{} {} (token: {})",
            request.method,
            request.url,
            token
                .as_ref()
                .map(|t| token_preview(t.as_str()))
                .unwrap_or_else(|| "none".to_string())
        );

        let res = self
            .transport
            .send(request)
            .await
            .map_err(map_transport_error)?;

        if res.status == StatusCode::UNAUTHORIZED {
            log::info!("credential rejected, clearing session");
            self.expire().await;
            return Err(SessionError::AuthExpired { status: 401 });
        }
        Ok(res)
    }

    /// One `request`; on expiry one `reissue` and one retry.
    pub async fn request_with_reissue(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, SessionError> {
        match self.request(request.clone()).await {
            Err(SessionError::AuthExpired { .. }) => {
                self.reissue().await?;
                self.request(request).await
            }
            other => other,
        }
    }

    /// Best effort server logout; local state is always wiped.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let mut request = HttpRequest::post(self.url(LOGOUT_PATH));
        if let Some(token) = self.get_token().await {
            if let Ok(value) = authorization_header(&token) {
                request.headers.insert(AUTHORIZATION, value);
            }
        }

        let outcome = self.transport.send(request).await;

        self.state.clear().await;
        self.transport.clear_cookies(CookieScope::All);

        match outcome {
            Ok(res) => {
                if !res.status.is_success() {
                    log::info!("logout returned {}, cleared locally", res.status.as_u16());
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("logout unreachable, cleared locally: {e}");
                Err(map_transport_error(e))
            }
        }
    }
}
