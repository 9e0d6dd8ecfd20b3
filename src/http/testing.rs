use super::{CookieScope, HttpRequest, HttpResponse, HttpTransport, TransportError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Mutex;

pub(crate) enum Scripted {
    Respond(HttpResponse),
    Fail,
    Truncated(u16),
}

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    queue: Mutex<VecDeque<Scripted>>,
    seen: Mutex<Vec<HttpRequest>>,
    cookie_clears: Mutex<Vec<CookieScope>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, status: u16, headers: &[(&str, &str)], body: &str) {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        self.queue.lock().unwrap().push_back(Scripted::Respond(HttpResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: map,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub(crate) fn fail(&self) {
        self.queue.lock().unwrap().push_back(Scripted::Fail);
    }

    pub(crate) fn truncate(&self, status: u16) {
        self.queue.lock().unwrap().push_back(Scripted::Truncated(status));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn cookie_clears(&self) -> Vec<CookieScope> {
        self.cookie_clears.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request);
        match self.queue.lock().unwrap().pop_front() {
            Some(Scripted::Respond(res)) => Ok(res),
            Some(Scripted::Fail) => Err(TransportError::Connect("connection refused".to_string())),
            Some(Scripted::Truncated(status)) => Err(TransportError::Body {
                status,
                message: "connection closed before message completed".to_string(),
            }),
            None => panic!("no scripted response left"),
        }
    }

    fn clear_cookies(&self, scope: CookieScope) {
        self.cookie_clears.lock().unwrap().push(scope);
    }
}
