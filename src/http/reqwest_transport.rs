use super::{
    CookieScope, FormPart, HttpRequest, HttpResponse, HttpTransport, RequestBody, SessionCookies,
    TransportError,
};
use crate::redact::redact_secrets;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use std::time::Duration;

pub struct ReqwestTransport {
    http: reqwest::Client,
    cookies: Arc<SessionCookies>,
}

impl ReqwestTransport {
    /// Transport with a cookie jar that lives only as long as the process.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_cookies(timeout, Arc::new(SessionCookies::new()))
    }

    pub fn with_cookies(
        timeout: Duration,
        cookies: Arc<SessionCookies>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .cookie_provider(cookies.clone())
            .timeout(timeout)
            .build()?;
        Ok(Self { http, cookies })
    }
}

fn build_form(parts: Vec<FormPart>) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for part in parts {
        let mut p = Part::bytes(part.bytes);
        if let Some(file_name) = part.file_name {
            p = p.file_name(file_name);
        }
        if let Some(content_type) = part.content_type {
            p = p
                .mime_str(&content_type)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        }
        form = form.part(part.name, p);
    }
    Ok(form)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {e}", request.url)))?;

        let mut builder = self.http.request(request.method, url).headers(request.headers);
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder.body(bytes),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        let res = builder
            .send()
            .await
            .map_err(|e| TransportError::Connect(redact_secrets(&e.to_string()).into_owned()))?;

        let status = res.status();
        let headers = res.headers().clone();
        // Once a status line has arrived the failure is no longer a
        // connectivity problem. Error statuses stay usable without a body.
        let body = match res.bytes().await {
            Ok(body) => body.to_vec(),
            Err(e) if !status.is_success() => {
                log::debug!(
                    "{} body unreadable: {}",
                    status.as_u16(),
                    redact_secrets(&e.to_string())
                );
                Vec::new()
            }
            Err(e) => {
                return Err(TransportError::Body {
                    status: status.as_u16(),
                    message: redact_secrets(&e.to_string()).into_owned(),
                })
            }
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn clear_cookies(&self, scope: CookieScope) {
        self.cookies.clear(scope);
    }
}
