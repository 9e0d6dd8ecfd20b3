use shareticon::http::{HttpRequest, ReqwestTransport, SessionCookies};
use shareticon::state::{MemoryTokenStore, SessionState, TokenStore};
use shareticon::{ClientConfig, ErrorKind, SessionClient, Token};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves the canned responses in order, one per connection, and records
/// each request head (lowercased).
async fn spawn_server(responses: Vec<String>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_server = seen.clone();

    tokio::spawn(async move {
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            seen_by_server
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(&head).to_ascii_lowercase());
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    (format!("http://{addr}/api"), seen)
}

fn response(status_line: &str, extra_headers: &[&str]) -> String {
    let mut out = format!("HTTP/1.1 {status_line}\r\n");
    for header in extra_headers {
        out.push_str(header);
        out.push_str("\r\n");
    }
    out.push_str("content-length: 0\r\nconnection: close\r\n\r\n");
    out
}

/// Advertises more body than it sends, so the body read fails mid-stream.
fn truncated(status_line: &str) -> String {
    format!("HTTP/1.1 {status_line}\r\ncontent-length: 100\r\nconnection: close\r\n\r\nabc")
}

/// Client whose token and refresh cookies live in the given stores, the way
/// two runs of the binary share the keychain.
fn persistent_client(
    base_url: &str,
    token_store: &MemoryTokenStore,
    cookie_store: &MemoryTokenStore,
) -> SessionClient {
    let config = ClientConfig::default().with_base_url(base_url);
    let cookies = Arc::new(SessionCookies::persistent(Arc::new(cookie_store.clone())));
    let transport = ReqwestTransport::with_cookies(Duration::from_secs(5), cookies).unwrap();
    let state = SessionState::new(Arc::new(token_store.clone()));
    SessionClient::new(config, state, Arc::new(transport))
}

fn client(base_url: &str) -> SessionClient {
    let config = ClientConfig::default().with_base_url(base_url);
    let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
    let state = SessionState::new(Arc::new(MemoryTokenStore::new()));
    SessionClient::new(config, state, Arc::new(transport))
}

#[tokio::test]
async fn unauthenticated_request_omits_header_and_maps_401() {
    let (base, seen) = spawn_server(vec![response("401 Unauthorized", &[])]).await;
    let session = client(&base);

    let err = session
        .request(HttpRequest::get(session.url("/profile")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthExpired);
    assert!(session.get_token().await.is_none());

    let seen = seen.lock().unwrap();
    assert!(seen[0].starts_with("get /api/profile "));
    assert!(!seen[0].contains("authorization:"));
}

#[tokio::test]
async fn refresh_cookie_survives_clear_and_drives_reissue() {
    let (base, seen) = spawn_server(vec![
        response(
            "200 OK",
            &[
                "set-cookie: refresh=r1; Path=/; HttpOnly",
                "set-cookie: theme=dark; Path=/",
            ],
        ),
        response("200 OK", &["authorization: Bearer xyz"]),
    ])
    .await;
    let session = client(&base);
    session.set_token(Token::parse("abc").unwrap()).await;

    session
        .request(HttpRequest::get(session.url("/group")))
        .await
        .unwrap();
    session.clear_token().await;

    let token = session.reissue().await.unwrap();
    assert_eq!(token.as_str(), "xyz");
    assert_eq!(session.get_token().await.unwrap().as_str(), "xyz");

    let seen = seen.lock().unwrap();
    assert!(seen[0].contains("authorization: bearer abc"));
    assert!(seen[1].starts_with("get /api/reissue "));
    assert!(seen[1].contains("cookie: refresh=r1"));
    assert!(!seen[1].contains("theme=dark"));
    assert!(!seen[1].contains("authorization:"));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let session = client(&format!("http://{addr}/api"));
    session.set_token(Token::parse("abc").unwrap()).await;

    let err = session.reissue().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(session.get_token().await.unwrap().as_str(), "abc");
}

#[tokio::test]
async fn rejection_with_cut_short_body_still_expires_the_session() {
    let (base, _) = spawn_server(vec![truncated("401 Unauthorized")]).await;
    let session = client(&base);
    session.set_token(Token::parse("abc").unwrap()).await;

    let err = session
        .request(HttpRequest::get(session.url("/profile")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthExpired);
    assert!(session.get_token().await.is_none());
}

#[tokio::test]
async fn cut_short_success_body_is_a_protocol_error() {
    let (base, _) = spawn_server(vec![truncated("200 OK")]).await;
    let session = client(&base);
    session.set_token(Token::parse("abc").unwrap()).await;

    let err = session
        .request(HttpRequest::get(session.url("/group")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(session.get_token().await.unwrap().as_str(), "abc");
}

#[tokio::test]
async fn refresh_cookie_carries_over_to_a_later_client() {
    let (base, seen) = spawn_server(vec![
        response(
            "200 OK",
            &["set-cookie: refresh=r1; Path=/; HttpOnly", "set-cookie: theme=dark; Path=/"],
        ),
        response("200 OK", &["authorization: Bearer xyz"]),
    ])
    .await;
    let token_store = MemoryTokenStore::new();
    let cookie_store = MemoryTokenStore::new();

    let first = persistent_client(&base, &token_store, &cookie_store);
    first.login("abc").await.unwrap();
    first
        .request(HttpRequest::get(first.url("/group")))
        .await
        .unwrap();
    drop(first);

    let second = persistent_client(&base, &token_store, &cookie_store);
    assert_eq!(second.get_token().await.unwrap().as_str(), "abc");
    let token = second.reissue().await.unwrap();
    assert_eq!(token.as_str(), "xyz");
    assert_eq!(token_store.load().unwrap().as_deref(), Some("xyz"));

    let seen = seen.lock().unwrap();
    assert!(seen[1].starts_with("get /api/reissue "));
    assert!(seen[1].contains("cookie: refresh=r1"));
    assert!(!seen[1].contains("theme=dark"));
}
