use super::CookieScope;
use crate::state::TokenStore;
use cookie::Cookie;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredCookie {
    name: String,
    value: String,
    domain: String,
    host_only: bool,
    path: String,
    secure: bool,
    http_only: bool,
    /// Unix seconds; `None` lives as long as the jar.
    expires_at: Option<i64>,
}

impl StoredCookie {
    fn same_slot(&self, name: &str, domain: &str, path: &str) -> bool {
        self.name == name && self.domain == domain && self.path == path
    }

    fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn matches(&self, url: &Url, now: i64) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let host_ok = if self.host_only {
            host == self.domain
        } else {
            domain_match(&host, &self.domain)
        };
        host_ok
            && path_match(url.path(), &self.path)
            && (!self.secure || url.scheme() == "https")
            && !self.is_expired(now)
    }
}

fn domain_match(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn path_match(request_path: &str, cookie_path: &str) -> bool {
    request_path == cookie_path
        || (request_path.starts_with(cookie_path)
            && (cookie_path.ends_with('/')
                || request_path[cookie_path.len()..].starts_with('/')))
}

/// Directory of the request path, used when `Path` is absent.
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => path[..i].to_string(),
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

enum ParsedCookie {
    Set(StoredCookie),
    Remove {
        name: String,
        domain: String,
        path: String,
    },
}

fn parse_set_cookie(header: &str, url: &Url, now: i64) -> Option<ParsedCookie> {
    let cookie = Cookie::parse(header).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();

    let declared = cookie
        .domain()
        .map(|d| d.trim_start_matches('.').to_ascii_lowercase())
        .filter(|d| !d.is_empty());
    let (domain, host_only) = match declared {
        Some(domain) if domain_match(&host, &domain) => (domain, false),
        Some(domain) => {
            log::debug!("ignoring cookie {} for foreign domain {domain}", cookie.name());
            return None;
        }
        None => (host, true),
    };
    let path = match cookie.path() {
        Some(p) if p.starts_with('/') => p.to_string(),
        _ => default_path(url),
    };

    // Max-Age wins over Expires.
    let expires_at = match cookie.max_age() {
        Some(age) => Some(now.saturating_add(age.whole_seconds())),
        None => cookie.expires_datetime().map(|at| at.unix_timestamp()),
    };

    let stored = StoredCookie {
        name: cookie.name().to_string(),
        value: cookie.value().to_string(),
        domain,
        host_only,
        path,
        secure: cookie.secure().unwrap_or(false),
        http_only: cookie.http_only().unwrap_or(false),
        expires_at,
    };
    if stored.is_expired(now) {
        Some(ParsedCookie::Remove {
            name: stored.name,
            domain: stored.domain,
            path: stored.path,
        })
    } else {
        Some(ParsedCookie::Set(stored))
    }
}

/// Cookie jar that remembers the `HttpOnly` flag so visible cookies can be
/// dropped without losing the refresh credential.
///
/// A persistent jar mirrors its `HttpOnly` cookies into a [`TokenStore`] so
/// the refresh credential outlives the process, like the access token does.
#[derive(Default)]
pub struct SessionCookies {
    cookies: RwLock<Vec<StoredCookie>>,
    store: Option<Arc<dyn TokenStore>>,
}

impl SessionCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn persistent(store: Arc<dyn TokenStore>) -> Self {
        let now = now();
        let mut restored = match store.load() {
            Ok(Some(raw)) => serde_json::from_str::<Vec<StoredCookie>>(&raw).unwrap_or_else(|e| {
                log::warn!("discarding unreadable saved cookies: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("saved cookies unavailable: {e}");
                Vec::new()
            }
        };
        restored.retain(|c| c.http_only && !c.is_expired(now));
        log::debug!("restored {} saved cookie(s)", restored.len());

        Self {
            cookies: RwLock::new(restored),
            store: Some(store),
        }
    }

    fn persist(&self, cookies: &[StoredCookie]) {
        let Some(store) = &self.store else {
            return;
        };
        let kept: Vec<&StoredCookie> = cookies.iter().filter(|c| c.http_only).collect();
        let result = if kept.is_empty() {
            store.delete()
        } else {
            match serde_json::to_string(&kept) {
                Ok(raw) => store.save(&raw),
                Err(e) => {
                    log::warn!("could not encode cookies: {e}");
                    return;
                }
            }
        };
        if let Err(e) = result {
            log::warn!("saving cookies failed: {e}");
        }
    }

    fn store_set_cookies<'a>(&self, headers: impl Iterator<Item = &'a str>, url: &Url, now: i64) {
        let Ok(mut guard) = self.cookies.write() else {
            return;
        };
        let mut http_only_changed = false;
        for header in headers {
            match parse_set_cookie(header, url, now) {
                Some(ParsedCookie::Set(cookie)) => {
                    guard.retain(|c| {
                        let replaced = c.same_slot(&cookie.name, &cookie.domain, &cookie.path);
                        http_only_changed |= replaced && c.http_only;
                        !replaced
                    });
                    http_only_changed |= cookie.http_only;
                    guard.push(cookie);
                }
                Some(ParsedCookie::Remove { name, domain, path }) => {
                    guard.retain(|c| {
                        let removed = c.same_slot(&name, &domain, &path);
                        http_only_changed |= removed && c.http_only;
                        !removed
                    });
                }
                None => {}
            }
        }
        if http_only_changed {
            self.persist(&guard);
        }
    }

    fn header_at(&self, url: &Url, now: i64) -> Option<String> {
        let guard = self.cookies.read().ok()?;
        let pairs: Vec<String> = guard
            .iter()
            .filter(|c| c.matches(url, now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    /// The `Cookie` header this jar would send to `url`.
    pub fn header_for(&self, url: &Url) -> Option<String> {
        self.header_at(url, now())
    }

    pub fn clear(&self, scope: CookieScope) {
        let Ok(mut guard) = self.cookies.write() else {
            return;
        };
        match scope {
            CookieScope::Visible => guard.retain(|c| c.http_only),
            CookieScope::All => {
                guard.clear();
                self.persist(&guard);
            }
        }
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers = cookie_headers.filter_map(|h| h.to_str().ok());
        self.store_set_cookies(headers, url, now());
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.header_for(url)?).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryTokenStore;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    fn set(jar: &SessionCookies, header: &str, from: &str) {
        jar.store_set_cookies(std::iter::once(header), &url(from), now());
    }

    const API: &str = "https://api.shareticon.site/api/group";
    const REISSUE: &str = "https://api.shareticon.site/api/reissue";

    #[test]
    fn clear_visible_keeps_http_only_refresh_cookie() {
        let jar = SessionCookies::new();
        set(&jar, "refresh=r1; Path=/; HttpOnly; Secure", API);
        set(&jar, "JSESSIONID=s1; Path=/", API);
        assert_eq!(
            jar.header_for(&url(REISSUE)).as_deref(),
            Some("refresh=r1; JSESSIONID=s1")
        );

        jar.clear(CookieScope::Visible);
        assert_eq!(jar.header_for(&url(REISSUE)).as_deref(), Some("refresh=r1"));

        jar.clear(CookieScope::All);
        assert_eq!(jar.header_for(&url(REISSUE)), None);
    }

    #[test]
    fn newer_cookie_replaces_and_max_age_zero_removes() {
        let jar = SessionCookies::new();
        set(&jar, "refresh=r1; Path=/; HttpOnly", API);
        set(&jar, "refresh=r2; Path=/; HttpOnly", API);
        assert_eq!(jar.header_for(&url(REISSUE)).as_deref(), Some("refresh=r2"));

        set(&jar, "refresh=; Path=/; Max-Age=0", API);
        assert_eq!(jar.header_for(&url(REISSUE)), None);
    }

    #[test]
    fn past_expires_removes_the_cookie() {
        let jar = SessionCookies::new();
        set(&jar, "refresh=r1; Path=/; HttpOnly", API);
        set(
            &jar,
            "refresh=deleted; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            API,
        );
        assert_eq!(jar.header_for(&url(REISSUE)), None);
    }

    #[test]
    fn max_age_in_the_future_lapses_later() {
        let jar = SessionCookies::new();
        let start = now();
        jar.store_set_cookies(
            std::iter::once("refresh=r1; Path=/; Max-Age=60; HttpOnly"),
            &url(API),
            start,
        );
        assert!(jar.header_at(&url(REISSUE), start + 59).is_some());
        assert_eq!(jar.header_at(&url(REISSUE), start + 60), None);
    }

    #[test]
    fn secure_cookie_is_not_sent_over_plain_http() {
        let jar = SessionCookies::new();
        set(&jar, "refresh=r1; Path=/; Secure; HttpOnly", API);
        assert_eq!(
            jar.header_for(&url("http://api.shareticon.site/api/reissue")),
            None
        );
        assert_eq!(jar.header_for(&url(REISSUE)).as_deref(), Some("refresh=r1"));
    }

    #[test]
    fn host_only_cookie_stays_on_its_host() {
        let jar = SessionCookies::new();
        set(&jar, "refresh=r1; Path=/; HttpOnly", API);
        assert_eq!(
            jar.header_for(&url("https://www.api.shareticon.site/api/reissue")),
            None
        );
    }

    #[test]
    fn domain_attribute_covers_subdomains() {
        let jar = SessionCookies::new();
        set(&jar, "refresh=r1; Domain=.shareticon.site; Path=/; HttpOnly", API);
        assert_eq!(
            jar.header_for(&url("https://www.shareticon.site/")).as_deref(),
            Some("refresh=r1")
        );
        assert_eq!(jar.header_for(&url("https://example.com/")), None);
        assert_eq!(jar.header_for(&url("https://notshareticon.site/")), None);
    }

    #[test]
    fn foreign_domain_is_rejected() {
        let jar = SessionCookies::new();
        set(&jar, "refresh=r1; Domain=example.com; Path=/", API);
        assert_eq!(jar.header_for(&url("https://example.com/")), None);
    }

    #[test]
    fn path_defaults_to_request_directory() {
        let jar = SessionCookies::new();
        set(&jar, "refresh=r1; HttpOnly", API);
        assert_eq!(jar.header_for(&url(REISSUE)).as_deref(), Some("refresh=r1"));
        assert_eq!(jar.header_for(&url("https://api.shareticon.site/other")), None);
        assert_eq!(jar.header_for(&url("https://api.shareticon.site/apix")), None);
    }

    #[test]
    fn persistent_jar_restores_only_http_only_cookies() {
        let store = MemoryTokenStore::new();
        let first = SessionCookies::persistent(Arc::new(store.clone()));
        set(&first, "refresh=r1; Path=/; HttpOnly", API);
        set(&first, "theme=dark; Path=/", API);

        let second = SessionCookies::persistent(Arc::new(store.clone()));
        assert_eq!(second.header_for(&url(REISSUE)).as_deref(), Some("refresh=r1"));

        second.clear(CookieScope::All);
        assert_eq!(store.load().unwrap(), None);
        let third = SessionCookies::persistent(Arc::new(store));
        assert_eq!(third.header_for(&url(REISSUE)), None);
    }

    #[test]
    fn unreadable_saved_cookies_start_an_empty_jar() {
        let store = MemoryTokenStore::with_token("not json");
        let jar = SessionCookies::persistent(Arc::new(store));
        assert_eq!(jar.header_for(&url(REISSUE)), None);
    }
}
