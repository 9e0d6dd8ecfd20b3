use std::env;
use std::time::Duration;
use thiserror::Error;

pub const PRODUCTION_BASE_URL: &str = "https://api.shareticon.site/api";
pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:3000/api";

const ENV_API_BASE_URL: &str = "SHARETICON_API_BASE_URL";
const ENV_ENVIRONMENT: &str = "SHARETICON_ENV";
const ENV_TOKEN_STORE: &str = "SHARETICON_TOKEN_STORE";
const ENV_HTTP_TIMEOUT_SECS: &str = "SHARETICON_HTTP_TIMEOUT_SECS";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("development") | Some("dev") | Some("local") => Self::Development,
            _ => Self::Production,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Development => DEVELOPMENT_BASE_URL,
            Self::Production => PRODUCTION_BASE_URL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStoreKind {
    Keyring,
    Memory,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,
    pub base_url: String,
    pub token_store: TokenStoreKind,
    pub http_timeout: Duration,
}

impl ClientConfig {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            base_url: environment.default_base_url().to_string(),
            token_store: TokenStoreKind::Keyring,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::parse(env::var(ENV_ENVIRONMENT).ok().as_deref());
        let mut config = Self::new(environment);

        if let Some(url) = non_empty_var(ENV_API_BASE_URL) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    var: ENV_API_BASE_URL.to_string(),
                    message: "expected an absolute http(s) URL".to_string(),
                });
            }
            config.base_url = normalize_base_url(&url);
        }

        config.token_store = match non_empty_var(ENV_TOKEN_STORE).as_deref() {
            None | Some("keyring") => TokenStoreKind::Keyring,
            Some("memory") => TokenStoreKind::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: ENV_TOKEN_STORE.to_string(),
                    message: format!("unknown store '{other}'"),
                })
            }
        };

        if let Some(secs) = non_empty_var(ENV_HTTP_TIMEOUT_SECS) {
            let secs = secs.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                var: ENV_HTTP_TIMEOUT_SECS.to_string(),
                message: e.to_string(),
            })?;
            config.http_timeout = Duration::from_secs(secs.max(1));
        }

        Ok(config)
    }

    /// Joins base and path with exactly one slash.
    pub fn api_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Environment::Production)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
