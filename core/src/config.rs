//! Client configuration.
//!
//! # Design
//! A `ClientConfig` is built once and never mutated; every `ApiClient` holds
//! its own copy, so clients pointed at different base URLs coexist. Reading
//! the process environment lives in [`ClientConfig::from_env`], a thin
//! adapter over [`ClientConfig::from_lookup`] that tests drive with a closure.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{ApiError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub const BASE_URL_VAR: &str = "API_BASE_URL";
pub const TIMEOUT_VAR: &str = "API_TIMEOUT_MS";
pub const ENVIRONMENT_VAR: &str = "APP_ENV";

/// Deployment environment. Request/response debug logging is emitted
/// everywhere except production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    /// Unknown names fall back to development.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    base_url: String,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
    environment: Environment,
}

impl ClientConfig {
    /// Trailing slashes are stripped from `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ApiError::configuration("base URL must not be empty"));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::configuration(format!(
                "base URL `{base_url}` must start with http:// or https://"
            )));
        }
        Ok(Self {
            base_url: base_url.to_string(),
            timeout: DEFAULT_TIMEOUT,
            default_headers: vec![("accept".to_string(), "application/json".to_string())],
            environment: Environment::default(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Add or replace a default header (names compare case-insensitively).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.default_headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.default_headers.push((name, value.into()));
        self
    }

    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with_header("authorization", format!("Bearer {token}"))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Load from `API_BASE_URL`, `API_TIMEOUT_MS` and `APP_ENV`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_VAR)
            .ok_or_else(|| ApiError::configuration(format!("{BASE_URL_VAR} is not set")))?;
        let mut config = Self::new(&base_url)?;

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                ApiError::configuration(format!("{TIMEOUT_VAR} must be an integer, got `{raw}`"))
            })?;
            config = config.with_timeout(Duration::from_millis(millis));
        }

        if let Some(Ok(environment)) = lookup(ENVIRONMENT_VAR).map(|raw| raw.parse::<Environment>()) {
            config = config.with_environment(environment);
        }

        Ok(config)
    }
}
