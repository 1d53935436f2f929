//! Client configuration and environment loading.

use std::env;
use std::time::Duration;

use crate::cache::{DEFAULT_TTL, SEARCH_TTL};
use crate::http_client::DEFAULT_TIMEOUT;
use crate::ValidationError;

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";
pub const TICKERS_ENDPOINT: &str = "/v3/reference/tickers";
pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

pub const API_KEY_ENV: &str = "SAHM_POLYGON_API_KEY";
pub const FALLBACK_API_KEY_ENV: &str = "POLYGON_API_KEY";
pub const BASE_URL_ENV: &str = "SAHM_API_BASE_URL";

/// Settings consumed by [`StockClient`](crate::StockClient).
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Missing keys do not fail construction; every request fails instead.
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub default_ttl: Duration,
    pub search_ttl: Duration,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            default_ttl: DEFAULT_TTL,
            search_ttl: SEARCH_TTL,
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Load the API key and optional base URL override from the environment.
    pub fn from_env() -> Self {
        let api_key = read_non_blank(API_KEY_ENV).or_else(|| read_non_blank(FALLBACK_API_KEY_ENV));
        let base_url = read_non_blank(BASE_URL_ENV).unwrap_or_else(|| String::from(DEFAULT_BASE_URL));

        Self {
            base_url,
            api_key,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.trim().is_empty()).then_some(api_key);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, ValidationError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyBaseUrl);
        }
        self.base_url = trimmed.to_owned();
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn tickers_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), TICKERS_ENDPOINT)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("default_ttl", &self.default_ttl)
            .field("search_ttl", &self.search_ttl)
            .field("default_limit", &self.default_limit)
            .field("max_limit", &self.max_limit)
            .finish()
    }
}

fn read_non_blank(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
