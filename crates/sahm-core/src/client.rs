//! Stock data client: listing and search over the reference tickers endpoint.
//!
//! Every call consults the shared [`CacheStore`] first. Failures are normalized
//! into [`ClientError`] and never retried here; retry decisions belong to the
//! caller.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::cache::{CacheMode, CacheStats, CacheStore};
use crate::config::ClientConfig;
use crate::error::has_rate_limit_signature;
use crate::http_client::{HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::params::{ListParams, ResolvedParams, CACHE_NAMESPACE, DEFAULT_MARKET};
use crate::ranking::rank;
use crate::{
    ClientError, ListingPage, PageStatus, SearchQuery, StockRecord, UtcDateTime, ValidationError,
};

/// Exchange the search path is scoped to.
pub const DEFAULT_SEARCH_EXCHANGE: &str = "XNAS";

/// Candidate over-fetch factor used before ranking search results.
pub const SEARCH_CANDIDATE_FACTOR: usize = 3;

const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please try again in a few seconds.";
const UNAUTHORIZED_MESSAGE: &str = "API key invalid or missing. Check SAHM_POLYGON_API_KEY.";

/// Listing and search operations the explore controller depends on.
///
/// Implemented by [`StockClient`]; tests substitute scripted doubles.
pub trait StockSource: Send + Sync {
    /// Fetch one listing page.
    fn fetch_listing<'a>(
        &'a self,
        params: ListParams,
    ) -> Pin<Box<dyn Future<Output = Result<ListingPage, ClientError>> + Send + 'a>>;

    /// Fetch ranked search results. Queries below the minimum length yield nothing.
    fn fetch_search<'a>(
        &'a self,
        query: String,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<StockRecord>, ClientError>> + Send + 'a>>;
}

/// Cached client for the reference tickers endpoint.
#[derive(Clone)]
pub struct StockClient {
    config: ClientConfig,
    http_client: Arc<dyn HttpClient>,
    cache: CacheStore<ListingPage>,
    search_exchange: Option<String>,
}

impl StockClient {
    pub fn new(config: ClientConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let cache = CacheStore::new(config.default_ttl);
        Self::with_cache(config, http_client, cache)
    }

    /// Build a client sharing an externally owned cache.
    pub fn with_cache(
        config: ClientConfig,
        http_client: Arc<dyn HttpClient>,
        cache: CacheStore<ListingPage>,
    ) -> Self {
        Self {
            config,
            http_client,
            cache,
            search_exchange: Some(String::from(DEFAULT_SEARCH_EXCHANGE)),
        }
    }

    /// Production client configured from the environment.
    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env(), Arc::new(ReqwestHttpClient::new()))
    }

    /// Scope search to another exchange, or to none.
    pub fn with_search_exchange(mut self, exchange: Option<String>) -> Self {
        self.search_exchange = exchange;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore<ListingPage> {
        &self.cache
    }

    /// Fetch one listing page, serving it from the cache when possible.
    pub async fn list_tickers(&self, params: &ListParams) -> Result<ListingPage, ClientError> {
        self.list_tickers_with_mode(params, CacheMode::Use).await
    }

    pub async fn list_tickers_with_mode(
        &self,
        params: &ListParams,
        mode: CacheMode,
    ) -> Result<ListingPage, ClientError> {
        if params.limit == Some(0) {
            return Err(ValidationError::ZeroLimit.into());
        }

        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(ClientError::missing_credential)?;

        let resolved = params.resolve(&self.config);
        let cache_key = resolved.cache_key();

        if mode == CacheMode::Use {
            if let Some(page) = self.cache.get(&cache_key).await {
                return Ok(page);
            }
        }

        let page = self.fetch_page(&resolved, api_key).await?;

        if mode != CacheMode::Bypass {
            let ttl = if resolved.is_search() {
                self.config.search_ttl
            } else {
                self.config.default_ttl
            };
            self.cache.set(cache_key, page.clone(), Some(ttl)).await;
        }

        Ok(page)
    }

    /// Ranked search over active stocks.
    ///
    /// Over-fetches `3 x limit` candidates (capped at the page maximum), ranks
    /// them, and keeps the best `limit`. Short queries return immediately.
    pub async fn search_tickers(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<StockRecord>, ClientError> {
        let query = SearchQuery::new(query);
        if !query.is_searchable() || limit == 0 {
            return Ok(Vec::new());
        }

        let candidate_limit = limit
            .saturating_mul(SEARCH_CANDIDATE_FACTOR)
            .min(self.config.max_limit);

        let mut params = ListParams::new()
            .with_search(query.as_str())
            .with_limit(candidate_limit)
            .with_active(true)
            .with_market(DEFAULT_MARKET);
        if let Some(exchange) = &self.search_exchange {
            params = params.with_exchange(exchange.clone());
        }

        let page = self.list_tickers(&params).await?;
        let mut ranked = rank(page.results, query.as_str());
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Records of the first page listed on one exchange.
    pub async fn tickers_by_exchange(
        &self,
        exchange: &str,
        limit: Option<usize>,
    ) -> Result<Vec<StockRecord>, ClientError> {
        let mut params = ListParams::new()
            .with_exchange(exchange)
            .with_active(true)
            .with_market(DEFAULT_MARKET);
        if let Some(limit) = limit {
            params = params.with_limit(limit);
        }

        Ok(self.list_tickers(&params).await?.results)
    }

    /// Evict cache entries whose key contains `key_contains`, or all of them.
    pub async fn clear_cache(&self, key_contains: Option<&str>) {
        self.cache.clear(key_contains).await;
    }

    /// Drop every cached listing page, then fetch `params` from upstream.
    pub async fn force_refresh(&self, params: &ListParams) -> Result<ListingPage, ClientError> {
        self.cache.clear(Some(CACHE_NAMESPACE)).await;
        self.list_tickers_with_mode(params, CacheMode::Refresh).await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn last_updated(&self, params: &ListParams) -> Option<UtcDateTime> {
        let key = self.cache_key(params);
        self.cache.last_updated(&key).await
    }

    pub async fn is_stale(&self, params: &ListParams) -> bool {
        let key = self.cache_key(params);
        self.cache.is_stale(&key).await
    }

    pub fn cache_key(&self, params: &ListParams) -> String {
        params.resolve(&self.config).cache_key()
    }

    async fn fetch_page(
        &self,
        resolved: &ResolvedParams,
        api_key: &str,
    ) -> Result<ListingPage, ClientError> {
        let url = format!("{}?{}", self.config.tickers_url(), resolved.query_string());
        let request = HttpRequest::get(url)
            .with_timeout(self.config.timeout)
            .with_auth(&HttpAuth::api_key(api_key));

        tracing::debug!(
            search = resolved.search.as_deref(),
            exchange = resolved.exchange.as_deref(),
            cursor = resolved.cursor.is_some(),
            limit = resolved.limit,
            "requesting ticker page"
        );

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(transport_error)?;

        if !response.is_success() {
            let error = status_error(&response);
            tracing::warn!(status = response.status, code = error.code(), "ticker request failed");
            return Err(error);
        }

        let page: ListingPage = serde_json::from_str(&response.body).map_err(|error| {
            ClientError::request_failed(format!("failed to parse ticker response: {error}"))
        })?;

        if page.status == PageStatus::Error {
            let message = page
                .error
                .clone()
                .unwrap_or_else(|| String::from("upstream reported an error status"));
            tracing::warn!(request_id = %page.request_id, "ticker response carried ERROR status");
            return Err(classify_message(message));
        }

        Ok(page)
    }
}

impl std::fmt::Debug for StockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockClient")
            .field("config", &self.config)
            .field("search_exchange", &self.search_exchange)
            .finish_non_exhaustive()
    }
}

impl StockSource for StockClient {
    fn fetch_listing<'a>(
        &'a self,
        params: ListParams,
    ) -> Pin<Box<dyn Future<Output = Result<ListingPage, ClientError>> + Send + 'a>> {
        Box::pin(async move { self.list_tickers(&params).await })
    }

    fn fetch_search<'a>(
        &'a self,
        query: String,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<StockRecord>, ClientError>> + Send + 'a>> {
        Box::pin(async move { self.search_tickers(&query, limit).await })
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn transport_error(error: HttpError) -> ClientError {
    tracing::warn!(timed_out = error.timed_out(), "ticker transport error");
    classify_message(error.message().to_owned())
}

fn status_error(response: &HttpResponse) -> ClientError {
    match response.status {
        429 => ClientError::rate_limited(RATE_LIMITED_MESSAGE),
        401 => ClientError::unauthorized(UNAUTHORIZED_MESSAGE),
        status => {
            let detail = serde_json::from_str::<UpstreamErrorBody>(&response.body)
                .ok()
                .and_then(|body| body.error.or(body.message))
                .unwrap_or_else(|| response.body.trim().chars().take(200).collect());
            classify_message(format!("upstream returned status {status}: {detail}"))
        }
    }
}

fn classify_message(message: String) -> ClientError {
    if has_rate_limit_signature(&message) {
        ClientError::rate_limited(RATE_LIMITED_MESSAGE)
    } else {
        ClientError::request_failed(message)
    }
}
