//! Listing request parameters and cache key derivation.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::SortOrder;

/// Namespace prefix shared by every listing cache key.
pub const CACHE_NAMESPACE: &str = "stocks:";

pub const DEFAULT_MARKET: &str = "stocks";
pub const DEFAULT_SORT: &str = "ticker";

/// Caller-facing listing request. Unset fields take the listing defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListParams {
    pub search: Option<String>,
    pub market: Option<String>,
    pub exchange: Option<String>,
    pub ticker_type: Option<String>,
    pub active: Option<bool>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = non_blank(search.into());
        self
    }

    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = non_blank(market.into());
        self
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = non_blank(exchange.into());
        self
    }

    pub fn with_type(mut self, ticker_type: impl Into<String>) -> Self {
        self.ticker_type = non_blank(ticker_type.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>, order: SortOrder) -> Self {
        self.sort = non_blank(sort.into());
        self.order = Some(order);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = non_blank(cursor.into());
        self
    }

    /// Apply defaults and clamp the limit.
    pub fn resolve(&self, config: &ClientConfig) -> ResolvedParams {
        let limit = self
            .limit
            .unwrap_or(config.default_limit)
            .min(config.max_limit);

        ResolvedParams {
            search: self.search.clone(),
            market: self
                .market
                .clone()
                .unwrap_or_else(|| String::from(DEFAULT_MARKET)),
            exchange: self.exchange.clone(),
            ticker_type: self.ticker_type.clone(),
            active: self.active.unwrap_or(true),
            sort: self.sort.clone().unwrap_or_else(|| String::from(DEFAULT_SORT)),
            order: self.order.unwrap_or_default(),
            limit,
            cursor: self.cursor.clone(),
        }
    }
}

/// Fully resolved request: what actually goes on the wire and into the cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParams {
    pub search: Option<String>,
    pub market: String,
    pub exchange: Option<String>,
    pub ticker_type: Option<String>,
    pub active: bool,
    pub sort: String,
    pub order: SortOrder,
    pub limit: usize,
    pub cursor: Option<String>,
}

impl ResolvedParams {
    /// Deterministic cache key: namespace prefix plus JSON with sorted keys.
    pub fn cache_key(&self) -> String {
        let mut fields = BTreeMap::new();
        fields.insert("active", Value::Bool(self.active));
        fields.insert("limit", Value::from(self.limit as u64));
        fields.insert("market", Value::from(self.market.as_str()));
        fields.insert("order", Value::from(self.order.as_str()));
        fields.insert("sort", Value::from(self.sort.as_str()));
        for (name, value) in [
            ("cursor", &self.cursor),
            ("exchange", &self.exchange),
            ("search", &self.search),
            ("type", &self.ticker_type),
        ] {
            if let Some(value) = value {
                fields.insert(name, Value::from(value.as_str()));
            }
        }

        let json = serde_json::to_string(&fields).unwrap_or_default();
        format!("{CACHE_NAMESPACE}{json}")
    }

    /// Query parameters in wire order, excluding credentials.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("market", self.market.clone()),
            ("active", self.active.to_string()),
            ("sort", self.sort.clone()),
            ("order", self.order.as_str().to_owned()),
            ("limit", self.limit.to_string()),
        ];

        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(exchange) = &self.exchange {
            pairs.push(("exchange", exchange.clone()));
        }
        if let Some(ticker_type) = &self.ticker_type {
            pairs.push(("type", ticker_type.clone()));
        }
        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor", cursor.clone()));
        }

        pairs
    }

    pub fn query_string(&self) -> String {
        self.query_pairs()
            .into_iter()
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(&value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn is_search(&self) -> bool {
        self.search.is_some()
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
