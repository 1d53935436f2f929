use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::UtcDateTime;

/// Instrument type code the upstream uses for common stock.
pub const COMMON_STOCK_TYPE: &str = "CS";

/// One tradable instrument as returned by the reference tickers endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub ticker: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub primary_exchange: String,
    #[serde(rename = "type", default)]
    pub ticker_type: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub currency_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cik: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite_figi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_class_figi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_utc: Option<String>,
}

impl StockRecord {
    pub fn is_common_stock(&self) -> bool {
        self.ticker_type == COMMON_STOCK_TYPE
    }

    /// Parsed `last_updated_utc`, if present and well-formed.
    pub fn last_updated(&self) -> Option<UtcDateTime> {
        self.last_updated_utc
            .as_deref()
            .and_then(|value| UtcDateTime::parse(value).ok())
    }
}

/// Upstream response status marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageStatus {
    #[default]
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(other)]
    Other,
}

/// One fetched page of the ticker listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPage {
    #[serde(default)]
    pub results: Vec<StockRecord>,
    #[serde(default)]
    pub status: PageStatus,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ListingPage {
    /// Continuation token carried by the `cursor` query parameter of `next_url`.
    ///
    /// A missing or unparsable `next_url`, or one without a non-empty cursor,
    /// marks the last page.
    pub fn next_cursor(&self) -> Option<String> {
        let next_url = self.next_url.as_deref()?;
        let parsed = url::Url::parse(next_url).ok()?;
        parsed
            .query_pairs()
            .find(|(name, _)| name == "cursor")
            .map(|(_, value)| value.into_owned())
            .filter(|cursor| !cursor.is_empty())
    }

    pub fn is_last_page(&self) -> bool {
        self.next_cursor().is_none()
    }
}

/// Drops records whose ticker was already seen, keeping the first occurrence.
pub fn dedup_by_ticker(records: impl IntoIterator<Item = StockRecord>) -> Vec<StockRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.ticker.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_next_url(next_url: Option<&str>) -> ListingPage {
        ListingPage {
            results: Vec::new(),
            status: PageStatus::Ok,
            request_id: String::from("req-1"),
            count: 0,
            next_url: next_url.map(str::to_owned),
            error: None,
        }
    }

    #[test]
    fn deserializes_upstream_ticker_shape() {
        let payload = r#"{
            "results": [{
                "ticker": "AAPL",
                "name": "Apple Inc.",
                "market": "stocks",
                "locale": "us",
                "primary_exchange": "XNAS",
                "type": "CS",
                "active": true,
                "currency_name": "usd",
                "cik": "0000320193",
                "composite_figi": "BBG000B9XRY4",
                "last_updated_utc": "2024-01-02T00:00:00Z"
            }],
            "status": "OK",
            "request_id": "abc",
            "count": 1,
            "next_url": "https://api.polygon.io/v3/reference/tickers?cursor=YWN0aXZl"
        }"#;

        let page: ListingPage = serde_json::from_str(payload).expect("page should parse");
        assert_eq!(page.results.len(), 1);
        let record = &page.results[0];
        assert_eq!(record.ticker, "AAPL");
        assert_eq!(record.primary_exchange, "XNAS");
        assert!(record.is_common_stock());
        assert!(record.share_class_figi.is_none());
        assert!(record.last_updated().is_some());
        assert_eq!(page.next_cursor().as_deref(), Some("YWN0aXZl"));
    }

    #[test]
    fn unknown_status_and_missing_results_are_tolerated() {
        let page: ListingPage =
            serde_json::from_str(r#"{"status":"DELAYED","request_id":"x"}"#).expect("parse");
        assert_eq!(page.status, PageStatus::Other);
        assert!(page.results.is_empty());
        assert!(page.is_last_page());
    }

    #[test]
    fn next_cursor_is_absent_for_unparsable_or_cursorless_urls() {
        assert!(page_with_next_url(None).next_cursor().is_none());
        assert!(page_with_next_url(Some("not a url")).next_cursor().is_none());
        assert!(page_with_next_url(Some("https://api.polygon.io/v3/reference/tickers?limit=20"))
            .next_cursor()
            .is_none());
        assert!(page_with_next_url(Some("https://api.polygon.io/v3/reference/tickers?cursor="))
            .next_cursor()
            .is_none());
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let record = |ticker: &str, name: &str| StockRecord {
            ticker: ticker.to_owned(),
            name: name.to_owned(),
            market: String::from("stocks"),
            locale: String::from("us"),
            primary_exchange: String::from("XNAS"),
            ticker_type: String::from("CS"),
            active: true,
            currency_name: String::from("usd"),
            cik: None,
            composite_figi: None,
            share_class_figi: None,
            last_updated_utc: None,
        };

        let deduped = dedup_by_ticker(vec![
            record("AAPL", "first"),
            record("MSFT", "msft"),
            record("AAPL", "second"),
        ]);

        let names = deduped.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["first", "msft"]);
    }
}
