//! Deterministic offline transport serving a built-in ticker catalog.
//!
//! Speaks the same `/v3/reference/tickers` wire format as the real upstream,
//! including cursor pagination through `next_url`, so the client and the
//! controller run unchanged against it.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use serde_json::json;

use crate::config::{DEFAULT_BASE_URL, MAX_PAGE_LIMIT, TICKERS_ENDPOINT};
use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};
use crate::StockRecord;

const CURSOR_PREFIX: &str = "off";

/// Offline transport backed by an in-memory record list.
#[derive(Debug)]
pub struct FixtureHttpClient {
    records: Vec<StockRecord>,
    injected: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl Default for FixtureHttpClient {
    fn default() -> Self {
        Self::with_records(nasdaq_catalog())
    }
}

impl FixtureHttpClient {
    pub fn with_records(records: Vec<StockRecord>) -> Self {
        Self {
            records,
            injected: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a canned outcome returned by the next request instead of catalog data.
    pub fn inject(&self, outcome: Result<HttpResponse, HttpError>) {
        self.injected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
    }

    /// Every request served so far, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn respond(&self, request: &HttpRequest) -> HttpResponse {
        if request.query_param("apiKey").is_none() {
            return HttpResponse::with_status(
                401,
                json!({"status": "ERROR", "request_id": "fixture", "error": "missing apiKey"})
                    .to_string(),
            );
        }

        let search = request.query_param("search").map(|s| s.to_lowercase());
        let exchange = request.query_param("exchange");
        let ticker_type = request.query_param("type");
        let active = request
            .query_param("active")
            .map_or(true, |value| value != "false");
        let descending = request.query_param("order").as_deref() == Some("desc");
        let limit = request
            .query_param("limit")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(MAX_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);

        let offset = match request.query_param("cursor") {
            Some(cursor) => match decode_cursor(&cursor) {
                Some(offset) => offset,
                None => {
                    return HttpResponse::with_status(
                        400,
                        json!({"status": "ERROR", "request_id": "fixture", "error": "invalid cursor"})
                            .to_string(),
                    )
                }
            },
            None => 0,
        };

        let mut matching = self
            .records
            .iter()
            .filter(|record| record.active == active)
            .filter(|record| exchange.as_deref().map_or(true, |e| record.primary_exchange == e))
            .filter(|record| ticker_type.as_deref().map_or(true, |t| record.ticker_type == t))
            .filter(|record| {
                search.as_deref().map_or(true, |query| {
                    record.ticker.to_lowercase().contains(query)
                        || record.name.to_lowercase().contains(query)
                })
            })
            .cloned()
            .collect::<Vec<_>>();

        matching.sort_by(|left, right| left.ticker.cmp(&right.ticker));
        if descending {
            matching.reverse();
        }

        let page = matching
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect::<Vec<_>>();
        let next_offset = offset + page.len();

        let mut body = json!({
            "results": page,
            "status": "OK",
            "request_id": format!("fixture-{offset}"),
            "count": page.len(),
        });
        if next_offset < matching.len() {
            body["next_url"] = json!(format!(
                "{DEFAULT_BASE_URL}{TICKERS_ENDPOINT}?cursor={}",
                encode_cursor(next_offset)
            ));
        }

        HttpResponse::ok_json(body.to_string())
    }
}

impl HttpClient for FixtureHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let injected = self
            .injected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let outcome = injected.unwrap_or_else(|| Ok(self.respond(&request)));
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        Box::pin(async move { outcome })
    }
}

fn encode_cursor(offset: usize) -> String {
    format!("{CURSOR_PREFIX}{offset}")
}

fn decode_cursor(cursor: &str) -> Option<usize> {
    cursor.strip_prefix(CURSOR_PREFIX)?.parse().ok()
}

/// Builds a catalog record with NASDAQ-style defaults.
pub fn fixture_record(ticker: &str, name: &str, ticker_type: &str, exchange: &str) -> StockRecord {
    StockRecord {
        ticker: ticker.to_owned(),
        name: name.to_owned(),
        market: String::from("stocks"),
        locale: String::from("us"),
        primary_exchange: exchange.to_owned(),
        ticker_type: ticker_type.to_owned(),
        active: true,
        currency_name: String::from("usd"),
        cik: None,
        composite_figi: None,
        share_class_figi: None,
        last_updated_utc: Some(String::from("2024-06-03T00:00:00Z")),
    }
}

/// Small NASDAQ-centric catalog used by offline mode.
pub fn nasdaq_catalog() -> Vec<StockRecord> {
    [
        ("AAL", "American Airlines Group Inc.", "CS", "XNAS"),
        ("AAON", "AAON, Inc.", "CS", "XNAS"),
        ("AAPB", "GraniteShares 2x Long AAPL Daily ETF", "ETF", "XNAS"),
        ("AAPL", "Apple Inc.", "CS", "XNAS"),
        ("ABNB", "Airbnb, Inc.", "CS", "XNAS"),
        ("ADBE", "Adobe Inc.", "CS", "XNAS"),
        ("ADI", "Analog Devices, Inc.", "CS", "XNAS"),
        ("ADP", "Automatic Data Processing, Inc.", "CS", "XNAS"),
        ("AMAT", "Applied Materials, Inc.", "CS", "XNAS"),
        ("AMD", "Advanced Micro Devices, Inc.", "CS", "XNAS"),
        ("AMGN", "Amgen Inc.", "CS", "XNAS"),
        ("AMZN", "Amazon.com, Inc.", "CS", "XNAS"),
        ("APP", "AppLovin Corporation", "CS", "XNAS"),
        ("ASML", "ASML Holding N.V. New York Registry Shares", "ADRC", "XNAS"),
        ("AVGO", "Broadcom Inc.", "CS", "XNAS"),
        ("BKNG", "Booking Holdings Inc.", "CS", "XNAS"),
        ("CMCSA", "Comcast Corporation", "CS", "XNAS"),
        ("COST", "Costco Wholesale Corporation", "CS", "XNAS"),
        ("CSCO", "Cisco Systems, Inc.", "CS", "XNAS"),
        ("GOOG", "Alphabet Inc. Class C", "CS", "XNAS"),
        ("GOOGL", "Alphabet Inc. Class A", "CS", "XNAS"),
        ("INTC", "Intel Corporation", "CS", "XNAS"),
        ("META", "Meta Platforms, Inc.", "CS", "XNAS"),
        ("MSFT", "Microsoft Corporation", "CS", "XNAS"),
        ("NFLX", "Netflix, Inc.", "CS", "XNAS"),
        ("NVDA", "NVIDIA Corporation", "CS", "XNAS"),
        ("PEP", "PepsiCo, Inc.", "CS", "XNAS"),
        ("PYPL", "PayPal Holdings, Inc.", "CS", "XNAS"),
        ("QCOM", "QUALCOMM Incorporated", "CS", "XNAS"),
        ("QQQ", "Invesco QQQ Trust, Series 1", "ETF", "XNAS"),
        ("SBUX", "Starbucks Corporation", "CS", "XNAS"),
        ("TSLA", "Tesla, Inc.", "CS", "XNAS"),
        ("TXN", "Texas Instruments Incorporated", "CS", "XNAS"),
        ("IBM", "International Business Machines Corporation", "CS", "XNYS"),
        ("JPM", "JPMorgan Chase & Co.", "CS", "XNYS"),
        ("KO", "The Coca-Cola Company", "CS", "XNYS"),
        ("SPY", "SPDR S&P 500 ETF Trust", "ETF", "ARCX"),
    ]
    .into_iter()
    .map(|(ticker, name, ticker_type, exchange)| fixture_record(ticker, name, ticker_type, exchange))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ListingPage;

    fn get(client: &FixtureHttpClient, query: &str) -> HttpResponse {
        let request = HttpRequest::get(format!(
            "{DEFAULT_BASE_URL}{TICKERS_ENDPOINT}?{query}&apiKey=test"
        ));
        client.respond(&request)
    }

    #[test]
    fn pages_through_catalog_with_cursors() {
        let client = FixtureHttpClient::default();
        let first: ListingPage =
            serde_json::from_str(&get(&client, "exchange=XNAS&limit=20").body).expect("page");
        assert_eq!(first.results.len(), 20);
        let cursor = first.next_cursor().expect("more pages remain");

        let second: ListingPage = serde_json::from_str(
            &get(&client, &format!("exchange=XNAS&limit=20&cursor={cursor}")).body,
        )
        .expect("page");
        assert_eq!(second.results.len(), 13);
        assert!(second.next_url.is_none());
        assert!(second.results.iter().all(|r| r.primary_exchange == "XNAS"));
    }

    #[test]
    fn search_filters_by_ticker_or_name() {
        let client = FixtureHttpClient::default();
        let page: ListingPage =
            serde_json::from_str(&get(&client, "search=apple&limit=50").body).expect("page");
        let tickers = page.results.iter().map(|r| r.ticker.as_str()).collect::<Vec<_>>();
        assert_eq!(tickers, vec!["AAPL"]);
    }

    #[test]
    fn missing_api_key_is_unauthorized() {
        let client = FixtureHttpClient::default();
        let response = client.respond(&HttpRequest::get(format!(
            "{DEFAULT_BASE_URL}{TICKERS_ENDPOINT}?limit=5"
        )));
        assert_eq!(response.status, 401);
    }

    #[test]
    fn invalid_cursor_is_rejected() {
        let client = FixtureHttpClient::default();
        assert_eq!(get(&client, "cursor=bogus").status, 400);
    }
}
