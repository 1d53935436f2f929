//! Behavior-driven tests for the stock data client
//!
//! These tests drive `StockClient` against the offline fixture transport and
//! verify caching, cache keys, pagination, ranked search and error mapping.

mod support;

use std::time::Duration;

use sahm_core::{
    CacheMode, ClientConfig, ClientErrorKind, FixtureHttpClient, HttpResponse, ListParams,
    SortOrder, StockClient,
};
use std::sync::Arc;

use support::{fixture_client, fixture_client_with, tickers, PAST_DEFAULT_TTL};

// =============================================================================
// Client: Listing Cache
// =============================================================================

#[tokio::test]
async fn when_same_listing_is_requested_twice_second_is_served_from_cache() {
    // Given: A client over the fixture catalog
    let (client, fixture, _) = fixture_client();
    let params = ListParams::new().with_exchange("XNAS");

    // When: The same page is listed twice
    let first = client.list_tickers(&params).await.expect("first page");
    let second = client.list_tickers(&params).await.expect("cached page");

    // Then: Only one request went out and the pages match
    assert_eq!(fixture.request_count(), 1);
    assert_eq!(first, second);
    let stats = client.cache_stats().await;
    assert_eq!((stats.size, stats.hits, stats.misses), (1, 1, 1));
}

#[tokio::test]
async fn when_default_ttl_passes_listing_is_fetched_again() {
    // Given: A cached listing page
    let (client, fixture, clock) = fixture_client();
    let params = ListParams::new();
    client.list_tickers(&params).await.expect("page");
    assert!(!client.is_stale(&params).await);

    // When: More than five minutes pass
    clock.advance(PAST_DEFAULT_TTL);

    // Then: The entry is stale and the next call goes upstream
    assert!(client.is_stale(&params).await);
    client.list_tickers(&params).await.expect("page");
    assert_eq!(fixture.request_count(), 2);
}

#[tokio::test]
async fn search_listings_use_the_shorter_search_ttl() {
    // Given: A cached search listing
    let (client, fixture, clock) = fixture_client();
    let params = ListParams::new().with_search("apple");
    client.list_tickers(&params).await.expect("page");

    // When: Two minutes and a second pass
    clock.advance(Duration::from_secs(121));

    // Then: The search entry has expired while a plain listing would not have
    client.list_tickers(&params).await.expect("page");
    assert_eq!(fixture.request_count(), 2);
}

#[tokio::test]
async fn force_refresh_bypasses_and_replaces_cached_pages() {
    // Given: Two cached listing pages
    let (client, fixture, clock) = fixture_client();
    let first = ListParams::new().with_limit(10);
    let other = ListParams::new().with_limit(30);
    client.list_tickers(&first).await.expect("page");
    client.list_tickers(&other).await.expect("page");
    let stored_at = client.last_updated(&first).await.expect("cached");

    // When: The first page is force refreshed a minute later
    clock.advance(Duration::from_secs(60));
    client.force_refresh(&first).await.expect("refresh");

    // Then: The namespace was cleared, only the refreshed page is held again
    assert_eq!(fixture.request_count(), 3);
    assert_eq!(client.cache().len().await, 1);
    let refreshed_at = client.last_updated(&first).await.expect("re-cached");
    assert!(refreshed_at > stored_at);
    assert_eq!(client.last_updated(&other).await, None);
}

#[tokio::test]
async fn bypass_mode_neither_reads_nor_writes_the_cache() {
    // Given: A client with an empty cache
    let (client, fixture, _) = fixture_client();
    let params = ListParams::new();

    // When: The page is fetched twice in bypass mode
    client
        .list_tickers_with_mode(&params, CacheMode::Bypass)
        .await
        .expect("page");
    client
        .list_tickers_with_mode(&params, CacheMode::Bypass)
        .await
        .expect("page");

    // Then: Both calls went upstream and nothing was stored
    assert_eq!(fixture.request_count(), 2);
    assert!(client.cache().is_empty().await);
}

// =============================================================================
// Client: Cache Key Determinism
// =============================================================================

#[test]
fn params_built_in_any_order_share_a_cache_key() {
    // Given: The same fields set in two different orders
    let client = StockClient::new(ClientConfig::default(), Arc::new(FixtureHttpClient::default()));
    let forward = ListParams::new()
        .with_search("bank")
        .with_exchange("XNAS")
        .with_type("CS")
        .with_limit(50)
        .with_sort("name", SortOrder::Desc);
    let reverse = ListParams::new()
        .with_sort("name", SortOrder::Desc)
        .with_limit(50)
        .with_type("CS")
        .with_exchange("XNAS")
        .with_search("bank");

    // Then: The keys match
    assert_eq!(client.cache_key(&forward), client.cache_key(&reverse));
}

#[test]
fn any_single_differing_field_changes_the_cache_key() {
    let client = StockClient::new(ClientConfig::default(), Arc::new(FixtureHttpClient::default()));
    let base = ListParams::new().with_exchange("XNAS");
    let base_key = client.cache_key(&base);

    let variants = [
        base.clone().with_search("bank"),
        base.clone().with_exchange("XNYS"),
        base.clone().with_type("ETF"),
        base.clone().with_market("crypto"),
        base.clone().with_active(false),
        base.clone().with_limit(21),
        base.clone().with_cursor("off20"),
        base.clone().with_sort("name", SortOrder::Asc),
        base.clone().with_sort("ticker", SortOrder::Desc),
    ];

    for variant in variants {
        assert_ne!(client.cache_key(&variant), base_key, "{variant:?}");
    }
}

#[test]
fn explicit_defaults_share_the_key_of_omitted_ones() {
    let client = StockClient::new(ClientConfig::default(), Arc::new(FixtureHttpClient::default()));
    let implicit = ListParams::new();
    let explicit = ListParams::new()
        .with_market("stocks")
        .with_active(true)
        .with_sort("ticker", SortOrder::Asc)
        .with_limit(20);

    assert_eq!(client.cache_key(&implicit), client.cache_key(&explicit));
}

// =============================================================================
// Client: Pagination
// =============================================================================

#[tokio::test]
async fn cursor_pagination_walks_the_whole_exchange() {
    // Given: The fixture catalog
    let (client, _, _) = fixture_client();
    let mut params = ListParams::new().with_exchange("XNAS").with_limit(10);
    let mut seen = Vec::new();

    // When: Pages are followed until no cursor remains
    loop {
        let page = client.list_tickers(&params).await.expect("page");
        seen.extend(page.results.iter().map(|r| r.ticker.clone()));
        match page.next_cursor() {
            Some(cursor) => params = params.with_cursor(cursor),
            None => break,
        }
    }

    // Then: Every XNAS ticker was listed exactly once, in ticker order
    assert_eq!(seen.len(), 33);
    let mut sorted = seen.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(seen, sorted);
}

#[tokio::test]
async fn tickers_by_exchange_returns_first_page_records() {
    let (client, _, _) = fixture_client();

    let records = client
        .tickers_by_exchange("XNYS", None)
        .await
        .expect("listing");

    assert_eq!(tickers(&records), vec!["IBM", "JPM", "KO"]);
}

// =============================================================================
// Client: Ranked Search
// =============================================================================

#[tokio::test]
async fn search_ranks_exact_ticker_before_name_matches() {
    // Given: A catalog where "AAPL" matches a ticker and an ETF name
    let (client, _, _) = fixture_client();

    // When: Searching for the ticker
    let results = client.search_tickers("aapl", 20).await.expect("search");

    // Then: The exact ticker comes first
    assert_eq!(tickers(&results), vec!["AAPL", "AAPB"]);
}

#[tokio::test]
async fn search_prefers_ticker_prefix_and_common_stock() {
    let (client, _, _) = fixture_client();

    let results = client.search_tickers("goog", 20).await.expect("search");

    assert_eq!(tickers(&results), vec!["GOOG", "GOOGL"]);
}

#[tokio::test]
async fn search_is_scoped_to_nasdaq() {
    // Given: A query that only matches an NYSE listing
    let (client, fixture, _) = fixture_client();

    // When: Searching
    let results = client.search_tickers("coca-cola", 20).await.expect("search");

    // Then: Nothing matches on XNAS
    assert!(results.is_empty());
    let request = &fixture.requests()[0];
    assert_eq!(request.query_param("exchange").as_deref(), Some("XNAS"));
    assert_eq!(request.query_param("active").as_deref(), Some("true"));
}

#[tokio::test]
async fn search_results_are_truncated_to_limit() {
    let (client, _, _) = fixture_client();

    let results = client.search_tickers("inc", 3).await.expect("search");

    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn short_query_returns_empty_without_a_request() {
    // Given: A one-character query
    let (client, fixture, _) = fixture_client();

    // When: Searching
    let results = client.search_tickers(" a ", 20).await.expect("search");

    // Then: No request was issued
    assert!(results.is_empty());
    assert_eq!(fixture.request_count(), 0);
}

// =============================================================================
// Client: Error Handling
// =============================================================================

#[tokio::test]
async fn missing_credential_fails_every_call_without_transport() {
    // Given: A client with no API key
    let fixture = Arc::new(FixtureHttpClient::default());
    let client = StockClient::new(ClientConfig::default(), fixture.clone());

    // When: Listing and searching
    let list_error = client.list_tickers(&ListParams::new()).await.expect_err("no key");
    let search_error = client.search_tickers("apple", 5).await.expect_err("no key");

    // Then: Both fail as configuration errors and nothing went out
    assert_eq!(list_error.kind(), ClientErrorKind::MissingCredential);
    assert_eq!(search_error.kind(), ClientErrorKind::MissingCredential);
    assert!(!list_error.retryable());
    assert_eq!(fixture.request_count(), 0);
}

#[tokio::test]
async fn rate_limit_response_is_classified_and_not_cached() {
    // Given: The upstream answers one request with 429
    let fixture = FixtureHttpClient::default();
    fixture.inject(Ok(HttpResponse::with_status(429, "{}")));
    let (client, fixture, _) = fixture_client_with(fixture);
    let params = ListParams::new();

    // When: The page is requested twice
    let error = client.list_tickers(&params).await.expect_err("rate limited");
    let page = client.list_tickers(&params).await.expect("recovered");

    // Then: The failure was rate-limited, retryable, and the retry went upstream
    assert_eq!(error.kind(), ClientErrorKind::RateLimited);
    assert!(error.retryable());
    assert_eq!(page.results.len(), 20);
    assert_eq!(fixture.request_count(), 2);
}

#[tokio::test]
async fn invalid_cursor_surfaces_upstream_message() {
    let (client, _, _) = fixture_client();

    let error = client
        .list_tickers(&ListParams::new().with_cursor("bogus"))
        .await
        .expect_err("bad cursor");

    assert_eq!(error.kind(), ClientErrorKind::RequestFailed);
    assert!(error.message().contains("invalid cursor"), "{}", error.message());
}

#[tokio::test]
async fn rejected_credential_is_unauthorized() {
    // Given: The upstream rejects the key
    let fixture = FixtureHttpClient::default();
    fixture.inject(Ok(HttpResponse::with_status(401, r#"{"status":"ERROR"}"#)));
    let (client, _, _) = fixture_client_with(fixture);

    let error = client.list_tickers(&ListParams::new()).await.expect_err("401");

    assert_eq!(error.kind(), ClientErrorKind::Unauthorized);
    assert!(!error.retryable());
}
