//! Shared doubles for the behavior suites.

#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sahm_core::cache::DEFAULT_TTL;
use sahm_core::{
    CacheStore, ClientConfig, FixtureHttpClient, HttpClient, HttpError, HttpRequest,
    HttpResponse, ManualClock, StockClient, UtcDateTime,
};
use tokio::sync::Semaphore;

pub const TEST_API_KEY: &str = "test-key";

pub fn start_time() -> UtcDateTime {
    UtcDateTime::parse("2024-06-03T14:30:00Z").expect("valid timestamp")
}

pub fn test_config() -> ClientConfig {
    ClientConfig::default().with_api_key(TEST_API_KEY)
}

/// Client over the fixture catalog with a manually driven cache clock.
pub fn fixture_client() -> (StockClient, Arc<FixtureHttpClient>, Arc<ManualClock>) {
    fixture_client_with(FixtureHttpClient::default())
}

pub fn fixture_client_with(
    fixture: FixtureHttpClient,
) -> (StockClient, Arc<FixtureHttpClient>, Arc<ManualClock>) {
    let fixture = Arc::new(fixture);
    let clock = Arc::new(ManualClock::new(start_time()));
    let cache = CacheStore::with_clock(DEFAULT_TTL, clock.clone());
    let client = StockClient::with_cache(test_config(), fixture.clone(), cache);
    (client, fixture, clock)
}

/// Transport that holds every request until a permit is released.
#[derive(Debug)]
pub struct GatedHttpClient {
    inner: Arc<FixtureHttpClient>,
    permits: Semaphore,
    started: AtomicUsize,
}

impl GatedHttpClient {
    pub fn closed(inner: Arc<FixtureHttpClient>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            permits: Semaphore::new(0),
            started: AtomicUsize::new(0),
        })
    }

    pub fn release(&self, count: usize) {
        self.permits.add_permits(count);
    }

    /// Requests that reached the transport, whether or not they were released.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Wait until `count` requests have reached the transport.
    ///
    /// Sleeps rather than yields so paused-clock tests can reach pending timers.
    pub async fn wait_for_started(&self, count: usize) {
        while self.started() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

impl HttpClient for GatedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            self.started.fetch_add(1, Ordering::SeqCst);
            let permit = self
                .permits
                .acquire()
                .await
                .expect("gate semaphore is never closed");
            permit.forget();
            self.inner.execute(request).await
        })
    }
}

/// Client whose transport is gated, sharing a fixture for request inspection.
pub fn gated_client() -> (StockClient, Arc<GatedHttpClient>, Arc<FixtureHttpClient>) {
    let fixture = Arc::new(FixtureHttpClient::default());
    let gate = GatedHttpClient::closed(fixture.clone());
    let client = StockClient::new(test_config(), gate.clone());
    (client, gate, fixture)
}

pub fn tickers(records: &[sahm_core::StockRecord]) -> Vec<&str> {
    records.iter().map(|record| record.ticker.as_str()).collect()
}

pub const PAST_DEFAULT_TTL: Duration = Duration::from_secs(5 * 60 + 1);
