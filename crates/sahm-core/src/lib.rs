//! # Sahm Core
//!
//! Ticker listing client, TTL cache and explore controller for the sahm
//! stock explorer.
//!
//! ## Overview
//!
//! - **Stock data client** over the reference tickers endpoint, with cursor
//!   pagination and relevance-ranked search
//! - **TTL cache** shared by every call path, keyed by resolved request params
//! - **Explore controller** merging an infinitely scrolled listing with a
//!   debounced search stream
//! - **Offline fixture transport** speaking the same wire format
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | TTL cache with hit/miss counters |
//! | [`client`] | `StockClient` and the `StockSource` trait |
//! | [`clock`] | Injected time source |
//! | [`config`] | Client configuration and environment lookup |
//! | [`controller`] | Listing/search state machine |
//! | [`domain`] | Stock records, pages, queries, timestamps |
//! | [`envelope`] | Response envelope for machine-readable output |
//! | [`error`] | Validation and client errors |
//! | [`fixture`] | Offline NASDAQ catalog transport |
//! | [`http_client`] | HTTP client abstraction |
//! | [`params`] | Listing parameters and cache keys |
//! | [`ranking`] | Search relevance ordering |
//! | [`scroll`] | Viewport-driven load-more trigger |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sahm_core::{ControllerConfig, ExploreController, StockClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(StockClient::from_env());
//!     let controller = ExploreController::new(client, ControllerConfig::default());
//!
//!     controller.start().await;
//!     controller.load_more().await;
//!
//!     for record in controller.snapshot().visible_records() {
//!         println!("{} {}", record.ticker, record.name);
//!     }
//! }
//! ```
//!
//! ## Error Handling
//!
//! The client never retries. Callers branch on the error kind:
//!
//! ```rust
//! use sahm_core::{ClientError, ClientErrorKind};
//!
//! fn handle_error(error: &ClientError) {
//!     match error.kind() {
//!         ClientErrorKind::RateLimited => {
//!             // Back off, then refresh
//!         }
//!         ClientErrorKind::MissingCredential | ClientErrorKind::Unauthorized => {
//!             // Fix configuration
//!         }
//!         ClientErrorKind::RequestFailed => {
//!             // Retry the same operation
//!         }
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - The API key is read from the environment only and redacted from `Debug`
//! - Request logging never includes the credential

pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod controller;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod fixture;
pub mod http_client;
pub mod params;
pub mod ranking;
pub mod scroll;

// Caching
pub use cache::{CacheEntryInfo, CacheMode, CacheStats, CacheStore};

// Client
pub use client::{StockClient, StockSource};

// Clock
pub use clock::{Clock, ManualClock, SystemClock};

// Configuration
pub use config::ClientConfig;

// Controller
pub use controller::{
    ControllerConfig, ExploreController, ExploreSnapshot, LoadOutcome, Notification, Severity,
    StreamPhase,
};

// Domain models
pub use domain::{
    dedup_by_ticker, ListingPage, PageStatus, SearchQuery, SortOrder, StockRecord, UtcDateTime,
};

// Envelope types
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};

// Error types
pub use error::{ClientError, ClientErrorKind, ValidationError};

// Offline transport
pub use fixture::FixtureHttpClient;

// HTTP client types
pub use http_client::{HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Parameters
pub use params::{ListParams, ResolvedParams};

// Scrolling
pub use scroll::{InfiniteScroll, ScrollGate, ScrollMetrics, Viewport};
