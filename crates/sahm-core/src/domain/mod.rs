//! # Domain Models
//!
//! Types for the reference ticker listing.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`StockRecord`] | One tradable instrument, identified by ticker |
//! | [`ListingPage`] | One fetched page with its continuation URL |
//! | [`SearchQuery`] | Trimmed search text with a minimum length |
//! | [`SortOrder`] | Listing sort direction |
//! | [`UtcDateTime`] | UTC timestamp |

mod query;
mod stock;
mod timestamp;

pub use query::{SearchQuery, SortOrder, MIN_SEARCH_LENGTH};
pub use stock::{dedup_by_ticker, ListingPage, PageStatus, StockRecord, COMMON_STOCK_TYPE};
pub use timestamp::UtcDateTime;
