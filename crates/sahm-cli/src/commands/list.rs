use std::time::Instant;

use sahm_core::params::DEFAULT_SORT;
use sahm_core::{ListParams, ListingPage, SortOrder, StockClient, StockRecord, ValidationError};
use serde::Serialize;

use crate::cli::ListArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ListResponseData {
    results: Vec<StockRecord>,
    count: usize,
    next_cursor: Option<String>,
    has_more: bool,
}

impl From<ListingPage> for ListResponseData {
    fn from(page: ListingPage) -> Self {
        let next_cursor = page.next_cursor();
        Self {
            count: page.results.len(),
            results: page.results,
            has_more: next_cursor.is_some(),
            next_cursor,
        }
    }
}

pub async fn run(args: &ListArgs, client: &StockClient) -> Result<CommandResult, CliError> {
    let params = build_params(args)?;
    let started = Instant::now();

    match client.list_tickers(&params).await {
        Ok(page) => {
            let data = serde_json::to_value(ListResponseData::from(page))?;
            Ok(CommandResult::ok(data).with_latency(started))
        }
        Err(error) => {
            let data = serde_json::to_value(ListResponseData {
                results: Vec::new(),
                count: 0,
                next_cursor: None,
                has_more: false,
            })?;
            Ok(CommandResult::ok(data)
                .with_error(error)
                .with_latency(started))
        }
    }
}

fn build_params(args: &ListArgs) -> Result<ListParams, CliError> {
    if args.limit == Some(0) {
        return Err(ValidationError::ZeroLimit.into());
    }

    let mut params = ListParams::new().with_active(!args.inactive);
    if let Some(search) = &args.search {
        params = params.with_search(search.as_str());
    }
    if let Some(exchange) = &args.exchange {
        params = params.with_exchange(exchange.as_str());
    }
    if let Some(ticker_type) = &args.ticker_type {
        params = params.with_type(ticker_type.as_str());
    }
    if let Some(market) = &args.market {
        params = params.with_market(market.as_str());
    }
    if let Some(limit) = args.limit {
        params = params.with_limit(limit);
    }
    if let Some(cursor) = &args.cursor {
        params = params.with_cursor(cursor.as_str());
    }

    let order = args
        .order
        .as_deref()
        .map(str::parse::<SortOrder>)
        .transpose()?;
    if args.sort.is_some() || order.is_some() {
        let sort = args.sort.as_deref().unwrap_or(DEFAULT_SORT);
        params = params.with_sort(sort, order.unwrap_or_default());
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ListArgs {
        ListArgs {
            search: None,
            exchange: None,
            ticker_type: None,
            market: None,
            limit: None,
            cursor: None,
            sort: None,
            order: None,
            inactive: false,
        }
    }

    #[test]
    fn flags_map_onto_params() {
        let params = build_params(&ListArgs {
            exchange: Some(String::from("XNAS")),
            ticker_type: Some(String::from("CS")),
            limit: Some(50),
            order: Some(String::from("desc")),
            inactive: true,
            ..args()
        })
        .expect("valid flags");

        assert_eq!(params.exchange.as_deref(), Some("XNAS"));
        assert_eq!(params.ticker_type.as_deref(), Some("CS"));
        assert_eq!(params.limit, Some(50));
        assert_eq!(params.sort.as_deref(), Some("ticker"));
        assert_eq!(params.order, Some(SortOrder::Desc));
        assert_eq!(params.active, Some(false));
    }

    #[test]
    fn invalid_order_and_zero_limit_are_rejected() {
        let bad_order = build_params(&ListArgs {
            order: Some(String::from("sideways")),
            ..args()
        })
        .expect_err("order must be asc or desc");
        assert_eq!(bad_order.exit_code(), 2);

        let zero = build_params(&ListArgs {
            limit: Some(0),
            ..args()
        })
        .expect_err("zero limit");
        assert_eq!(zero.exit_code(), 2);
    }
}
