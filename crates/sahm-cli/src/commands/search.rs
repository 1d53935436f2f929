use std::time::Instant;

use sahm_core::domain::MIN_SEARCH_LENGTH;
use sahm_core::{SearchQuery, StockClient, StockRecord};
use serde::Serialize;

use crate::cli::SearchArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SearchResponseData {
    query: String,
    results: Vec<StockRecord>,
}

pub async fn run(args: &SearchArgs, client: &StockClient) -> Result<CommandResult, CliError> {
    if args.limit == 0 {
        return Err(CliError::Command(String::from(
            "--limit must be greater than zero",
        )));
    }

    let query = SearchQuery::new(&args.query);
    if !query.is_searchable() {
        let data = serde_json::to_value(SearchResponseData {
            query: query.to_string(),
            results: Vec::new(),
        })?;
        return Ok(CommandResult::ok(data).with_warning(format!(
            "query shorter than {MIN_SEARCH_LENGTH} characters; no search performed"
        )));
    }

    let started = Instant::now();
    match client.search_tickers(query.as_str(), args.limit).await {
        Ok(results) => {
            let data = serde_json::to_value(SearchResponseData {
                query: query.to_string(),
                results,
            })?;
            Ok(CommandResult::ok(data).with_latency(started))
        }
        Err(error) => {
            let data = serde_json::to_value(SearchResponseData {
                query: query.to_string(),
                results: Vec::new(),
            })?;
            Ok(CommandResult::ok(data)
                .with_error(error)
                .with_latency(started))
        }
    }
}
