use std::sync::Arc;
use std::time::Instant;

use sahm_core::domain::MIN_SEARCH_LENGTH;
use sahm_core::{
    ControllerConfig, ExploreController, ExploreSnapshot, LoadOutcome, Notification, SearchQuery,
    StockClient, StockRecord, StreamPhase,
};
use serde::Serialize;

use crate::cli::ExploreArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum View {
    Listing,
    Search,
}

#[derive(Debug, Serialize)]
struct ExploreResponseData {
    view: View,
    query: Option<String>,
    pages_loaded: usize,
    has_more: bool,
    end_of_listing: bool,
    listing_phase: StreamPhase,
    search_phase: StreamPhase,
    notification: Option<Notification>,
    results: Vec<StockRecord>,
}

pub async fn run(args: &ExploreArgs, client: &StockClient) -> Result<CommandResult, CliError> {
    if args.pages == 0 || args.page_size == 0 {
        return Err(CliError::Command(String::from(
            "--pages and --page-size must be greater than zero",
        )));
    }

    let config = ControllerConfig {
        page_size: args.page_size,
        ..ControllerConfig::default()
    };
    let controller = ExploreController::new(Arc::new(client.clone()), config);
    let started = Instant::now();

    let mut pages_loaded = 0;
    if controller.start().await == LoadOutcome::Applied {
        pages_loaded += 1;
        while pages_loaded < args.pages {
            if controller.load_more().await != LoadOutcome::Applied {
                break;
            }
            pages_loaded += 1;
        }
    }

    let mut warnings = Vec::new();
    if let Some(query) = &args.query {
        if !SearchQuery::new(query).is_searchable() {
            warnings.push(format!(
                "query shorter than {MIN_SEARCH_LENGTH} characters; showing the listing"
            ));
        }
        controller.search(query);
        controller.settle_search().await;
    }

    let snapshot = controller.snapshot();
    controller.close();

    if pages_loaded < args.pages && snapshot.end_of_listing() {
        warnings.push(format!(
            "listing exhausted after {pages_loaded} of {} requested pages",
            args.pages
        ));
    }

    let mut result = CommandResult::ok(serde_json::to_value(response_data(
        &snapshot,
        pages_loaded,
    ))?)
    .with_latency(started);
    for warning in warnings {
        result = result.with_warning(warning);
    }
    for error in [&snapshot.listing_error, &snapshot.search_error]
        .into_iter()
        .flatten()
    {
        result = result.with_error(error.clone());
    }

    Ok(result)
}

fn response_data(snapshot: &ExploreSnapshot, pages_loaded: usize) -> ExploreResponseData {
    ExploreResponseData {
        view: if snapshot.is_searching() {
            View::Search
        } else {
            View::Listing
        },
        query: snapshot.active_query.clone(),
        pages_loaded,
        has_more: snapshot.has_more,
        end_of_listing: snapshot.end_of_listing(),
        listing_phase: snapshot.listing_phase,
        search_phase: snapshot.search_phase,
        notification: snapshot.notification(),
        results: snapshot.visible_records(),
    }
}
