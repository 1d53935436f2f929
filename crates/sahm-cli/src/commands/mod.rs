mod explore;
mod list;
mod search;

use std::sync::Arc;
use std::time::{Duration, Instant};

use sahm_core::{
    CacheStore, ClientConfig, ClientError, Envelope, EnvelopeError, EnvelopeMeta,
    FixtureHttpClient, HttpClient, ReqwestHttpClient, StockClient,
};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::{client_exit_code, CliError};

/// Credential used against the offline catalog when none is configured.
const OFFLINE_API_KEY: &str = "offline";

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<ClientError>,
    pub latency_ms: u64,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_error(mut self, error: ClientError) -> Self {
        self.errors.push(error);
        self
    }

    pub fn with_latency(mut self, started: Instant) -> Self {
        self.latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Rendered envelope plus the process exit code it implies.
pub struct CommandOutcome {
    pub envelope: Envelope<Value>,
    pub exit_code: u8,
}

pub async fn run(cli: &Cli) -> Result<CommandOutcome, CliError> {
    let client = build_client(cli)?;

    let command_result = match &cli.command {
        Command::List(args) => list::run(args, &client).await?,
        Command::Search(args) => search::run(args, &client).await?,
        Command::Explore(args) => explore::run(args, &client).await?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        latency_ms,
    } = command_result;

    let exit_code = errors.iter().map(client_exit_code).max().unwrap_or(0);

    let mut meta = EnvelopeMeta::new(client.cache_stats().await, latency_ms);
    if cli.offline {
        meta.push_warning("offline mode: results come from the built-in catalog");
    }
    for warning in warnings {
        meta.push_warning(warning);
    }

    let errors = errors.iter().map(EnvelopeError::from).collect();
    Ok(CommandOutcome {
        envelope: Envelope::with_errors(meta, data, errors),
        exit_code,
    })
}

fn build_client(cli: &Cli) -> Result<StockClient, CliError> {
    if cli.timeout_ms == 0 {
        return Err(CliError::Command(String::from(
            "--timeout-ms must be greater than zero",
        )));
    }

    let mut config = ClientConfig::from_env().with_timeout(Duration::from_millis(cli.timeout_ms));
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.as_str())?;
    }

    let http_client: Arc<dyn HttpClient> = if cli.offline {
        if !config.has_api_key() {
            config = config.with_api_key(OFFLINE_API_KEY);
        }
        Arc::new(FixtureHttpClient::default())
    } else {
        Arc::new(ReqwestHttpClient::new())
    };

    let cache = if cli.no_cache {
        CacheStore::disabled()
    } else {
        CacheStore::new(config.default_ttl)
    };

    tracing::debug!(offline = cli.offline, cache = !cli.no_cache, ?config, "client configured");
    Ok(StockClient::with_cache(config, http_client, cache))
}
