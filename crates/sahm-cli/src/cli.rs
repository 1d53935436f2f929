//! CLI argument definitions for sahm.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `list` | Fetch one page of the ticker listing |
//! | `search` | Relevance-ranked ticker search |
//! | `explore` | Drive the explore controller over several pages |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--base-url` | env / `https://api.polygon.io` | Upstream base URL |
//! | `--timeout-ms` | `10000` | Request timeout in ms |
//! | `--offline` | `false` | Serve the built-in NASDAQ catalog |
//! | `--no-cache` | `false` | Disable the response cache |
//! | `-v` | off | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! sahm list --exchange XNAS --limit 50 --format table
//! sahm search apple --limit 5 --pretty
//! sahm explore --pages 3 --offline
//! sahm explore --query micro --offline --format table
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Sahm - NASDAQ stock explorer
#[derive(Debug, Parser)]
#[command(
    name = "sahm",
    author,
    version,
    about = "NASDAQ stock explorer",
    long_about = "Browse and search the reference ticker listing with cursor pagination, \
relevance-ranked search and a shared response cache.\n\
\n\
The API key is read from SAHM_POLYGON_API_KEY (or POLYGON_API_KEY).\n\
Use 'sahm <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Override the upstream base URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Serve requests from the built-in offline catalog.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Do not cache responses.
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    /// Log debug events to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Text table for terminal display.
    Table,
    /// Single JSON envelope.
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch one page of the ticker listing.
    ///
    /// # Examples
    ///
    ///   sahm list --exchange XNAS
    ///   sahm list --search bank --type CS --limit 50
    ///   sahm list --cursor <next_cursor from a previous page>
    List(ListArgs),

    /// Relevance-ranked ticker search.
    ///
    /// Queries shorter than two characters return no results.
    ///
    /// # Examples
    ///
    ///   sahm search apple
    ///   sahm search msft --limit 5
    Search(SearchArgs),

    /// Load the explore screen: the listing plus optional search.
    ///
    /// # Examples
    ///
    ///   sahm explore --pages 3
    ///   sahm explore --query nvidia
    Explore(ExploreArgs),
}

/// Arguments for the `list` command.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Upstream text filter on ticker or name.
    #[arg(long)]
    pub search: Option<String>,

    /// Primary exchange MIC (e.g., XNAS).
    #[arg(long)]
    pub exchange: Option<String>,

    /// Ticker type code (e.g., CS, ETF).
    #[arg(long = "type")]
    pub ticker_type: Option<String>,

    /// Market (default: stocks).
    #[arg(long)]
    pub market: Option<String>,

    /// Page size, clamped to 100.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Continuation cursor from a previous page.
    #[arg(long)]
    pub cursor: Option<String>,

    /// Sort field (default: ticker).
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort order: asc or desc.
    #[arg(long)]
    pub order: Option<String>,

    /// List inactive tickers instead of active ones.
    #[arg(long, default_value_t = false)]
    pub inactive: bool,
}

/// Arguments for the `search` command.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Ticker or company name fragment.
    pub query: String,

    /// Maximum number of results to return.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

/// Arguments for the `explore` command.
#[derive(Debug, Args)]
pub struct ExploreArgs {
    /// Number of listing pages to load.
    #[arg(long, default_value_t = 1)]
    pub pages: usize,

    /// Run a debounced search and show its results instead of the listing.
    #[arg(long)]
    pub query: Option<String>,

    /// Listing page size.
    #[arg(long, default_value_t = 20)]
    pub page_size: usize,
}
