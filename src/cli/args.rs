use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::models::SearchParams;
use crate::store::elastic::{DEFAULT_INDEX, DEFAULT_TIMEOUT_SECS, DEFAULT_URL};
use crate::store::ElasticConfig;

pub const DEFAULT_SERVE_ADDR: &str = "127.0.0.1:7979";

/// Top-level CLI entrypoint for `logsearch`.
#[derive(Parser, Debug)]
#[command(
    name = "logsearch",
    about = "Search registry application logs with boolean expressions",
    author = "logsearch developers",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search logs with a logic expression or free text.
    Search(SearchArgs),
    /// List log records oldest first, ignoring filters.
    Logs(LogsArgs),
    /// Run the HTTP+JSON daemon.
    Serve(ServeArgs),
    /// Create the log index if it does not exist yet.
    EnsureIndex,
}

/// Document store connection options shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct StoreArgs {
    /// Base URL of the Elasticsearch-compatible store.
    #[arg(long = "es-url", env = "LOGSEARCH_ES_URL", global = true)]
    pub es_url: Option<String>,

    /// Index holding the log documents.
    #[arg(long = "index", env = "LOGSEARCH_INDEX", global = true)]
    pub index: Option<String>,

    /// Per-request timeout against the store, in seconds.
    #[arg(long = "timeout-secs", global = true)]
    pub timeout_secs: Option<u64>,

    /// Basic-auth user name for the store.
    #[arg(long = "es-user", env = "LOGSEARCH_ES_USER", global = true)]
    pub username: Option<String>,

    /// Basic-auth password for the store.
    #[arg(
        long = "es-password",
        env = "LOGSEARCH_ES_PASSWORD",
        global = true,
        hide_env_values = true
    )]
    pub password: Option<String>,
}

/// Output format for log records.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments specific to the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Logic expression (e.g. `level:Error AND message:"timeout"`) or
    /// free text matched as a phrase prefix.
    pub query: Option<String>,

    /// Severity filter; separate several levels with commas.
    #[arg(long = "level")]
    pub level: Option<String>,

    /// Only entries at or after this timestamp (RFC 3339, or a date).
    #[arg(long = "from")]
    pub from: Option<String>,

    /// Only entries at or before this timestamp (RFC 3339, or a date).
    #[arg(long = "to")]
    pub to: Option<String>,

    /// Maximum number of records to return.
    #[arg(long = "size")]
    pub size: Option<usize>,

    /// Output format (text or json). Defaults to text.
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Print the composed store query as JSON instead of running it.
    #[arg(long = "print-query")]
    pub print_query: bool,
}

/// Arguments specific to the `logs` subcommand.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Maximum number of records to return (capped at 1000).
    #[arg(long = "size")]
    pub size: Option<usize>,

    /// Output format (text or json). Defaults to text.
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,
}

/// Arguments specific to the `serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long = "addr", default_value = DEFAULT_SERVE_ADDR)]
    pub addr: String,
}

pub fn search_params_from_args(args: &SearchArgs) -> SearchParams {
    SearchParams {
        query: args.query.clone(),
        level: args.level.clone(),
        from: args.from.clone(),
        to: args.to.clone(),
        size: args.size,
    }
}

pub fn store_config_from_args(args: &StoreArgs) -> ElasticConfig {
    ElasticConfig {
        url: args
            .es_url
            .clone()
            .unwrap_or_else(|| DEFAULT_URL.to_string()),
        index: args
            .index
            .clone()
            .unwrap_or_else(|| DEFAULT_INDEX.to_string()),
        timeout: Duration::from_secs(args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        username: args.username.clone(),
        password: args.password.clone(),
    }
}
