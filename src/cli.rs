//! Command-line interface parsing for the warehouse client
//!
//! Global flags configure the [`ApiClient`](crate::api::ApiClient); subcommands
//! map onto GET and POST calls, the dashboard refresh, and the durable store.

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ClientConfig;

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// A JSON argument did not parse
    #[error("Invalid JSON in {arg}: {source}")]
    InvalidJson {
        arg: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// No data directory was given and none could be determined
    #[error("Could not determine a data directory; pass --data-dir")]
    NoDataDir,
}

/// Output format for log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Warehouse client - query and update the warehouse backend
#[derive(Parser, Debug)]
#[command(name = "warehouse")]
#[command(about = "Warehouse backend client with response caching and retries")]
#[command(version)]
pub struct Cli {
    /// Backend endpoint URL
    #[arg(long, global = true, env = "WAREHOUSE_API_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Retries after the first attempt
    #[arg(long, global = true, value_name = "N")]
    pub retries: Option<u32>,

    /// Always go to the network for GET requests
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Fail on the first backend-reported error instead of retrying it
    #[arg(long, global = true)]
    pub no_retry_backend_errors: bool,

    /// Directory for the durable store (defaults to the platform data directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log output format (filter with RUST_LOG)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch an endpoint, e.g. `warehouse get katalog`
    Get {
        /// Logical path, optionally with extra parameters (`invoice&id=INV-1`)
        path: String,
    },

    /// Send a JSON object to an endpoint
    ///
    /// Example:
    ///   warehouse post update_status \
    ///     '{"type":"hutang","id":"H-1","status":"Lunas"}' --invalidate hutang
    Post {
        /// Logical path
        path: String,
        /// JSON object body
        body: String,
        /// Cached path to invalidate after success (repeatable)
        #[arg(long = "invalidate", value_name = "PATH")]
        invalidate: Vec<String>,
    },

    /// Load payables, receivables, inventory, and vendors and print a summary
    Dashboard,

    /// Inspect or modify the durable store
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// Print every well-known item (user, cart, last transaction)
    Show,
    /// Print a stored item
    Get { key: String },
    /// Store a JSON value under a key
    Set { key: String, value: String },
    /// Remove a stored item
    Remove { key: String },
    /// Remove every stored item
    Clear,
}

impl Cli {
    /// Builds the client configuration from the global flags
    pub fn client_config(&self) -> ClientConfig {
        let mut config = match &self.base_url {
            Some(url) => ClientConfig::new(url.clone()),
            None => ClientConfig::default(),
        };
        if let Some(retries) = self.retries {
            config = config.with_retries(retries);
        }
        config.with_retry_backend_errors(!self.no_retry_backend_errors)
    }
}

/// Parses a JSON command-line argument
///
/// # Arguments
/// * `arg` - Argument name, used in the error message
/// * `s` - The raw argument
pub fn parse_json_arg(arg: &'static str, s: &str) -> Result<Value, CliError> {
    serde_json::from_str(s).map_err(|source| CliError::InvalidJson { arg, source })
}
