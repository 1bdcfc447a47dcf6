//! Warehouse client - query and update the warehouse backend
//!
//! A command-line front end over the library's API client and storage layers.

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use serde_json::{Map, Value};
use warehouse::cli::{parse_json_arg, Cli, CliError, Command, LogFormat, StoreAction};
use warehouse::config::storage_keys;
use warehouse::{dashboard, ApiClient, DurableStore, RequestOptions};

/// Initialise `tracing` on stderr; `RUST_LOG` overrides the default `warn` filter
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_store(cli: &Cli) -> Result<DurableStore, CliError> {
    match &cli.data_dir {
        Some(dir) => Ok(DurableStore::with_dir(dir.clone())),
        None => DurableStore::new().ok_or(CliError::NoDataDir),
    }
}

fn run_store(cli: &Cli, action: &StoreAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(cli)?;
    match action {
        StoreAction::Show => {
            let items: Map<String, Value> = storage_keys::ALL
                .iter()
                .map(|key| (key.to_string(), store.get_item_or(key, Value::Null)))
                .collect();
            print_json(&items)?;
        }
        StoreAction::Get { key } => {
            let value: Value = store.get_item_or(key, Value::Null);
            print_json(&value)?;
        }
        StoreAction::Set { key, value } => {
            let value = parse_json_arg("value", value)?;
            store.set_item(key, &value)?;
        }
        StoreAction::Remove { key } => store.remove_item(key)?,
        StoreAction::Clear => store.clear()?,
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let client = || ApiClient::new(cli.client_config());

    match &cli.command {
        Command::Get { path } => {
            let options = if cli.no_cache {
                RequestOptions::get().no_cache()
            } else {
                RequestOptions::get()
            };
            let payload = client()?.request(path, options).await?;
            print_json(&payload)?;
        }
        Command::Post {
            path,
            body,
            invalidate,
        } => {
            let body = parse_json_arg("body", body)?;
            let options = invalidate
                .iter()
                .fold(RequestOptions::post(body), |options, stale| {
                    options.invalidate(stale.clone())
                });
            let payload = client()?.request(path, options).await?;
            print_json(&payload)?;
        }
        Command::Dashboard => {
            let summary = dashboard::refresh(&client()?).await?;
            print_json(&summary)?;
        }
        Command::Store { action } => run_store(&cli, action)?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Backend messages are user-facing; print them as-is
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
