//! Heifer - query the Heifer livestock data service
//!
//! Prints the records matching a query predicate as JSON. Responses can be
//! recorded to a cache file and replayed later without a network connection.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use heifer::cli::{CacheMode, Cli, StartupConfig};
use heifer::HeiferClient;

/// Sends log output to stderr so stdout only carries the records
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs one query and prints the matching records
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StartupConfig::from_cli(&cli)?;

    let mut client = HeiferClient::with_config(config.client)?;

    match &config.cache {
        CacheMode::Live => {}
        CacheMode::Replay(path) => client.go_replay(path)?,
        CacheMode::Record { path, pattern } => {
            // Append to an existing recording rather than replacing it
            if path.exists() {
                client.load_cache(path)?;
            }
            client.begin_edit(*pattern);
        }
    }

    let result = client.get_heifer_information(&config.query).await;

    // Keep whatever was recorded even if parsing failed afterwards
    if let CacheMode::Record { path, .. } = &config.cache {
        client.end_edit();
        client.save_cache(path)?;
    }

    let heifers = result?;
    println!("{}", serde_json::to_string_pretty(&heifers)?);

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
