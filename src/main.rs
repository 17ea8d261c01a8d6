//! # News Update
//!
//! Command-line entry point. Three subcommands share one configuration
//! layer:
//!
//! - `serve`: run the headline proxy (`GET /api/news`, `GET /health`,
//!   `POST /api/factcheck`)
//! - `browse`: read headlines page by page through a running proxy
//! - `factcheck`: check a single claim and print the report as JSON
//!
//! ## Usage
//!
//! ```sh
//! NEWS_API_KEY=... news_update serve --port 3001
//! news_update browse --category technology
//! news_update factcheck "Water boils at 100C at sea level"
//! ```

use clap::Parser;
use news_update::cli::{Cli, Command};
use news_update::config::{self, FactCheckSettings, ServerSettings};
use news_update::factcheck::FactChecker;
use news_update::{reader, server};
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args.config, "Parsed CLI arguments");

    let file = config::load_file(args.config.as_deref()).await?;

    match args.command {
        Command::Serve(serve_args) => {
            let settings = match ServerSettings::resolve(&serve_args, &file) {
                Ok(settings) => settings,
                Err(e) => {
                    error!(error = %e, "Invalid server configuration");
                    return Err(e.into());
                }
            };
            info!(addr = %settings.addr, upstream = %settings.upstream_url, "news_update server starting up");
            server::serve(settings).await?;
        }
        Command::Browse(browse_args) => {
            let proxy_url = config::resolve_proxy_url(browse_args.proxy_url.as_deref(), &file)?;
            reader::run(&browse_args, &proxy_url).await?;
        }
        Command::Factcheck(check_args) => {
            let settings = FactCheckSettings::resolve(&check_args.keys, &file)?;
            let report = FactChecker::new(settings).check(&check_args.claim).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
