//! Command-line interface definitions for News Update.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets and endpoints can be provided via command-line flags, environment
//! variables or the YAML config file (see [`crate::config`]); flags and
//! environment win over the file.

use clap::{Args, Parser, Subcommand};

/// Command-line arguments for the News Update application.
///
/// # Examples
///
/// ```sh
/// # Run the proxy on the default port (3001)
/// NEWS_API_KEY=... news_update serve
///
/// # Read sports headlines through a running proxy, three pages at most
/// news_update browse --category sports --max-pages 3
///
/// # Fact-check a claim
/// news_update factcheck "The moon landing happened in 1969"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, global = true, env = "NEWS_UPDATE_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the headline proxy server
    Serve(ServeArgs),
    /// Read headlines page by page through a running proxy
    Browse(BrowseArgs),
    /// Fact-check a headline or claim
    Factcheck(FactcheckArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "NEWS_UPDATE_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// NewsAPI key forwarded with every upstream request
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Upstream top-headlines endpoint
    #[arg(long, env = "NEWS_API_URL")]
    pub upstream_url: Option<String>,

    #[command(flatten)]
    pub factcheck: FactcheckKeys,
}

#[derive(Args, Debug, Default)]
pub struct FactcheckKeys {
    /// Google Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Serper web search API key
    #[arg(long, env = "SERPER_API_KEY", hide_env_values = true)]
    pub serper_api_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct BrowseArgs {
    /// Base URL of the proxy server
    #[arg(long, env = "PROXY_URL")]
    pub proxy_url: Option<String>,

    /// Region code
    #[arg(long, default_value = "us")]
    pub country: String,

    /// Headline category
    #[arg(long, default_value = "general")]
    pub category: String,

    /// Headlines per page
    #[arg(long, default_value_t = 8)]
    pub page_size: u32,

    /// Stop after this many pages even if more are available
    #[arg(long, default_value_t = 5)]
    pub max_pages: u32,
}

#[derive(Args, Debug)]
pub struct FactcheckArgs {
    /// The headline or claim to check
    pub claim: String,

    #[command(flatten)]
    pub keys: FactcheckKeys,
}
