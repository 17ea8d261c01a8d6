//! Runtime configuration.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! CLI flags and environment variables (handled by clap in [`crate::cli`]).
//! The NewsAPI key is never compiled in; serving without one is a startup
//! error.
//!
//! # Example config.yaml
//!
//! ```yaml
//! port: 3001
//! news_api_key: "..."
//! upstream_url: "https://newsapi.org/v2/top-headlines"
//! proxy_url: "http://localhost:3001"
//! gemini_api_key: "..."
//! serper_api_key: "..."
//! ```

use crate::cli::{FactcheckKeys, ServeArgs};
use crate::error::ConfigError;
use serde::Deserialize;
use std::net::SocketAddr;
use tokio::fs;
use tracing::{debug, info, instrument};
use url::Url;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_UPSTREAM_URL: &str = "https://newsapi.org/v2/top-headlines";
pub const DEFAULT_PROXY_URL: &str = "http://localhost:3001";
pub const DEFAULT_SERPER_URL: &str = "https://google.serper.dev/search";
pub const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// Contents of the optional YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub news_api_key: Option<String>,
    pub upstream_url: Option<String>,
    pub proxy_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub serper_api_key: Option<String>,
    pub serper_url: Option<String>,
    pub gemini_url: Option<String>,
}

impl FileConfig {
    /// Parse a config file body.
    pub fn from_yaml(path: &str, body: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes to `null`, which we treat as "all defaults".
        if body.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(body).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

/// Load the config file at `path`, or defaults when no path was given.
#[instrument(level = "info")]
pub async fn load_file(path: Option<&str>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        debug!("No config file given; using defaults");
        return Ok(FileConfig::default());
    };
    let body = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
    let config = FileConfig::from_yaml(path, &body)?;
    info!(path, "Loaded configuration");
    Ok(config)
}

/// Keys and endpoints used by the fact-check service.
#[derive(Debug, Clone)]
pub struct FactCheckSettings {
    pub gemini_api_key: Option<String>,
    pub serper_api_key: Option<String>,
    pub serper_url: Url,
    pub gemini_url: Url,
}

impl FactCheckSettings {
    pub fn resolve(keys: &FactcheckKeys, file: &FileConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            gemini_api_key: keys
                .gemini_api_key
                .clone()
                .or_else(|| file.gemini_api_key.clone()),
            serper_api_key: keys
                .serper_api_key
                .clone()
                .or_else(|| file.serper_api_key.clone()),
            serper_url: parse_url(
                "serper_url",
                file.serper_url.as_deref().unwrap_or(DEFAULT_SERPER_URL),
            )?,
            gemini_url: parse_url(
                "gemini_url",
                file.gemini_url.as_deref().unwrap_or(DEFAULT_GEMINI_URL),
            )?,
        })
    }
}

/// Everything the proxy server needs to start.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub news_api_key: String,
    pub upstream_url: Url,
    pub factcheck: FactCheckSettings,
}

impl ServerSettings {
    /// Merge CLI/env values over the config file and defaults.
    pub fn resolve(args: &ServeArgs, file: &FileConfig) -> Result<Self, ConfigError> {
        let host = args
            .host
            .as_deref()
            .or(file.host.as_deref())
            .unwrap_or(DEFAULT_HOST);
        let port = args.port.or(file.port).unwrap_or(DEFAULT_PORT);
        let addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .or_else(|_| format!("[{host}]:{port}").parse::<SocketAddr>())
            .map_err(|_| ConfigError::InvalidAddress(format!("{host}:{port}")))?;

        let news_api_key = args
            .api_key
            .clone()
            .or_else(|| file.news_api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let upstream_url = parse_url(
            "upstream_url",
            args.upstream_url
                .as_deref()
                .or(file.upstream_url.as_deref())
                .unwrap_or(DEFAULT_UPSTREAM_URL),
        )?;

        Ok(Self {
            addr,
            news_api_key,
            upstream_url,
            factcheck: FactCheckSettings::resolve(&args.factcheck, file)?,
        })
    }
}

/// Base URL of the proxy the reader talks to.
pub fn resolve_proxy_url(flag: Option<&str>, file: &FileConfig) -> Result<Url, ConfigError> {
    parse_url(
        "proxy_url",
        flag.or(file.proxy_url.as_deref()).unwrap_or(DEFAULT_PROXY_URL),
    )
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { field, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve_args() -> ServeArgs {
        ServeArgs::default()
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = ServerSettings::resolve(&serve_args(), &FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_blank_api_key_is_rejected() {
        let mut args = serve_args();
        args.api_key = Some("  ".to_string());
        let err = ServerSettings::resolve(&args, &FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_defaults_apply() {
        let mut args = serve_args();
        args.api_key = Some("k".to_string());
        let settings = ServerSettings::resolve(&args, &FileConfig::default()).unwrap();

        assert_eq!(settings.addr.port(), 3001);
        assert_eq!(settings.upstream_url.as_str(), DEFAULT_UPSTREAM_URL);
        assert_eq!(settings.factcheck.serper_url.as_str(), DEFAULT_SERPER_URL);
        assert!(settings.factcheck.gemini_api_key.is_none());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig::from_yaml(
            "test.yaml",
            "port: 5000\nnews_api_key: from-file\nserper_api_key: serper-file\n",
        )
        .unwrap();

        let mut args = serve_args();
        args.port = Some(6000);
        let settings = ServerSettings::resolve(&args, &file).unwrap();

        assert_eq!(settings.addr.port(), 6000);
        assert_eq!(settings.news_api_key, "from-file");
        assert_eq!(settings.factcheck.serper_api_key.as_deref(), Some("serper-file"));
    }

    #[test]
    fn test_ipv6_host() {
        let mut args = serve_args();
        args.api_key = Some("k".to_string());
        args.host = Some("::1".to_string());
        let settings = ServerSettings::resolve(&args, &FileConfig::default()).unwrap();
        assert!(settings.addr.is_ipv6());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let file = FileConfig::from_yaml("empty.yaml", "\n").unwrap();
        assert!(file.port.is_none());
    }

    #[test]
    fn test_unknown_yaml_key_is_rejected() {
        let err = FileConfig::from_yaml("bad.yaml", "prot: 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_invalid_upstream_url() {
        let mut args = serve_args();
        args.api_key = Some("k".to_string());
        args.upstream_url = Some("not a url".to_string());
        let err = ServerSettings::resolve(&args, &FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { field: "upstream_url", .. }));
    }

    #[test]
    fn test_proxy_url_default() {
        let url = resolve_proxy_url(None, &FileConfig::default()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/");
    }

    #[tokio::test]
    async fn test_load_missing_file_errors() {
        let err = load_file(Some("/definitely/not/here.yaml")).await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
