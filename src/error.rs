//! Error types for the proxy, the page loader and configuration loading.
//!
//! Each layer gets its own enum so callers can match on what they can act on:
//!
//! - [`ProxyError`]: failures while serving an HTTP request. Converts straight
//!   into an axum response with the status code and `{"error": ...}` body the
//!   front-end expects.
//! - [`LoaderError`]: failures while fetching or decoding a page. The loader
//!   logs and absorbs these; they never reach the view.
//! - [`ConfigError`]: fatal startup problems.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Generic message returned to clients whenever the upstream call itself failed.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch news";

/// Failure while handling a proxy request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream answered with `status: "error"`. Carries its message, if any.
    #[error("upstream rejected request: {}", .0.as_deref().unwrap_or("<no message>"))]
    Upstream(Option<String>),

    /// The upstream call never produced a response.
    #[error("upstream transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream responded but the body was not JSON.
    #[error("upstream body was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The incoming request itself was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),
}

/// JSON body for every error response: `{"error": "..."}`.
///
/// `error` is skipped when absent so an upstream error without a message is
/// relayed as `{}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProxyError {
    /// HTTP status the error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Upstream(_) | ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Transport(_) | ProxyError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ProxyError::Upstream(message) => ErrorBody { error: message },
            ProxyError::BadRequest(message) => ErrorBody {
                error: Some(message),
            },
            ProxyError::Transport(ref e) => {
                error!(error = %e, "Error fetching news");
                ErrorBody {
                    error: Some(FETCH_FAILED_MESSAGE.to_string()),
                }
            }
            ProxyError::Decode(ref e) => {
                error!(error = %e, "Error fetching news");
                ErrorBody {
                    error: Some(FETCH_FAILED_MESSAGE.to_string()),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Failure while the loader fetches a page.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The page source could not produce a body.
    #[error("page source failed: {0}")]
    Source(String),

    /// The body did not decode as a headline page.
    #[error("page body did not decode: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for LoaderError {
    fn from(e: reqwest::Error) -> Self {
        LoaderError::Source(e.to_string())
    }
}

/// Fatal configuration problem found at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// No NewsAPI key was supplied by CLI, environment or config file.
    #[error("no news API key configured (set NEWS_API_KEY, --api-key or `news_api_key` in the config file)")]
    MissingApiKey,

    #[error("invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("invalid URL for {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
}
