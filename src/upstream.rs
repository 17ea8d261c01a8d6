//! Client for the upstream headlines API.
//!
//! The proxy forwards each incoming request as exactly one upstream call: no
//! retries, no caching. The upstream payload is kept as a raw
//! [`serde_json::Value`] so it can be relayed to the caller verbatim.

use crate::error::ProxyError;
use crate::models::NewsQuery;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// `User-Agent` sent upstream. NewsAPI rejects requests that carry none.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Thin client around the `top-headlines` endpoint.
#[derive(Clone)]
pub struct NewsApiClient {
    http: Client,
    endpoint: Url,
    api_key: String,
}

impl fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl NewsApiClient {
    pub fn new(endpoint: Url, api_key: String) -> Result<Self, reqwest::Error> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    /// Full upstream URL for `query`, credential included.
    pub fn request_url(&self, query: &NewsQuery) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("country", &query.country)
            .append_pair("category", &query.category)
            .append_pair("apiKey", &self.api_key)
            .append_pair("page", &query.page.to_string())
            .append_pair("pageSize", &query.pageSize.to_string());
        url
    }

    /// Fetch one page of top headlines.
    ///
    /// Returns the upstream JSON untouched on success. An upstream body with
    /// `"status": "error"` becomes [`ProxyError::Upstream`] carrying its
    /// `message`; a failed call or a non-JSON body becomes
    /// [`ProxyError::Transport`] or [`ProxyError::Decode`].
    #[instrument(level = "info", skip_all, fields(country = %query.country, category = %query.category, page = query.page, page_size = query.pageSize))]
    pub async fn top_headlines(&self, query: &NewsQuery) -> Result<Value, ProxyError> {
        // The request URL carries the key; keep it out of error text.
        let response = self
            .http
            .get(self.request_url(query))
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        let body = response.bytes().await.map_err(reqwest::Error::without_url)?;
        debug!(%status, bytes = body.len(), "Upstream responded");

        let data: Value = serde_json::from_slice(&body)?;

        if data.get("status").and_then(Value::as_str) == Some("error") {
            let message = data
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);
            warn!(%status, message = message.as_deref().unwrap_or(""), "Upstream reported an error");
            return Err(ProxyError::Upstream(message));
        }

        let total_results = data.get("totalResults").and_then(Value::as_u64);
        info!(%status, total_results, "Relaying upstream headlines");
        Ok(data)
    }
}
