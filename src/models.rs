//! Data models for headlines, headline pages and proxy request/response bodies.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: a single headline as returned by the news API
//! - [`HeadlinePage`]: one page of headlines plus the reported total
//! - [`NewsQuery`]: the filter parameters accepted by `GET /api/news`
//! - [`HealthStatus`]: the liveness payload
//!
//! The models use camelCase field names to match the news API's JSON schema,
//! hence the `#[allow(non_snake_case)]` attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default region code when a request leaves `country` out.
pub const DEFAULT_COUNTRY: &str = "us";
/// Default category when a request leaves `category` out.
pub const DEFAULT_CATEGORY: &str = "general";
/// Default page size when a request leaves `pageSize` out.
pub const DEFAULT_PAGE_SIZE: u32 = 8;

/// The outlet an article was published by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleSource {
    /// Machine identifier of the outlet, if the API knows one.
    pub id: Option<String>,
    /// Display name of the outlet.
    pub name: Option<String>,
}

/// A single headline as received from the news API.
///
/// Every field is optional. `url` doubles as the display key of the article,
/// but a headline without one is still shown. Articles are never modified
/// after they are received.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    #[serde(default)]
    pub source: ArticleSource,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Link to the full story.
    #[serde(default)]
    pub url: Option<String>,
    /// Lead image, when the story has one.
    pub urlToImage: Option<String>,
    /// Publication timestamp as sent by the API (ISO 8601).
    pub publishedAt: Option<String>,
    pub content: Option<String>,
}

impl Article {
    pub fn display_title(&self) -> &str {
        non_empty(self.title.as_deref()).unwrap_or("No Title Available")
    }

    pub fn display_description(&self) -> &str {
        non_empty(self.description.as_deref()).unwrap_or("No Description Available")
    }

    pub fn display_author(&self) -> &str {
        non_empty(self.author.as_deref()).unwrap_or("Unknown")
    }

    pub fn link(&self) -> Option<&str> {
        non_empty(self.url.as_deref())
    }

    pub fn image(&self) -> Option<&str> {
        non_empty(self.urlToImage.as_deref())
    }

    pub fn source_name(&self) -> &str {
        non_empty(self.source.name.as_deref()).unwrap_or("Unknown source")
    }

    /// Publication date rendered as RFC 2822, e.g. `Tue, 6 May 2025 14:30:00 +0000`.
    ///
    /// Falls back to the raw string when it does not parse, and to `None` when
    /// the API sent no date at all.
    pub fn display_date(&self) -> Option<String> {
        let raw = non_empty(self.publishedAt.as_deref())?;
        Some(match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => ts.with_timezone(&Utc).to_rfc2822(),
            Err(_) => raw.to_string(),
        })
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// One page of headlines as reported by the source.
///
/// `articles` and `totalResults` are both optional on the wire; the loader
/// treats a missing article list as empty and a missing total as "not
/// reported".
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HeadlinePage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totalResults: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub articles: Option<Vec<Article>>,
}

/// Filter parameters accepted by `GET /api/news`.
///
/// Each field falls back to its default when the query string leaves it out:
/// `country=us`, `category=general`, `page=1`, `pageSize=8`.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsQuery {
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub pageSize: u32,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            country: default_country(),
            category: default_category(),
            page: default_page(),
            pageSize: default_page_size(),
        }
    }
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Liveness payload returned by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
            message: "Server is running".to_string(),
        }
    }
}
