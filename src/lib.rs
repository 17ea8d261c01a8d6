//! # News Update
//!
//! A headline proxy in front of a third-party news API, plus the pieces that
//! consume it.
//!
//! - [`server`]: axum routes `GET /api/news`, `POST /api/factcheck`, `GET /health`
//! - [`upstream`]: the single-attempt client for the news API
//! - [`loader`]: the paged collection loader behind infinite scrolling
//! - [`reader`]: a terminal view that drives the loader against a proxy
//! - [`factcheck`]: claim checking via web search and a Gemini model
//! - [`config`], [`cli`], [`error`], [`models`], [`utils`]: shared plumbing

pub mod cli;
pub mod config;
pub mod error;
pub mod factcheck;
pub mod loader;
pub mod models;
pub mod reader;
pub mod server;
pub mod upstream;
pub mod utils;
