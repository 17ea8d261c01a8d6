//! Headline fact-checking via web search and a Gemini model.
//!
//! A check runs in two steps:
//!
//! 1. **Search**: ask Serper for the top five web results for
//!    `"fact check {claim}"`. A failed search is logged and treated as "no
//!    results"; the analysis still runs.
//! 2. **Analyze**: send the claim and the result snippets to Gemini, asking
//!    for a `{"verdict": ..., "reasoning": ...}` object, and pull the first
//!    JSON object out of the reply.
//!
//! Every failure mode ends in a [`FactCheckReport`] with a descriptive
//! verdict rather than an error, so callers always have something to show.
//! Nothing is retried.

use crate::config::FactCheckSettings;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const ANALYZE_TIMEOUT: Duration = Duration::from_secs(30);
const SEARCH_RESULTS: usize = 5;
const SUPPORTING_ARTICLES: usize = 3;

/// Placeholder values shipped in sample `.env` files; treated as "not set".
const GEMINI_PLACEHOLDER: &str = "your_gemini_api_key_here";
const SERPER_PLACEHOLDER: &str = "your_serper_api_key_here";

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^}]+\}").expect("static regex is valid"));

/// One web search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// The outcome of a fact-check, returned by `POST /api/factcheck`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FactCheckReport {
    pub final_verdict: String,
    pub reasoning: String,
    pub supporting_articles: Vec<SearchResult>,
    pub sources_verified: usize,
    /// Wall-clock seconds spent on the check.
    pub execution_time: f64,
}

/// Body of `POST /api/factcheck`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FactCheckRequest {
    pub claim: String,
}

/// The model's answer, as parsed from its reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Analysis {
    pub verdict: Option<String>,
    pub reasoning: Option<String>,
}

impl Analysis {
    fn new(verdict: &str, reasoning: impl Into<String>) -> Self {
        Self {
            verdict: Some(verdict.to_string()),
            reasoning: Some(reasoning.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

/// Runs fact-checks against the configured search and model endpoints.
#[derive(Clone)]
pub struct FactChecker {
    http: Client,
    settings: FactCheckSettings,
}

impl std::fmt::Debug for FactChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactChecker")
            .field("serper_url", &self.settings.serper_url.as_str())
            .field("gemini_url", &self.settings.gemini_url.as_str())
            .finish_non_exhaustive()
    }
}

fn configured(key: Option<&str>, placeholder: &str) -> Option<String> {
    key.map(str::trim)
        .filter(|k| !k.is_empty() && *k != placeholder)
        .map(str::to_string)
}

impl FactChecker {
    pub fn new(settings: FactCheckSettings) -> Self {
        Self {
            http: Client::new(),
            settings,
        }
    }

    /// Check `claim` and always produce a report.
    #[instrument(level = "info", skip(self))]
    pub async fn check(&self, claim: &str) -> FactCheckReport {
        let started = Instant::now();

        let Some(gemini_key) = configured(self.settings.gemini_api_key.as_deref(), GEMINI_PLACEHOLDER)
        else {
            warn!("Gemini API key missing");
            return config_error("Gemini API key not configured. Please set GEMINI_API_KEY.", started);
        };
        let Some(serper_key) = configured(self.settings.serper_api_key.as_deref(), SERPER_PLACEHOLDER)
        else {
            warn!("Serper API key missing");
            return config_error("Serper API key not configured. Please set SERPER_API_KEY.", started);
        };

        let results = match self.search(claim, &serper_key).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "Search failed; analyzing without results");
                Vec::new()
            }
        };
        let analysis = self.analyze(claim, &results, &gemini_key).await;

        let report = FactCheckReport {
            final_verdict: analysis
                .verdict
                .unwrap_or_else(|| "Unable to determine".to_string()),
            reasoning: analysis
                .reasoning
                .unwrap_or_else(|| "Analysis could not be completed".to_string()),
            sources_verified: results.len(),
            supporting_articles: results.into_iter().take(SUPPORTING_ARTICLES).collect(),
            execution_time: started.elapsed().as_secs_f64(),
        };
        info!(
            verdict = %report.final_verdict,
            sources = report.sources_verified,
            elapsed_secs = report.execution_time,
            "Fact-check complete"
        );
        report
    }

    /// Top web results for the claim.
    #[instrument(level = "debug", skip_all)]
    pub async fn search(
        &self,
        claim: &str,
        api_key: &str,
    ) -> Result<Vec<SearchResult>, Box<dyn std::error::Error + Send + Sync>> {
        let response: SerperResponse = self
            .http
            .post(self.settings.serper_url.clone())
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": format!("fact check {claim}"), "num": SEARCH_RESULTS }))
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let results: Vec<SearchResult> = response.organic.into_iter().take(SEARCH_RESULTS).collect();
        debug!(count = results.len(), "Search results");
        Ok(results)
    }

    /// Ask the model for a verdict. Never fails; errors become an `"Error"` verdict.
    #[instrument(level = "debug", skip_all)]
    pub async fn analyze(&self, claim: &str, results: &[SearchResult], api_key: &str) -> Analysis {
        match self.generate(&build_prompt(claim, results), api_key).await {
            Ok(Some(text)) => parse_analysis(&text),
            Ok(None) => Analysis::new("Error", "No response from Gemini API"),
            // The request URL carries the key; keep it out of the report.
            Err(GenerateError::Http(e)) => {
                Analysis::new("Error", format!("API error: {}", e.without_url()))
            }
            Err(e) => Analysis::new("Error", format!("API error: {e}")),
        }
    }

    /// `Ok(None)` when the model returned no candidates at all.
    async fn generate(&self, prompt: &str, api_key: &str) -> Result<Option<String>, GenerateError> {
        let mut url = self.settings.gemini_url.clone();
        url.query_pairs_mut().append_pair("key", api_key);

        let response: GeminiResponse = self
            .http
            .post(url)
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .timeout(ANALYZE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(candidate) = response.candidates.into_iter().next() else {
            return Ok(None);
        };
        let text = candidate
            .content
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(GenerateError::MissingText)?;
        debug!(reply = %truncate_for_log(&text, 300), "Model replied");
        Ok(Some(text))
    }
}

#[derive(Debug, Error)]
enum GenerateError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("first candidate carried no content.parts[0].text")]
    MissingText,
}

fn config_error(reasoning: &str, started: Instant) -> FactCheckReport {
    FactCheckReport {
        final_verdict: "Configuration Error".to_string(),
        reasoning: reasoning.to_string(),
        supporting_articles: Vec::new(),
        sources_verified: 0,
        execution_time: started.elapsed().as_secs_f64(),
    }
}

/// The fact-checker prompt: the claim, the result snippets, and the expected
/// reply shape.
pub fn build_prompt(claim: &str, results: &[SearchResult]) -> String {
    let context: String = results
        .iter()
        .map(|r| format!("Title: {}\nSnippet: {}\n", r.title, r.snippet))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a professional fact-checker. Analyze the following claim and the search results provided.

Claim to fact-check: "{claim}"

Search Results:
{context}

Based on the search results, provide a fact-check analysis in the following JSON format:
{{
    "verdict": "True" | "False" | "Partially True" | "Misleading" | "Unverified",
    "reasoning": "Detailed explanation of your analysis and conclusion"
}}

Be thorough in your analysis and provide clear reasoning for your verdict.
"#
    )
}

/// Pull the first `{...}` object out of a model reply.
///
/// A reply with no object, or one that does not parse, is kept whole as the
/// reasoning under an `"Unverified"` verdict.
pub fn parse_analysis(text: &str) -> Analysis {
    let Some(found) = JSON_OBJECT.find(text) else {
        return Analysis::new("Unverified", text);
    };
    match serde_json::from_str::<Analysis>(found.as_str()) {
        Ok(analysis) => analysis,
        Err(e) => {
            debug!(error = %e, "Model reply held no parsable JSON object");
            Analysis::new("Unverified", text)
        }
    }
}
