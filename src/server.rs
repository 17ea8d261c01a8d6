//! Axum HTTP surface of the proxy.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /api/news` | one upstream `top-headlines` call, relayed verbatim |
//! | `POST /api/factcheck` | run a fact-check on `{"claim": ...}` |
//! | `GET /health` | fixed liveness payload |
//!
//! All routes allow any origin; the browser front-end is served separately.

use crate::config::ServerSettings;
use crate::error::ProxyError;
use crate::factcheck::{FactCheckReport, FactCheckRequest, FactChecker};
use crate::models::{HealthStatus, NewsQuery};
use crate::upstream::NewsApiClient;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::error::Error;
use tower_http::cors::CorsLayer;
use tracing::{info, instrument};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub news: NewsApiClient,
    pub factcheck: FactChecker,
}

impl AppState {
    pub fn from_settings(settings: &ServerSettings) -> Result<Self, reqwest::Error> {
        Ok(Self {
            news: NewsApiClient::new(settings.upstream_url.clone(), settings.news_api_key.clone())?,
            factcheck: FactChecker::new(settings.factcheck.clone()),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/news", get(api_news))
        .route("/api/factcheck", post(api_factcheck))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
#[instrument(level = "info", skip_all, fields(addr = %settings.addr))]
pub async fn serve(settings: ServerSettings) -> Result<(), Box<dyn Error>> {
    let state = AppState::from_settings(&settings)?;
    let listener = tokio::net::TcpListener::bind(settings.addr).await?;
    info!(addr = %listener.local_addr()?, "Server is running");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn api_news(
    State(state): State<AppState>,
    query: Result<Query<NewsQuery>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Query(query) = query.map_err(|rejection| ProxyError::BadRequest(rejection.body_text()))?;
    let data = state.news.top_headlines(&query).await?;
    Ok(Json(data))
}

async fn api_factcheck(
    State(state): State<AppState>,
    Json(request): Json<FactCheckRequest>,
) -> Result<Json<FactCheckReport>, ProxyError> {
    let claim = request.claim.trim();
    if claim.is_empty() {
        return Err(ProxyError::BadRequest("claim must not be empty".to_string()));
    }
    Ok(Json(state.factcheck.check(claim).await))
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FactCheckSettings;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Start the proxy on an ephemeral port, pointed at `upstream`.
    async fn spawn_proxy(upstream: &str) -> String {
        let state = AppState {
            news: NewsApiClient::new(
                Url::parse(&format!("{upstream}/v2/top-headlines")).unwrap(),
                "test-key".to_string(),
            )
            .unwrap(),
            factcheck: FactChecker::new(FactCheckSettings {
                gemini_api_key: None,
                serper_api_key: None,
                serper_url: Url::parse(&format!("{upstream}/search")).unwrap(),
                gemini_url: Url::parse(&format!("{upstream}/gemini")).unwrap(),
            }),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_health() {
        let upstream = MockServer::start().await;
        let base = spawn_proxy(&upstream.uri()).await;

        let response = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"status": "OK", "message": "Server is running"}));
    }

    #[tokio::test]
    async fn test_news_defaults_forwarded_once() {
        let upstream = MockServer::start().await;
        let payload = json!({"status": "ok", "totalResults": 0, "articles": []});
        Mock::given(method("GET"))
            .and(path("/v2/top-headlines"))
            .and(query_param("country", "us"))
            .and(query_param("category", "general"))
            .and(query_param("page", "1"))
            .and(query_param("pageSize", "8"))
            .and(query_param("apiKey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
            .expect(1)
            .mount(&upstream)
            .await;
        let base = spawn_proxy(&upstream.uri()).await;

        let response = reqwest::get(format!("{base}/api/news")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.json::<Value>().await.unwrap(), payload);
    }

    #[tokio::test]
    async fn test_news_forwards_filter() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("country", "in"))
            .and(query_param("category", "sports"))
            .and(query_param("page", "2"))
            .and(query_param("pageSize", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&upstream)
            .await;
        let base = spawn_proxy(&upstream.uri()).await;

        let response = reqwest::get(format!(
            "{base}/api/news?country=in&category=sports&page=2&pageSize=5"
        ))
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_paging_is_json_400_without_upstream_call() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(0)
            .mount(&upstream)
            .await;
        let base = spawn_proxy(&upstream.uri()).await;

        for query in ["page=abc", "pageSize=", "page=-1"] {
            let response = reqwest::get(format!("{base}/api/news?{query}")).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{query}");
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            assert!(content_type.starts_with("application/json"), "{query}: {content_type}");
            let body: Value = response.json().await.unwrap();
            assert!(body["error"].as_str().is_some_and(|m| !m.is_empty()), "{query}: {body}");
        }
    }

    #[tokio::test]
    async fn test_upstream_error_is_400_with_message() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "status": "error",
                "code": "rateLimited",
                "message": "You have made too many requests recently."
            })))
            .expect(1)
            .mount(&upstream)
            .await;
        let base = spawn_proxy(&upstream.uri()).await;

        let response = reqwest::get(format!("{base}/api/news")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>().await.unwrap(),
            json!({"error": "You have made too many requests recently."})
        );
    }

    #[tokio::test]
    async fn test_upstream_garbage_is_500() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&upstream)
            .await;
        let base = spawn_proxy(&upstream.uri()).await;

        let response = reqwest::get(format!("{base}/api/news")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json::<Value>().await.unwrap(),
            json!({"error": "Failed to fetch news"})
        );
    }

    #[tokio::test]
    async fn test_upstream_unreachable_is_500() {
        let dead = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };
        let base = spawn_proxy(&dead).await;

        let response = reqwest::get(format!("{base}/api/news")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json::<Value>().await.unwrap(),
            json!({"error": "Failed to fetch news"})
        );
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let upstream = MockServer::start().await;
        let base = spawn_proxy(&upstream.uri()).await;

        let response = reqwest::Client::new()
            .get(format!("{base}/health"))
            .header("Origin", "http://localhost:3000")
            .send()
            .await
            .unwrap();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    #[tokio::test]
    async fn test_factcheck_rejects_empty_claim() {
        let upstream = MockServer::start().await;
        let base = spawn_proxy(&upstream.uri()).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/api/factcheck"))
            .json(&json!({"claim": "   "}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>().await.unwrap(),
            json!({"error": "claim must not be empty"})
        );
    }

    #[tokio::test]
    async fn test_factcheck_without_keys_reports_configuration_error() {
        let upstream = MockServer::start().await;
        let base = spawn_proxy(&upstream.uri()).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/api/factcheck"))
            .json(&json!({"claim": "Cats can fly"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report: FactCheckReport = response.json().await.unwrap();
        assert_eq!(report.final_verdict, "Configuration Error");
    }
}
