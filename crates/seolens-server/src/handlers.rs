//! Route handlers for the SEO tool API.
//!
//! Every handler catches its own failures and renders a JSON error
//! body; nothing propagates past the route boundary. User-visible
//! messages stay short and generic, diagnostic detail goes to the log
//! and, where the route contract includes it, a `details` field.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, Json, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tower_http::cors::CorsLayer;
use tracing::{error, warn};
use url::Url;

use seolens_core::{robots, seo, sitemap, structured_data, url_utils};

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/analyze-robots-txt", post(analyze_robots_txt))
        .route("/api/analyze-sitemap", post(analyze_sitemap))
        .route("/api/analyze-seo", post(analyze_seo))
        .route("/api/analyze-url", post(analyze_url))
        .route("/api/analyze-structured-data", post(analyze_structured_data))
        .route("/api/optimize-structured-data", post(optimize_structured_data))
        .route(
            "/api/validate-structured-data",
            post(validate_structured_data_route),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeUrlRequest {
    #[serde(default)]
    pub url: String,
    /// Selects the SEO-audit prompt instead of the generic analysis.
    #[serde(default)]
    pub audit: bool,
}

#[derive(Debug, Deserialize)]
pub struct StructuredDataRequest {
    #[serde(rename = "structuredData", default)]
    pub structured_data: JsonValue,
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub data: JsonValue,
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub async fn analyze_robots_txt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UrlRequest>,
) -> Response {
    match robots::fetch_robots_txt(&state.http, &req.url).await {
        Ok(content) => Json(json!({"content": content})).into_response(),
        Err(e) => {
            warn!("robots.txt fetch failed for {}: {e}", req.url);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process URL",
                Some(e.to_string()),
            )
        }
    }
}

pub async fn analyze_sitemap(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UrlRequest>,
) -> Response {
    let Some(domain) = url_utils::domain_of(&req.url) else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to process URL",
            Some("invalid URL".to_string()),
        );
    };

    let sitemaps = sitemap::discover_sitemaps(&state.http, &domain).await;
    Json(json!({"sitemaps": sitemaps})).into_response()
}

pub async fn analyze_seo(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UrlRequest>,
) -> Response {
    if req.url.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "URL is required", None);
    }

    match seo::analyze_page(&state.http, &req.url).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            warn!("SEO check failed for {}: {e}", req.url);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to fetch or analyze this URL. Please check if the URL is \
                 correct and accessible.",
                None,
            )
        }
    }
}

/// Streams the completion as a chunked `text/plain` body, in
/// generation order. Rate-limited per client IP before the upstream
/// call is made.
pub async fn analyze_url(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<AnalyzeUrlRequest>,
) -> Response {
    if req.url.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "URL is required", None);
    }

    if !state.limiter.lock().await.check(addr.ip()) {
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please try again later.",
            None,
        );
    }

    match state.llm.analyze_url_stream(&req.url, req.audit).await {
        Ok(stream) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Body::from_stream(stream))
            .unwrap_or_else(|_| {
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to analyze URL",
                    None,
                )
            }),
        Err(e) => {
            error!("URL analysis failed for {}: {e}", req.url);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to analyze URL",
                None,
            )
        }
    }
}

pub async fn analyze_structured_data(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StructuredDataRequest>,
) -> Response {
    match state.llm.critique_structured_data(&req.structured_data).await {
        Ok(analysis) => Json(json!({"analysis": analysis})).into_response(),
        Err(e) => {
            error!("structured data analysis failed: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to analyze structured data",
                None,
            )
        }
    }
}

pub async fn optimize_structured_data(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OptimizeRequest>,
) -> Response {
    match req.action.as_str() {
        "fetch-url" => {
            let candidate = req.data["url"].as_str().unwrap_or_default();
            // The fetch action requires an absolute URL as-is.
            if Url::parse(candidate).is_err() {
                return error_response(StatusCode::BAD_REQUEST, "Invalid URL format", None);
            }
            match seolens_core::fetch_text(&state.http, candidate).await {
                Ok(content) => Json(json!({"content": content})).into_response(),
                Err(e) => {
                    warn!("fetch-url failed for {candidate}: {e}");
                    process_error(e.to_string())
                }
            }
        }
        "optimize" => {
            let data = req.data.get("structuredData").cloned().unwrap_or(JsonValue::Null);
            match state.llm.optimize_structured_data(&data).await {
                Ok(optimization) => Json(json!({"optimization": optimization})).into_response(),
                Err(e) => {
                    error!("structured data optimization failed: {e}");
                    process_error(e.to_string())
                }
            }
        }
        "suggest" => {
            let content = req.data["content"].as_str().unwrap_or_default();
            match state.llm.suggest_structured_data(content).await {
                Ok(suggestion) => Json(json!({"suggestion": suggestion})).into_response(),
                Err(e) => {
                    error!("structured data suggestion failed: {e}");
                    process_error(e.to_string())
                }
            }
        }
        _ => error_response(StatusCode::BAD_REQUEST, "Invalid action", None),
    }
}

/// Validation endpoint for raw HTML or JSON-LD input; kept alongside
/// the AI routes so the structured-data tool can validate without a
/// round trip through the model.
pub async fn validate_structured_data_route(Json(req): Json<JsonValue>) -> Response {
    let input = req["structuredData"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| req["structuredData"].to_string());

    // The JSON-LD expansion future is not Send, so validation runs on
    // a blocking thread with its own entry into the runtime.
    let handle = tokio::runtime::Handle::current();
    let outcome = tokio::task::spawn_blocking(move || {
        handle.block_on(structured_data::validate_structured_data(&input))
    })
    .await;

    match outcome {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => {
            error!("structured data validation task failed: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to validate structured data",
                None,
            )
        }
    }
}

fn process_error(details: String) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to process request",
        Some(details),
    )
}

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let mut body = json!({"error": error});
    if let Some(details) = details {
        body["details"] = JsonValue::String(details);
    }
    (status, Json(body)).into_response()
}
