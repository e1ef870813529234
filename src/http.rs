//! HTTP query layer.
//!
//! One read-only route per query operation plus health and cache management.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Service status and live cache size |
//! | `GET` | `/search?query=&max_results=` | Documentation search (1-50, default 10) |
//! | `GET` | `/search/api?query=&max_results=` | API reference search (1-50, default 10) |
//! | `GET` | `/api-reference/{class_name}` | Reference for one class |
//! | `GET` | `/examples/github?topic=&max_results=` | Code examples (1-20, default 5) |
//! | `GET` | `/tutorials?max_results=` | Tutorials (1-30, default 10) |
//! | `GET` | `/latest-version` | Latest package release |
//! | `DELETE` | `/cache` | Drop all cached responses |
//!
//! Errors are returned as `{"error": {"code": ..., "message": ...}}` with
//! status 404 for unknown classes, 422 for invalid parameters and 500 for
//! upstream failures.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{ApiReference, DocSearchResult, GitHubExample, TutorialInfo, VersionInfo};
use crate::service::{DocsService, ServiceError};

const SERVICE_NAME: &str = "LangChain Documentation Server";

type Params = HashMap<String, String>;

pub fn router(service: Arc<DocsService>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/search", get(handle_search))
        .route("/search/api", get(handle_search_api))
        .route("/api-reference/{class_name}", get(handle_api_reference))
        .route("/examples/github", get(handle_github_examples))
        .route("/tutorials", get(handle_tutorials))
        .route("/latest-version", get(handle_latest_version))
        .route("/cache", delete(handle_clear_cache))
        .with_state(service)
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            code: "validation_error",
            message: message.into(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => Self {
                status: StatusCode::NOT_FOUND,
                code: "not_found",
                message,
            },
            ServiceError::Upstream(message) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "upstream_error",
                message,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {}", self.message);
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Non-blank string parameter `name`.
fn required<'a>(params: &'a Params, name: &str) -> Result<&'a str, AppError> {
    params
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::unprocessable(format!("missing required parameter '{}'", name)))
}

/// Integer parameter `name` within `min..=max`, or `default` when absent.
fn bounded(params: &Params, name: &str, default: usize, min: usize, max: usize) -> Result<usize, AppError> {
    let Some(raw) = params.get(name) else {
        return Ok(default);
    };
    let value: usize = raw
        .trim()
        .parse()
        .map_err(|_| AppError::unprocessable(format!("'{}' must be an integer, got '{}'", name, raw)))?;
    if !(min..=max).contains(&value) {
        return Err(AppError::unprocessable(format!(
            "'{}' must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(value)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    cache_entries: usize,
    data_sources: Vec<String>,
}

async fn handle_health(State(service): State<Arc<DocsService>>) -> Json<HealthResponse> {
    let settings = service.settings();
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Local::now().to_rfc3339(),
        cache_entries: service.cache().live_entries().await,
        data_sources: vec![
            settings.docs_base.clone(),
            settings.github_api_base.clone(),
            settings.pypi_json_url.clone(),
        ],
    })
}

async fn handle_search(
    State(service): State<Arc<DocsService>>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<DocSearchResult>>, AppError> {
    let query = required(&params, "query")?;
    let max_results = bounded(&params, "max_results", 10, 1, 50)?;
    tracing::info!("Searching documentation for query: {}", query);
    Ok(Json(service.search_documentation(query, max_results).await?))
}

async fn handle_search_api(
    State(service): State<Arc<DocsService>>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<DocSearchResult>>, AppError> {
    let query = required(&params, "query")?;
    let max_results = bounded(&params, "max_results", 10, 1, 50)?;
    tracing::info!("Searching API reference for query: {}", query);
    Ok(Json(service.search_api_reference(query, max_results).await?))
}

async fn handle_api_reference(
    State(service): State<Arc<DocsService>>,
    Path(class_name): Path<String>,
) -> Result<Json<ApiReference>, AppError> {
    tracing::info!("Getting API reference for class: {}", class_name);
    Ok(Json(service.get_api_reference(&class_name).await?))
}

async fn handle_github_examples(
    State(service): State<Arc<DocsService>>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<GitHubExample>>, AppError> {
    let topic = required(&params, "topic")?;
    let max_results = bounded(&params, "max_results", 5, 1, 20)?;
    tracing::info!("Getting GitHub examples for topic: {}", topic);
    Ok(Json(service.get_github_examples(Some(topic), max_results).await?))
}

async fn handle_tutorials(
    State(service): State<Arc<DocsService>>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<TutorialInfo>>, AppError> {
    let max_results = bounded(&params, "max_results", 10, 1, 30)?;
    let mut tutorials = service.get_tutorials().await?;
    tutorials.truncate(max_results);
    Ok(Json(tutorials))
}

async fn handle_latest_version(State(service): State<Arc<DocsService>>) -> Result<Json<VersionInfo>, AppError> {
    Ok(Json(service.get_latest_version().await?))
}

#[derive(Serialize)]
struct ClearCacheResponse {
    status: &'static str,
    cleared_entries: usize,
    timestamp: String,
}

async fn handle_clear_cache(State(service): State<Arc<DocsService>>) -> Json<ClearCacheResponse> {
    Json(ClearCacheResponse {
        status: "cleared",
        cleared_entries: service.clear_cache().await,
        timestamp: chrono::Local::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_required_parameter() {
        assert_eq!(required(&params(&[("query", " agents ")]), "query").unwrap(), "agents");

        let err = required(&params(&[]), "query").unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let err = required(&params(&[("query", "   ")]), "query").unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_bounded_parameter() {
        assert_eq!(bounded(&params(&[]), "max_results", 10, 1, 50).unwrap(), 10);
        assert_eq!(bounded(&params(&[("max_results", "50")]), "max_results", 10, 1, 50).unwrap(), 50);

        for bad in ["0", "51", "-3", "ten"] {
            let err = bounded(&params(&[("max_results", bad)]), "max_results", 10, 1, 50).unwrap_err();
            assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY, "value {}", bad);
        }
    }

    #[test]
    fn test_service_error_mapping() {
        let not_found: AppError = ServiceError::NotFound("Class 'X' not found".to_string()).into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.code, "not_found");

        let upstream: AppError = ServiceError::Upstream("Could not fetch tutorials page".to_string()).into();
        assert_eq!(upstream.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
