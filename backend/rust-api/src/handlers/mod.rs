use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::progression::ProgressionError;
use crate::services::AppState;

pub mod catalog;
pub mod leaderboard;
pub mod learners;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<ProgressionError> for ApiError {
    fn from(err: ProgressionError) -> Self {
        match err {
            ProgressionError::UnknownLab(_) => ApiError::not_found(err.to_string()),
            _ => ApiError::bad_request(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(progression) = err.downcast_ref::<ProgressionError>() {
            return ApiError::from(progression.clone());
        }
        if err.downcast_ref::<mongodb::error::Error>().is_some() {
            tracing::error!("Progress store unavailable: {:#}", err);
            return ApiError::ServiceUnavailable("Progress store unavailable".to_string());
        }
        tracing::error!("Request failed: {:#}", err);
        ApiError::internal("Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::ServiceUnavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        (
            status,
            Json(json!({
                "error": message,
                "status": status.as_u16(),
            })),
        )
            .into_response()
    }
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut dependencies = serde_json::Map::new();
    let mut all_healthy = true;

    let store_health = match tokio::time::timeout(
        std::time::Duration::from_secs(1),
        state.store.ping(),
    )
    .await
    {
        Ok(Ok(())) => json!({ "status": "healthy", "backend": state.store.backend_name() }),
        Ok(Err(e)) => {
            all_healthy = false;
            json!({ "status": "unhealthy", "backend": state.store.backend_name(), "error": format!("{:#}", e) })
        }
        Err(_) => {
            all_healthy = false;
            json!({ "status": "unhealthy", "backend": state.store.backend_name(), "error": "timeout after 1s" })
        }
    };
    dependencies.insert("store".to_string(), store_health);

    if let Some(redis) = &state.redis {
        let mut conn = redis.clone();
        let redis_health = match tokio::time::timeout(
            std::time::Duration::from_millis(500),
            redis::cmd("PING").query_async::<String>(&mut conn),
        )
        .await
        {
            Ok(Ok(_)) => json!({ "status": "healthy" }),
            Ok(Err(e)) => {
                all_healthy = false;
                json!({ "status": "unhealthy", "error": format!("Redis error: {}", e) })
            }
            Err(_) => {
                all_healthy = false;
                json!({ "status": "unhealthy", "error": "Redis timeout after 500ms" })
            }
        };
        dependencies.insert("redis".to_string(), redis_health);
    }

    let (status_code, status) = if all_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "studyquest-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": dependencies
        })),
    )
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// HTTP Basic auth for `/metrics` when `metrics.auth` is configured.
pub async fn metrics_auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.config.metrics_auth.as_deref() else {
        return Ok(next.run(request).await);
    };

    let credentials = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .and_then(|encoded| general_purpose::STANDARD.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if credentials != expected {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
