//! Service banner and liveness.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::AppState;

/// Service banner.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    message: &'static str,
    version: &'static str,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "SMS Mail Forwarder API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness report.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

/// Reports `healthy` while the database answers, `unhealthy` (503) otherwise.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = Utc::now();
    match state.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                timestamp,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    timestamp,
                }),
            )
        }
    }
}
