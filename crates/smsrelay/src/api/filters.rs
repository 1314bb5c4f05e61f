//! Filter management.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use tracing::info;

use smsrelay_core::{Error, FilterUpdate, SmsFilter, validate_filter, validate_filter_update};

use super::{ApiJson, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct Created {
    status: &'static str,
    filter_id: String,
}

#[derive(Debug, Serialize)]
pub struct Updated {
    status: &'static str,
    updated: bool,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    status: &'static str,
    deleted: bool,
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(filter): ApiJson<SmsFilter>,
) -> ApiResult<Json<Created>> {
    validate_filter(&filter).map_err(Error::Validation)?;
    state.store().filters().create(&filter).await?;
    info!(filter_id = %filter.id, filter_type = filter.filter_type.as_str(), "filter created");
    Ok(Json(Created {
        status: "success",
        filter_id: filter.id,
    }))
}

/// Newest first.
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<SmsFilter>>> {
    Ok(Json(state.store().filters().list().await?))
}

/// Applies a partial update; `updated` is false when nothing changed.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<FilterUpdate>,
) -> ApiResult<Json<Updated>> {
    validate_filter_update(&update).map_err(Error::Validation)?;
    let updated = state.store().filters().update(&id, &update).await?;
    info!(filter_id = %id, updated, "filter updated");
    Ok(Json(Updated {
        status: "success",
        updated,
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    state.store().filters().delete(&id).await?;
    info!(filter_id = %id, "filter deleted");
    Ok(Json(Deleted {
        status: "success",
        deleted: true,
    }))
}
