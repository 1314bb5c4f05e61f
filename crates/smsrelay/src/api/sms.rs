//! SMS ingestion, log and statistics.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use smsrelay_core::{ForwardOutcome, ForwardRequest, SmsMessage, SmsStats};

use super::{ApiJson, ApiQuery, ApiResult, AppState};

const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 1000;

/// Paging for the SMS log.
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    skip: u32,
}

const fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

pub async fn forward(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ForwardRequest>,
) -> ApiResult<Json<ForwardOutcome>> {
    Ok(Json(state.service().forward(request).await?))
}

/// Newest first.
pub async fn messages(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Json<Vec<SmsMessage>>> {
    let limit = page.limit.min(MAX_LIMIT);
    Ok(Json(state.store().messages().list(limit, page.skip).await?))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<SmsStats>> {
    Ok(Json(state.store().messages().stats().await?))
}
