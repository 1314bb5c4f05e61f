//! Email configuration and test sends.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use smsrelay_core::{EmailConfig, Error, TestOutcome, validate_email_config};

use super::{ApiJson, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct Saved {
    status: &'static str,
    config_id: String,
}

/// Current configuration, password masked.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfigResponse {
    NotConfigured,
    Configured { config: EmailConfig },
}

#[derive(Debug, Deserialize)]
pub struct TestRequest {
    recipient_email: String,
    #[serde(default)]
    test_message: Option<String>,
}

/// Replaces the active configuration.
pub async fn save_config(
    State(state): State<AppState>,
    ApiJson(mut config): ApiJson<EmailConfig>,
) -> ApiResult<Json<Saved>> {
    validate_email_config(&config).map_err(Error::Validation)?;

    let configs = state.store().email_configs();
    let stored = configs.current().await?;
    config.unmask_password(stored.as_ref());

    let saved = configs.replace(config).await?;
    info!(config_id = %saved.id, method = %saved.email_type, "email configuration saved");
    Ok(Json(Saved {
        status: "success",
        config_id: saved.id,
    }))
}

pub async fn get_config(State(state): State<AppState>) -> ApiResult<Json<ConfigResponse>> {
    let response = match state.store().email_configs().current().await? {
        Some(config) => ConfigResponse::Configured {
            config: config.masked(),
        },
        None => ConfigResponse::NotConfigured,
    };
    Ok(Json(response))
}

pub async fn send_test(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TestRequest>,
) -> ApiResult<Json<TestOutcome>> {
    let outcome = state
        .service()
        .send_test(&request.recipient_email, request.test_message.as_deref())
        .await?;
    Ok(Json(outcome))
}
