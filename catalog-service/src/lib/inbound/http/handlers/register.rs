use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserSummaryData;
use crate::domain::identity::models::RegisterCommand;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<ApiSuccess<UserSummaryData>, ApiError> {
    let Json(body) = payload?;
    let command = RegisterCommand::parse(body.username, body.email, body.password, body.role)?;

    state
        .auth_service
        .register(command)
        .await
        .map_err(ApiError::from)
        .map(|summary| ApiSuccess::new(StatusCode::CREATED, summary.into()))
}

/// HTTP request body for registration (raw JSON).
///
/// Missing fields deserialize as empty and are reported as validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    role: String,
}
