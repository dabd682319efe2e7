use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserProfileData;
use crate::domain::identity::access::require;
use crate::domain::identity::access::ADMIN_ONLY;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::UserId;
use crate::inbound::http::router::AppState;

pub async fn set_enabled(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    user_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SetEnabledRequest>, JsonRejection>,
) -> Result<ApiSuccess<UserProfileData>, ApiError> {
    require(Some(&principal), ADMIN_ONLY)?;
    let Path(user_id) = user_id?;
    let Json(body) = payload?;

    state
        .user_service
        .set_enabled(&principal, UserId(user_id), body.enabled)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

#[derive(Debug, Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}
