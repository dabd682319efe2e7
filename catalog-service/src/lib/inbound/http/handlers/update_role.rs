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
use crate::domain::identity::errors::IdentityError;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::UserId;
use crate::inbound::http::router::AppState;

pub async fn update_role(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    user_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> Result<ApiSuccess<UserProfileData>, ApiError> {
    require(Some(&principal), ADMIN_ONLY)?;
    let Path(user_id) = user_id?;
    let Json(body) = payload?;

    let role: Role = body.role.parse().map_err(IdentityError::from)?;

    state
        .user_service
        .update_role(&principal, UserId(user_id), role)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    pub role: String,
}
