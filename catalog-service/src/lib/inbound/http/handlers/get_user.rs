use axum::extract::rejection::PathRejection;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::UserSummaryData;
use crate::domain::identity::access::require;
use crate::domain::identity::access::ADMIN_ONLY;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::UserId;
use crate::inbound::http::router::AppState;

pub async fn get_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<UserSummaryData>, ApiError> {
    require(Some(&principal), ADMIN_ONLY)?;
    let Path(user_id) = user_id?;

    state
        .user_service
        .get_user(&principal, UserId(user_id))
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}
