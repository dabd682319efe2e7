use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::UserProfileData;
use crate::domain::identity::access::require;
use crate::domain::identity::access::ADMIN_ONLY;
use crate::domain::identity::models::Principal;
use crate::inbound::http::router::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ApiSuccess<Vec<UserProfileData>>, ApiError> {
    require(Some(&principal), ADMIN_ONLY)?;

    let users = state.user_service.list_users(&principal).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        users.iter().map(UserProfileData::from).collect(),
    ))
}
