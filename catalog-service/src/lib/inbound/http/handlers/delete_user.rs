use axum::extract::rejection::PathRejection;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use crate::domain::identity::access::require;
use crate::domain::identity::access::ADMIN_ONLY;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    require(Some(&principal), ADMIN_ONLY)?;
    let Path(user_id) = user_id?;

    state
        .user_service
        .delete_user(&principal, UserId(user_id))
        .await
        .map_err(ApiError::from)
        .map(|_| StatusCode::NO_CONTENT)
}
