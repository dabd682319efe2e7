use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserProfileData;
use crate::domain::identity::access::require;
use crate::domain::identity::access::AUTHENTICATED;
use crate::domain::identity::errors::IdentityError;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::UpdateProfileCommand;
use crate::inbound::http::router::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ApiSuccess<UserProfileData>, ApiError> {
    require(Some(&principal), AUTHENTICATED)?;

    state
        .user_service
        .get_profile(&principal)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<ApiSuccess<UserProfileData>, ApiError> {
    require(Some(&principal), AUTHENTICATED)?;
    let Json(body) = payload?;

    let command = body.try_into_command()?;

    state
        .user_service
        .update_profile(&principal, command)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

/// HTTP request body for a profile update (raw JSON)
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl UpdateProfileRequest {
    fn try_into_command(self) -> Result<UpdateProfileCommand, IdentityError> {
        let email = self.email.map(EmailAddress::new).transpose()?;

        Ok(UpdateProfileCommand {
            first_name: self.first_name,
            last_name: self.last_name,
            email,
        })
    }
}
