use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::identity::errors::IdentityError;
use crate::identity::models::PrincipalSummary;
use crate::identity::models::Role;
use crate::identity::models::User;

pub mod delete_user;
pub mod get_user;
pub mod list_users;
pub mod login;
pub mod profile;
pub mod register;
pub mod set_enabled;
pub mod update_role;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// Transport-level error. The only place error kinds become status codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
}

/// Malformed or wrongly typed JSON bodies are validation failures.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidUsername(_)
            | IdentityError::InvalidEmail(_)
            | IdentityError::InvalidRole(_)
            | IdentityError::Validation(_) => ApiError::BadRequest(err.to_string()),
            IdentityError::DuplicateUser(_) | IdentityError::DuplicateEmail(_) => {
                ApiError::Conflict(err.to_string())
            }
            IdentityError::InvalidCredentials | IdentityError::PrincipalNotFound(_) => {
                ApiError::Unauthorized(IdentityError::InvalidCredentials.to_string())
            }
            IdentityError::TokenExpired | IdentityError::TokenInvalid(_) => {
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
            IdentityError::AccessDenied(_) => ApiError::Forbidden(err.to_string()),
            IdentityError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            IdentityError::Password(_)
            | IdentityError::TokenSigning(_)
            | IdentityError::DatabaseError(_)
            | IdentityError::Unknown(_) => {
                tracing::error!(error = %err, "Request failed");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

impl From<crate::identity::errors::AccessDenied> for ApiError {
    fn from(err: crate::identity::errors::AccessDenied) -> Self {
        IdentityError::from(err).into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// `{id, username, role}` view shared by register, login and admin lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummaryData {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<PrincipalSummary> for UserSummaryData {
    fn from(summary: PrincipalSummary) -> Self {
        Self {
            id: summary.id.0,
            username: summary.username,
            role: summary.role,
        }
    }
}

impl From<&User> for UserSummaryData {
    fn from(user: &User) -> Self {
        user.principal().summary().into()
    }
}

/// Full profile view; never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfileData {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub enabled: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfileData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            username: user.username.as_str().to_string(),
            email: user.email.as_str().to_string(),
            role: user.role,
            enabled: user.enabled,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
