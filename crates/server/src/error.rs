use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::store::GroupError;
use crate::users::UserError;

#[derive(Debug)]
pub enum Error {
    // Account errors
    LoginFail,
    UsernameTaken,

    // Request errors
    BadRequest(String),
    NotFound(String),
    Conflict(String),

    // Generic
    Internal(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Error::LoginFail => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
            ),
            Error::UsernameTaken => (StatusCode::CONFLICT, "Username already exists".to_string()),
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Error::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({
            "error": {
                "message": error_message
            }
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<UserError> for Error {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidCredentials => Error::LoginFail,
            UserError::UsernameTaken => Error::UsernameTaken,
            UserError::Invalid(msg) => Error::BadRequest(msg),
            other => Error::Internal(other.to_string()),
        }
    }
}

impl From<GroupError> for Error {
    fn from(err: GroupError) -> Self {
        match err {
            GroupError::NameTaken(name) => Error::Conflict(format!("group {} already exists", name)),
            other @ GroupError::NameRequired => Error::BadRequest(other.to_string()),
            GroupError::Storage(e) => Error::Internal(e.to_string()),
        }
    }
}
