use crate::form::FormErrors;

use axum::http::header::WWW_AUTHENTICATE;
use axum::http::StatusCode;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;

pub type AppResult<T, E = AppError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("authentication required")]
    Unauthorized,

    #[error("user does not exist")]
    CurrentUserDoesNotExist,

    #[error("user not found")]
    UserNotFound,

    #[error("username does not exist")]
    UsernameDoesNotExist,

    #[error("username is taken")]
    UsernameTaken,

    #[error("user already has a profile")]
    ProfileAlreadyExists,

    #[error("user profile not found")]
    ProfileNotFound,

    #[error("error in the request body")]
    UnprocessableEntity { errors: FormErrors },

    #[error("an error occurred with the database")]
    Sqlx(#[from] sqlx::Error),

    #[error("an internal server error occurred")]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::CurrentUserDoesNotExist => StatusCode::NOT_FOUND,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::UsernameDoesNotExist => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UsernameTaken => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ProfileAlreadyExists => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ProfileNotFound => StatusCode::NOT_FOUND,
            Self::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Sqlx(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                self.status_code(),
                [(WWW_AUTHENTICATE, HeaderValue::from_static("Token"))]
                    .into_iter()
                    .collect::<HeaderMap>(),
                self.to_string(),
            )
                .into_response(),
            Self::CurrentUserDoesNotExist | Self::UserNotFound | Self::ProfileNotFound => {
                (self.status_code(), ()).into_response()
            }
            Self::UsernameDoesNotExist => {
                unprocessable_entity(FormErrors::single("username", "does not exist"))
            }
            Self::UsernameTaken => unprocessable_entity(FormErrors::single(
                "username",
                "A user with that username already exists.",
            )),
            Self::ProfileAlreadyExists => {
                unprocessable_entity(FormErrors::single("user", "user already has a profile"))
            }
            Self::UnprocessableEntity { errors } => unprocessable_entity(errors),
            Self::Sqlx(ref e) => {
                tracing::error!("SQLx error: {:?}", e);
                (self.status_code(), self.to_string()).into_response()
            }
            Self::Anyhow(ref e) => {
                tracing::error!("Generic error: {:?}", e);
                (self.status_code(), self.to_string()).into_response()
            }
        }
    }
}

#[derive(serde::Serialize)]
struct JsonErrors {
    errors: FormErrors,
}

fn unprocessable_entity(errors: FormErrors) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(JsonErrors { errors }),
    )
        .into_response()
}
