use aura_db::DbError;
use aura_engine::EngineError;
use aura_util_error::{BoxedError, FmtCompact as _};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;
use snafu::Snafu;
use tracing::{debug, warn};

use super::routes::AppJson;
use crate::LOG_TARGET;

/// Walk the error source chain looking for a specific error type.
fn find_in_chain<'a, T: std::error::Error + 'static>(
    e: &'a (dyn std::error::Error + 'static),
) -> Option<&'a T> {
    let mut cur: &dyn std::error::Error = e;
    loop {
        if let Some(t) = cur.downcast_ref::<T>() {
            return Some(t);
        }
        cur = cur.source()?;
    }
}

/// Error by the user
#[derive(Debug, Snafu)]
pub enum UserRequestError {
    #[snafu(visibility(pub(crate)))]
    #[snafu(display("Not Found"))]
    SomethingNotFound,
    #[snafu(visibility(pub(crate)))]
    #[snafu(display("{message}"))]
    BadRequest { message: String },
    #[snafu(visibility(pub(crate)))]
    #[snafu(display("Unauthorized"))]
    Unauthorized,
    #[snafu(visibility(pub(crate)))]
    #[snafu(display("Forbidden"))]
    Forbidden,
}

impl IntoResponse for &UserRequestError {
    fn into_response(self) -> Response {
        let status_code = match self {
            UserRequestError::SomethingNotFound => StatusCode::NOT_FOUND,
            UserRequestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            UserRequestError::Unauthorized => StatusCode::UNAUTHORIZED,
            UserRequestError::Forbidden => StatusCode::FORBIDDEN,
        };
        (
            status_code,
            AppJson(UserErrorResponse {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

// How we want user errors responses to be serialized
#[derive(Serialize)]
pub struct UserErrorResponse {
    pub message: String,
}

#[derive(Debug, Snafu)]
pub enum RequestError {
    #[snafu(visibility(pub(crate)))]
    Db { source: DbError },
    #[snafu(visibility(pub(crate)))]
    Engine { source: EngineError },
    #[snafu(visibility(pub(crate)))]
    Other { source: BoxedError },
    #[snafu(visibility(pub(crate)))]
    #[snafu(display("InternalServerError: {msg}"))]
    InternalServerError { msg: &'static str },
    #[snafu(visibility(pub(crate)))]
    LoginRequired { redirect: Option<String> },
    #[snafu(visibility(pub(crate)))]
    User { source: UserRequestError },
}
pub type RequestResult<T> = std::result::Result<T, RequestError>;

/// Surface caller mistakes as `UserRequestError`, so they end up as 4xx
impl From<DbError> for RequestError {
    fn from(source: DbError) -> Self {
        let user = match &source {
            DbError::NotFound { .. } => UserRequestError::SomethingNotFound,
            DbError::InvalidInput { message } => UserRequestError::BadRequest {
                message: message.clone(),
            },
            DbError::LinkKeyTaken { .. } => UserRequestError::BadRequest {
                message: source.to_string(),
            },
            _ => return RequestError::Db { source },
        };
        RequestError::User { source: user }
    }
}

impl From<EngineError> for RequestError {
    fn from(source: EngineError) -> Self {
        match source {
            EngineError::InvalidInput { message } => RequestError::User {
                source: UserRequestError::BadRequest {
                    message: message.to_owned(),
                },
            },
            source => RequestError::Engine { source },
        }
    }
}

impl From<UserRequestError> for RequestError {
    fn from(source: UserRequestError) -> Self {
        RequestError::User { source }
    }
}

impl From<axum::extract::rejection::JsonRejection> for RequestError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        RequestError::User {
            source: UserRequestError::BadRequest {
                message: rejection.body_text(),
            },
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        debug!(
            target: LOG_TARGET,
            err = %self.fmt_compact(),
            "Request Error"
        );

        if let Some(user_err) = find_in_chain::<UserRequestError>(&self) {
            return user_err.into_response();
        }

        let (status_code, message) = match self {
            RequestError::LoginRequired { redirect } => {
                let url = match redirect {
                    Some(ref path) => {
                        format!("/admin/login?redirect={}", urlencoding::encode(path))
                    }
                    None => "/admin/login".to_string(),
                };
                return Redirect::to(&url).into_response();
            }
            RequestError::Engine { source } => {
                warn!(
                    target: LOG_TARGET,
                    err = %source.fmt_compact(),
                    "Engine request failed"
                );
                (StatusCode::BAD_GATEWAY, source.to_string())
            }
            err => {
                warn!(
                    target: LOG_TARGET,
                    err = %err.fmt_compact(),
                    "Unexpected Request Error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Service Error".to_owned(),
                )
            }
        };

        (status_code, AppJson(UserErrorResponse { message })).into_response()
    }
}
