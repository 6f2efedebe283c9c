use aura_core::Timestamp;
use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::{InternalServerSnafu, LoginRequiredSnafu, RequestError, UnauthorizedSnafu};

pub const SESSION_KEY: &str = "aura_admin";

/// What a successful login stores in the session
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AdminSessionData {
    pub email: Option<String>,
    pub logged_in_at: Timestamp,
}

impl AdminSessionData {
    pub fn new(email: Option<String>) -> Self {
        Self {
            email,
            logged_in_at: Timestamp::now(),
        }
    }
}

/// A logged-in admin
///
/// Without a session, `/api/` requests are rejected with 401, page requests
/// get redirected to the login form.
pub struct AdminSession(pub AdminSessionData);

async fn load_session_data<S>(
    req: &mut request::Parts,
    state: &S,
) -> Result<Option<AdminSessionData>, RequestError>
where
    S: Send + Sync,
{
    let session = Session::from_request_parts(req, state)
        .await
        .map_err(|(_, msg)| InternalServerSnafu { msg }.build())?;

    session.get(SESSION_KEY).await.map_err(|_| {
        InternalServerSnafu {
            msg: "session store error",
        }
        .build()
    })
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request_parts(
        req: &mut request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        if let Some(data) = load_session_data(req, state).await? {
            return Ok(AdminSession(data));
        }

        if req.uri.path().starts_with("/api/") {
            return Err(UnauthorizedSnafu.build().into());
        }

        let redirect = req
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .filter(|p| is_safe_redirect(p));
        Err(LoginRequiredSnafu { redirect }.build())
    }
}

impl<S> OptionalFromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request_parts(
        req: &mut request::Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(load_session_data(req, state).await?.map(AdminSession))
    }
}

/// Only local absolute paths may be used as a post-login redirect
pub fn is_safe_redirect(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}
