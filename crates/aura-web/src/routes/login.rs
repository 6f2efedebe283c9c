pub mod session;

use axum::Form;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use maud::{Markup, html};
use serde::Deserialize;
use session::{AdminSession, AdminSessionData, SESSION_KEY, is_safe_redirect};
use snafu::ResultExt as _;
use tower_sessions::Session;
use tracing::{info, warn};

use super::Maud;
use crate::error::{OtherSnafu, RequestResult};
use crate::layout::Notice;
use crate::serde_util::empty_string_as_none;
use crate::{LOG_TARGET, SharedState, UiState};

const DEFAULT_REDIRECT: &str = "/admin/dashboard";

#[derive(Deserialize)]
pub struct RedirectQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    redirect: Option<String>,
}

pub async fn get(
    state: State<SharedState>,
    admin: Option<AdminSession>,
    Query(query): Query<RedirectQuery>,
) -> RequestResult<Response> {
    if admin.is_some() {
        return Ok(Redirect::to(&redirect_target(query.redirect)).into_response());
    }
    Ok(Maud(state.login_page(None, None, query.redirect).await?).into_response())
}

#[derive(Deserialize)]
pub struct Input {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(default)]
    password: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    redirect: Option<String>,
}

pub async fn post_login(
    state: State<SharedState>,
    session: Session,
    Form(form): Form<Input>,
) -> RequestResult<Response> {
    if !state
        .opts
        .admin
        .verify(form.email.as_deref(), &form.password)
    {
        warn!(target: LOG_TARGET, email = ?form.email, "Failed admin login");
        return Ok(Maud(
            state
                .login_page(
                    form.email.as_deref(),
                    Some(&Notice::error("Password Incorrect")),
                    form.redirect,
                )
                .await?,
        )
        .into_response());
    }

    // fresh session id on privilege change
    session.cycle_id().await.boxed().context(OtherSnafu)?;
    session
        .insert(SESSION_KEY, &AdminSessionData::new(form.email))
        .await
        .boxed()
        .context(OtherSnafu)?;
    info!(target: LOG_TARGET, "Admin logged in");

    Ok(Redirect::to(&redirect_target(form.redirect)).into_response())
}

pub async fn logout(session: Session) -> RequestResult<impl IntoResponse> {
    session.delete().await.boxed().context(OtherSnafu)?;

    Ok(Redirect::to("/admin/login"))
}

fn redirect_target(redirect: Option<String>) -> String {
    redirect
        .filter(|p| is_safe_redirect(p))
        .unwrap_or_else(|| DEFAULT_REDIRECT.to_string())
}

impl UiState {
    async fn login_page(
        &self,
        email: Option<&str>,
        notice: Option<&Notice>,
        redirect: Option<String>,
    ) -> RequestResult<Markup> {
        let email_required = self.opts.admin.email.is_some();
        let content = html! {
            div ."o-loginScreen" {
                form ."o-loginScreen__form"
                    action="/admin/login"
                    method="post"
                    autocomplete="on"
                {
                    @if let Some(ref redirect_path) = redirect {
                        input type="hidden" name="redirect" value=(redirect_path);
                    }
                    h1 ."o-loginScreen__title" { "Admin Login" }
                    @if let Some(notice) = notice {
                        (notice.render())
                    }
                    @if email_required {
                        label ."o-field" {
                            span { "Email" }
                            input type="email"
                                name="email"
                                autocomplete="username"
                                required
                                value=(email.unwrap_or_default());
                        }
                    }
                    label ."o-field" {
                        span { "Password" }
                        input type="password"
                            name="password"
                            autocomplete="current-password"
                            required;
                    }
                    button ."u-button -primary" type="submit" { "Login" }
                }
            }
        };
        self.render_public_page(Some("Admin Login"), content, None)
            .await
    }
}
