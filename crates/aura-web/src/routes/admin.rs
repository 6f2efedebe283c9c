//! Admin dashboard pages
//!
//! Actions follow post/redirect/get: the outcome is kept in the session as a
//! [`Notice`] and shown once on the next rendered page.

pub mod ai_settings;
pub mod articles;
pub mod dashboard;
pub mod links;
pub mod media;
pub mod settings;

use aura_db::DbError;
use aura_util_error::FmtCompact as _;
use axum::response::Redirect;
use snafu::ResultExt as _;
use tower_sessions::Session;
use tracing::warn;

use crate::LOG_TARGET;
use crate::error::{OtherSnafu, RequestResult};
use crate::layout::Notice;

const NOTICE_KEY: &str = "aura_notice";

pub(crate) async fn set_notice(session: &Session, notice: Notice) -> RequestResult<()> {
    session
        .insert(NOTICE_KEY, notice)
        .await
        .boxed()
        .context(OtherSnafu)
}

pub(crate) async fn take_notice(session: &Session) -> RequestResult<Option<Notice>> {
    session
        .remove::<Notice>(NOTICE_KEY)
        .await
        .boxed()
        .context(OtherSnafu)
}

/// Record the outcome of a store write and redirect to `to`
///
/// Caller errors (validation, missing rows) become an error notice; storage
/// failures are propagated.
pub(crate) async fn finish_db_action<T>(
    session: &Session,
    res: Result<T, DbError>,
    success: impl FnOnce(T) -> String,
    to: &str,
) -> RequestResult<Redirect> {
    let notice = match res {
        Ok(v) => Notice::success(success(v)),
        Err(err) if err.is_user_error() => Notice::error(err.to_string()),
        Err(err) => {
            warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Admin action failed");
            return Err(err.into());
        }
    };
    set_notice(session, notice).await?;
    Ok(Redirect::to(to))
}
