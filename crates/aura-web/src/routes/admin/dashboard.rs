use aura_db::{ArticleFilter, ArticleRecord};
use aura_util_error::FmtCompact as _;
use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::warn;

use super::articles::render_status_badge;
use super::{set_notice, take_notice};
use crate::error::RequestResult;
use crate::layout::{AdminNav, DEFAULT_ARTICLE_IMAGE, Notice};
use crate::routes::login::session::AdminSession;
use crate::routes::{AppJson, Maud};
use crate::{LOG_TARGET, SharedState, UiState};

/// Trend keywords offered as one-click generate buttons
const TREND_CHIPS: usize = 10;
const RECENT_PANEL_SIZE: usize = 5;
const RECENT_JSON_SIZE: usize = 10;
/// Refresh interval of the recent articles panel
const POLL_INTERVAL_MS: u32 = 5000;

pub async fn get_dashboard(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
) -> RequestResult<impl IntoResponse> {
    let notice = take_notice(&session).await?;
    let trends = state.engine.trends().await;
    let recent = state.recent_articles(RECENT_PANEL_SIZE).await?;

    let content = html! {
        section ."o-card" {
            h2 ."o-card__title" { "AI Article Generator" }
            p ."o-card__lead" {
                "キーワードを入力して、日韓のトレンド記事を自動生成します。"
                br;
                "生成プロセスはバックグラウンドで実行され、完了すると下部に表示されます。"
            }
            form ."o-generateForm" method="post" action="/admin/dashboard/generate" {
                label ."o-field" {
                    span { "Target Keyword" }
                    input type="text"
                        name="keyword"
                        required
                        placeholder="例: 韓国肌管理, レチノール, 医療ダイエット...";
                }
                button ."u-button -primary" type="submit" { "Generate" }
            }
            div ."o-trends" {
                h3 ."o-trends__title" { "Trending Now" }
                form ."o-trends__chips" method="post" action="/admin/dashboard/generate" {
                    @for keyword in trends.iter().take(TREND_CHIPS) {
                        button ."o-chip" type="submit" name="keyword" value=(keyword) {
                            "#" (keyword)
                        }
                    }
                }
            }
            form method="post" action="/admin/dashboard/generate_bulk"
                data-confirm="トレンド上位のキーワードで記事を一括生成しますか？"
            {
                button ."u-button" type="submit" { "トレンドから一括生成" }
            }
        }
        section ."o-card" {
            h2 ."o-card__title" { "Generated Articles" }
            div id="recent-articles"
                data-poll-url="/admin/dashboard/recent"
                data-poll-interval=(POLL_INTERVAL_MS)
            {
                (render_recent_articles(&recent))
            }
        }
    };

    Ok(Maud(
        state
            .render_admin_page("Dashboard", AdminNav::Dashboard, notice.as_ref(), content)
            .await?,
    ))
}

#[derive(Deserialize)]
pub struct GenerateInput {
    #[serde(default)]
    keyword: String,
}

pub async fn post_generate(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Form(form): Form<GenerateInput>,
) -> RequestResult<Redirect> {
    let keyword = form.keyword.trim();
    let notice = match state.engine.generate(keyword).await {
        Ok(_) => Notice::success(format!("生成を開始しました: {keyword}")),
        Err(err) => {
            warn!(target: LOG_TARGET, err = %err.fmt_compact(), %keyword, "Generate failed");
            Notice::error(format!("エラーが発生しました: {err}"))
        }
    };
    set_notice(&session, notice).await?;
    Ok(Redirect::to("/admin/dashboard"))
}

pub async fn post_generate_bulk(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
) -> RequestResult<Redirect> {
    let notice = match state.engine.generate_bulk().await {
        Ok(ack) => Notice::success(format!(
            "一括生成を開始しました: {}",
            ack.keywords.join(", ")
        )),
        Err(err) => {
            warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Bulk generate failed");
            Notice::error(format!("一括生成エラーが発生しました: {err}"))
        }
    };
    set_notice(&session, notice).await?;
    Ok(Redirect::to("/admin/dashboard"))
}

/// Fragment polled by the dashboard
pub async fn get_recent_articles(
    state: State<SharedState>,
    _admin: AdminSession,
) -> RequestResult<impl IntoResponse> {
    let recent = state.recent_articles(RECENT_PANEL_SIZE).await?;
    Ok(Maud(render_recent_articles(&recent)))
}

#[derive(Serialize)]
pub struct ArticlesResponse {
    articles: Vec<ArticleRecord>,
}

pub async fn get_articles_json(state: State<SharedState>, _admin: AdminSession) -> Response {
    match state.recent_articles(RECENT_JSON_SIZE).await {
        Ok(articles) => AppJson(ArticlesResponse { articles }).into_response(),
        Err(err) => {
            warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Failed to list articles");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                AppJson(ArticlesResponse { articles: vec![] }),
            )
                .into_response()
        }
    }
}

impl UiState {
    async fn recent_articles(&self, limit: usize) -> aura_db::DbResult<Vec<ArticleRecord>> {
        self.db
            .list_articles(ArticleFilter {
                status: None,
                limit,
            })
            .await
    }
}

fn render_recent_articles(articles: &[ArticleRecord]) -> Markup {
    html! {
        @if articles.is_empty() {
            p ."o-empty" { "まだ記事がありません。キーワードを入力して生成を開始してください。" }
        } @else {
            ul ."o-recentArticles" {
                @for article in articles {
                    li {
                        a ."o-recentArticles__item" href=(format!("/admin/dashboard/articles/{}", article.id)) {
                            img ."o-recentArticles__thumb"
                                src=(article.thumbnail_url.as_deref().unwrap_or(DEFAULT_ARTICLE_IMAGE))
                                alt=""
                                loading="lazy";
                            span ."o-recentArticles__title" { (article.title) }
                            (render_status_badge(article.status))
                            time ."o-recentArticles__time" datetime=(article.created_at.to_rfc3339()) {
                                (article.created_at.to_short_display())
                            }
                        }
                    }
                }
            }
        }
    }
}
