use std::collections::HashMap;

use aura_core::{ArticleId, ArticleStatus, CategoryId};
use aura_db::{ArticleFilter, ArticleUpdate};
use aura_util_error::FmtCompact as _;
use axum::Form;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect};
use maud::{Markup, html};
use serde::Deserialize;
use snafu::OptionExt as _;
use tower_sessions::Session;
use tracing::{info, warn};

use super::{finish_db_action, set_notice, take_notice};
use crate::error::{RequestResult, SomethingNotFoundSnafu, UserRequestError};
use crate::layout::{AdminNav, Notice};
use crate::markdown::render_markdown;
use crate::routes::Maud;
use crate::routes::login::session::AdminSession;
use crate::serde_util::empty_string_as_none;
use crate::{LOG_TARGET, SharedState};

const LIST_PATH: &str = "/admin/dashboard/articles";

fn article_path(id: ArticleId) -> String {
    format!("{LIST_PATH}/{id}")
}

pub(crate) fn render_status_badge(status: ArticleStatus) -> Markup {
    html! {
        span class=(format!("o-statusBadge -{}", status.as_str())) title=(status.as_str()) {
            (status.label())
        }
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<ArticleStatus>,
}

pub async fn get_article_list(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Query(query): Query<ListQuery>,
) -> RequestResult<impl IntoResponse> {
    let notice = take_notice(&session).await?;
    let articles = state
        .db
        .list_articles(ArticleFilter {
            status: query.status,
            ..Default::default()
        })
        .await?;
    let category_names: HashMap<CategoryId, String> = state
        .db
        .list_categories()
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let in_trash = query.status == Some(ArticleStatus::Deleted);

    let content = html! {
        nav ."o-tabs" {
            a ."o-tabs__item" ."-active"[query.status.is_none()] href=(LIST_PATH) { "すべて" }
            @for status in ArticleStatus::ALL {
                a ."o-tabs__item"
                    ."-active"[query.status == Some(status)]
                    href=(format!("{LIST_PATH}?status={}", status.as_str()))
                { (status.label()) }
            }
        }
        @if articles.is_empty() {
            p ."o-empty" { "記事がありません" }
        } @else {
            table ."o-table" {
                thead {
                    tr {
                        th { "タイトル" }
                        th { "カテゴリ" }
                        th { "ステータス" }
                        th { "作成日" }
                        th {}
                    }
                }
                tbody {
                    @for article in &articles {
                        tr {
                            td {
                                a href=(article_path(article.id)) { (article.title) }
                            }
                            td {
                                (article
                                    .category_id
                                    .and_then(|id| category_names.get(&id))
                                    .map(String::as_str)
                                    .unwrap_or("-"))
                            }
                            td { (render_status_badge(article.status)) }
                            td { (article.created_at.to_short_display()) }
                            td ."o-table__actions" {
                                @if in_trash {
                                    form method="post" action=(format!("{}/restore", article_path(article.id))) {
                                        button ."u-button" type="submit" { "復元" }
                                    }
                                    form method="post"
                                        action=(format!("{}/purge", article_path(article.id)))
                                        data-confirm="この記事を完全に削除しますか？この操作は取り消せません。"
                                    {
                                        button ."u-button -danger" type="submit" { "完全に削除" }
                                    }
                                } @else {
                                    a ."u-button" href=(article_path(article.id)) { "編集" }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    let title = if in_trash { "ゴミ箱" } else { "記事管理" };
    Ok(Maud(
        state
            .render_admin_page(title, AdminNav::Articles, notice.as_ref(), content)
            .await?,
    ))
}

pub async fn get_article(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<ArticleId>,
) -> RequestResult<impl IntoResponse> {
    let notice = take_notice(&session).await?;
    let article = state
        .db
        .get_article(id)
        .await?
        .context(SomethingNotFoundSnafu)?;
    let categories = state.db.list_categories().await?;
    let path = article_path(id);

    let content = html! {
        div ."o-articleReview" {
            div ."o-articleReview__header" {
                a ."u-buttonLink" href=(LIST_PATH) { "← 記事一覧" }
                (render_status_badge(article.status))
                span ."o-articleReview__meta" {
                    "作成: " (article.created_at.to_short_display())
                    " / 更新: " (article.updated_at.to_short_display())
                    @if let Some(published_at) = article.published_at {
                        " / 公開: " (published_at.to_short_display())
                    }
                }
                a ."u-button" href=(format!("/blog/{id}")) target="_blank" { "プレビュー" }
                @if let Some(ref source_url) = article.source_url {
                    a ."u-button" href=(source_url) target="_blank" rel="noopener noreferrer" { "ソース" }
                }
                @if article.status != ArticleStatus::Published {
                    form method="post" action=(format!("{path}/status")) {
                        input type="hidden" name="status" value=(ArticleStatus::Published.as_str());
                        button ."u-button -primary" type="submit" { "公開する" }
                    }
                }
            }

            div ."o-articleReview__columns" {
                div ."o-articleReview__main" {
                    section ."o-card" {
                        h2 ."o-card__title" { "編集" }
                        form ."o-form" method="post" action=(format!("{path}/edit")) {
                            label ."o-field" {
                                span { "タイトル" }
                                input type="text" name="title" required value=(article.title);
                            }
                            label ."o-field" {
                                span { "要約" }
                                textarea name="summary" rows="3" {
                                    (article.summary.as_deref().unwrap_or_default())
                                }
                            }
                            label ."o-field" {
                                span { "本文 (Markdown)" }
                                textarea ."o-field__content" name="content" rows="24" { (article.content) }
                            }
                            label ."o-field" {
                                span { "サムネイルURL" }
                                input type="url" name="thumbnail_url"
                                    value=(article.thumbnail_url.as_deref().unwrap_or_default());
                            }
                            label ."o-field" {
                                span { "ソースURL" }
                                input type="url" name="source_url"
                                    value=(article.source_url.as_deref().unwrap_or_default());
                            }
                            button ."u-button -primary" type="submit" { "保存" }
                        }
                    }
                    section ."o-card" {
                        h2 ."o-card__title" { "プレビュー" }
                        article ."o-articleBody" { (render_markdown(&article.content)) }
                    }
                }

                aside ."o-articleReview__side" {
                    section ."o-card" {
                        h3 ."o-card__title" { "ステータス" }
                        form ."o-form -inline" method="post" action=(format!("{path}/status")) {
                            select name="status" {
                                @for status in ArticleStatus::ALL {
                                    option value=(status.as_str()) selected[status == article.status] {
                                        (status.label())
                                    }
                                }
                            }
                            button ."u-button" type="submit" { "変更" }
                        }
                    }

                    section ."o-card" {
                        h3 ."o-card__title" { "カテゴリ" }
                        form ."o-form" method="post" action=(format!("{path}/category")) {
                            select name="category_id" {
                                option value="" selected[article.category_id.is_none()] { "(なし)" }
                                @for category in &categories {
                                    option value=(category.id) selected[article.category_id == Some(category.id)] {
                                        (category.name)
                                    }
                                }
                            }
                            input type="text" name="new_category" placeholder="新しいカテゴリ名";
                            button ."u-button" type="submit" { "設定" }
                        }
                    }

                    section ."o-card" {
                        h3 ."o-card__title" { "AI修正依頼" }
                        p ."o-card__lead" { "美咲（AI）への修正指示を入力してください。" }
                        @if let Some(ref feedback) = article.admin_feedback {
                            div ."o-articleReview__feedback" {
                                span { "前回の指示:" }
                                p { (feedback) }
                            }
                        }
                        form ."o-form" method="post" action=(format!("{path}/revise")) {
                            textarea name="feedback" rows="5" required
                                placeholder="例: もっとテンションを高くして！価格についての情報を追加して。" {}
                            button ."u-button -primary" type="submit" { "AIへ修正を依頼" }
                            button ."u-button" type="submit" formaction=(format!("{path}/feedback")) {
                                "指示のみ保存して下書きに戻す"
                            }
                        }
                    }

                    section ."o-card" {
                        h3 ."o-card__title" { "メタデータ" }
                        dl ."o-meta" {
                            dt { "サムネイル" }
                            dd {
                                @if let Some(ref thumbnail_url) = article.thumbnail_url {
                                    img ."o-meta__thumb" src=(thumbnail_url) alt="Thumbnail";
                                } @else {
                                    span ."o-empty" { "画像なし" }
                                }
                            }
                            dt { "生成モデル" }
                            dd { (article.generated_by.as_deref().unwrap_or("-")) }
                        }
                    }

                    section ."o-card -danger" {
                        @if article.status == ArticleStatus::Deleted {
                            form method="post" action=(format!("{path}/restore")) {
                                button ."u-button" type="submit" { "下書きに復元" }
                            }
                        } @else {
                            form method="post" action=(format!("{path}/delete"))
                                data-confirm="この記事をゴミ箱に移動しますか？"
                            {
                                button ."u-button -danger" type="submit" { "ゴミ箱に移動" }
                            }
                        }
                        form method="post" action=(format!("{path}/purge"))
                            data-confirm="この記事を完全に削除しますか？この操作は取り消せません。"
                        {
                            button ."u-button -danger" type="submit" { "完全に削除" }
                        }
                    }
                }
            }
        }
    };

    Ok(Maud(
        state
            .render_admin_page(&article.title, AdminNav::Articles, notice.as_ref(), content)
            .await?,
    ))
}

#[derive(Deserialize)]
pub struct StatusInput {
    status: ArticleStatus,
}

pub async fn post_status(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<ArticleId>,
    Form(form): Form<StatusInput>,
) -> RequestResult<Redirect> {
    finish_db_action(
        &session,
        state.db.set_article_status(id, form.status).await,
        |article| format!("記事のステータスを {} に更新しました", article.status.label()),
        &article_path(id),
    )
    .await
}

#[derive(Deserialize)]
pub struct EditInput {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    thumbnail_url: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    source_url: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    summary: Option<String>,
}

pub async fn post_edit(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<ArticleId>,
    Form(form): Form<EditInput>,
) -> RequestResult<Redirect> {
    let update = ArticleUpdate {
        title: form.title,
        content: form.content,
        thumbnail_url: form.thumbnail_url,
        source_url: form.source_url,
        summary: form.summary,
    };
    finish_db_action(
        &session,
        state.db.update_article(id, update).await,
        |_| "記事を更新しました".to_string(),
        &article_path(id),
    )
    .await
}

#[derive(Deserialize)]
pub struct CategoryInput {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    category_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    new_category: Option<String>,
}

pub async fn post_category(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<ArticleId>,
    Form(form): Form<CategoryInput>,
) -> RequestResult<Redirect> {
    let category = if let Some(name) = form.new_category {
        Some(state.db.find_or_create_category(&name).await?)
    } else if let Some(category_id) = form.category_id {
        let category_id: CategoryId =
            category_id
                .parse()
                .map_err(|_| UserRequestError::BadRequest {
                    message: format!("Invalid category id: {category_id}"),
                })?;
        Some(
            state
                .db
                .get_category(category_id)
                .await?
                .context(SomethingNotFoundSnafu)?,
        )
    } else {
        None
    };

    let category_id = category.as_ref().map(|c| c.id);
    finish_db_action(
        &session,
        state.db.set_article_category(id, category_id).await,
        |_| match category {
            Some(category) => format!("カテゴリを「{}」に設定しました", category.name),
            None => "カテゴリを解除しました".to_string(),
        },
        &article_path(id),
    )
    .await
}

#[derive(Deserialize)]
pub struct FeedbackInput {
    #[serde(default)]
    feedback: String,
}

const FEEDBACK_REQUIRED: &str = "修正指示を入力してください。";

pub async fn post_feedback(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<ArticleId>,
    Form(form): Form<FeedbackInput>,
) -> RequestResult<Redirect> {
    if form.feedback.trim().is_empty() {
        set_notice(&session, Notice::error(FEEDBACK_REQUIRED)).await?;
        return Ok(Redirect::to(&article_path(id)));
    }
    finish_db_action(
        &session,
        state.db.record_article_feedback(id, &form.feedback).await,
        |_| "フィードバックを保存し、下書きに戻しました".to_string(),
        &article_path(id),
    )
    .await
}

/// Ask the engine to rewrite the article following the feedback
///
/// The stored content only changes when the engine succeeds.
pub async fn post_revise(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<ArticleId>,
    Form(form): Form<FeedbackInput>,
) -> RequestResult<Redirect> {
    let feedback = form.feedback.trim();
    if feedback.is_empty() {
        set_notice(&session, Notice::error(FEEDBACK_REQUIRED)).await?;
        return Ok(Redirect::to(&article_path(id)));
    }

    let article = state
        .db
        .get_article(id)
        .await?
        .context(SomethingNotFoundSnafu)?;

    let notice = match state.engine.revise(&article.content, feedback).await {
        Ok(revised) => {
            state
                .db
                .replace_article_content(id, revised, Some(feedback.to_owned()))
                .await?;
            info!(target: LOG_TARGET, %id, "Article revised by engine");
            Notice::success("AIによる修正を反映しました")
        }
        Err(err) => {
            warn!(target: LOG_TARGET, %id, err = %err.fmt_compact(), "Revision failed");
            Notice::error(format!("修正に失敗しました: {err}"))
        }
    };
    set_notice(&session, notice).await?;
    Ok(Redirect::to(&article_path(id)))
}

pub async fn post_delete(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<ArticleId>,
) -> RequestResult<Redirect> {
    finish_db_action(
        &session,
        state.db.soft_delete_article(id).await,
        |article| format!("「{}」をゴミ箱に移動しました", article.title),
        LIST_PATH,
    )
    .await
}

pub async fn post_restore(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<ArticleId>,
) -> RequestResult<Redirect> {
    finish_db_action(
        &session,
        state.db.restore_article(id).await,
        |article| format!("「{}」を下書きに戻しました", article.title),
        &article_path(id),
    )
    .await
}

pub async fn post_purge(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<ArticleId>,
) -> RequestResult<Redirect> {
    finish_db_action(
        &session,
        state.db.delete_article_permanently(id).await,
        |article| format!("「{}」を完全に削除しました", article.title),
        &format!("{LIST_PATH}?status={}", ArticleStatus::Deleted.as_str()),
    )
    .await
}
