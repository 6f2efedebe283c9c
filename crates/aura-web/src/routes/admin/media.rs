use std::collections::HashSet;

use aura_core::{SourceId, SourceType};
use aura_db::{SourceInput, SourceRecord};
use aura_engine::MediaRecommendation;
use aura_util_error::FmtCompact as _;
use axum::Form;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect};
use maud::{Markup, html};
use serde::Deserialize;
use snafu::OptionExt as _;
use tower_sessions::Session;
use tracing::warn;

use super::{finish_db_action, set_notice, take_notice};
use crate::error::{RequestResult, SomethingNotFoundSnafu};
use crate::layout::{AdminNav, Notice};
use crate::routes::Maud;
use crate::routes::login::session::AdminSession;
use crate::{LOG_TARGET, SharedState, UiState};

const LIST_PATH: &str = "/admin/dashboard/media";

#[derive(Deserialize)]
pub struct SourceForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default, rename = "type")]
    source_type: SourceType,
}

impl From<SourceForm> for SourceInput {
    fn from(form: SourceForm) -> Self {
        SourceInput {
            name: form.name,
            url: form.url,
            source_type: form.source_type,
        }
    }
}

/// Recommendations section state
enum Recommendations {
    NotRequested,
    Loaded(Vec<MediaRecommendation>),
}

pub async fn get_media(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
) -> RequestResult<impl IntoResponse> {
    let notice = take_notice(&session).await?;
    Ok(Maud(
        state
            .media_page(None, notice, Recommendations::NotRequested)
            .await?,
    ))
}

pub async fn get_edit_source(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<SourceId>,
) -> RequestResult<impl IntoResponse> {
    let notice = take_notice(&session).await?;
    let source = state
        .db
        .get_source(id)
        .await?
        .context(SomethingNotFoundSnafu)?;
    Ok(Maud(
        state
            .media_page(Some(&source), notice, Recommendations::NotRequested)
            .await?,
    ))
}

pub async fn post_new_source(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Form(form): Form<SourceForm>,
) -> RequestResult<Redirect> {
    finish_db_action(
        &session,
        state.db.create_source(form.into()).await,
        |source| format!("「{}」を登録しました", source.name),
        LIST_PATH,
    )
    .await
}

pub async fn post_update_source(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<SourceId>,
    Form(form): Form<SourceForm>,
) -> RequestResult<Redirect> {
    let res = state.db.update_source(id, form.into()).await;
    let back = if res.is_ok() {
        LIST_PATH.to_string()
    } else {
        format!("{LIST_PATH}/{id}/edit")
    };
    finish_db_action(
        &session,
        res,
        |source| format!("「{}」を更新しました", source.name),
        &back,
    )
    .await
}

pub async fn post_delete_source(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<SourceId>,
) -> RequestResult<Redirect> {
    finish_db_action(
        &session,
        state.db.delete_source(id).await,
        |source| format!("「{}」を削除しました", source.name),
        LIST_PATH,
    )
    .await
}

pub async fn post_toggle_source(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<SourceId>,
) -> RequestResult<Redirect> {
    let source = state
        .db
        .get_source(id)
        .await?
        .context(SomethingNotFoundSnafu)?;
    finish_db_action(
        &session,
        state.db.set_source_active(id, !source.is_active).await,
        |source| {
            if source.is_active {
                format!("「{}」を有効にしました", source.name)
            } else {
                format!("「{}」を無効にしました", source.name)
            }
        },
        LIST_PATH,
    )
    .await
}

pub async fn post_crawl(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
) -> RequestResult<Redirect> {
    let notice = match state.engine.crawl_media().await {
        Ok(ack) => Notice::success(format!(
            "開始しました: {}",
            ack.message.unwrap_or_default()
        )),
        Err(err) => {
            warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Crawl failed to start");
            Notice::error(format!("クローリング開始エラー: {err}"))
        }
    };
    set_notice(&session, notice).await?;
    Ok(Redirect::to(LIST_PATH))
}

pub async fn get_recommendations(
    state: State<SharedState>,
    _admin: AdminSession,
) -> RequestResult<impl IntoResponse> {
    let (notice, recommendations) = match state.engine.recommendations().await {
        Ok(recs) => (None, Recommendations::Loaded(recs)),
        Err(err) => {
            warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Recommendations failed");
            (
                Some(Notice::error(format!("取得エラー: {err}"))),
                Recommendations::NotRequested,
            )
        }
    };
    Ok(Maud(state.media_page(None, notice, recommendations).await?))
}

#[derive(Deserialize)]
pub struct RecommendationForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
}

pub async fn post_add_recommendation(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Form(form): Form<RecommendationForm>,
) -> RequestResult<Redirect> {
    let input = SourceInput {
        name: form.name,
        url: form.url,
        source_type: SourceType::JapaneseMedia,
    };
    finish_db_action(
        &session,
        state.db.create_source(input).await,
        |source| format!("「{}」を追加しました", source.name),
        LIST_PATH,
    )
    .await
}

impl UiState {
    async fn media_page(
        &self,
        editing: Option<&SourceRecord>,
        notice: Option<Notice>,
        recommendations: Recommendations,
    ) -> RequestResult<Markup> {
        let sources = self.db.list_sources().await?;
        let registered: HashSet<&str> = sources.iter().map(|s| s.url.as_str()).collect();

        let content = html! {
            p ."o-adminMain__lead" { "クローリング対象の主要メディア一覧と学習データの構築" }
            form method="post" action=(format!("{LIST_PATH}/crawl"))
                data-confirm="学習データの構築を開始しますか？\n登録されている全ての有効なメディアをクローリングします。これには時間がかかる場合があります。"
            {
                button ."u-button -primary" type="submit" { "学習データを構築" }
            }

            section ."o-card" {
                (render_source_form(editing))
            }

            section ."o-card" {
                h2 ."o-card__title" { "AIおすすめメディア (Beta)" }
                p ."o-card__lead" { "AIが美容トレンドに基づき、まだ登録されていない有力なメディアを提案します。" }
                @match recommendations {
                    Recommendations::NotRequested => {
                        a ."u-button" href=(format!("{LIST_PATH}/recommendations")) { "おすすめを取得する" }
                    }
                    Recommendations::Loaded(recs) => {
                        @let recs: Vec<_> = recs
                            .into_iter()
                            .filter(|r| !registered.contains(r.url.as_str()))
                            .collect();
                        @if recs.is_empty() {
                            p ."o-empty" { "新しいおすすめはありません" }
                        }
                        ul ."o-recommendations" {
                            @for rec in &recs {
                                li ."o-recommendations__item" {
                                    div {
                                        strong { (rec.name) }
                                        a href=(rec.url) target="_blank" rel="noopener noreferrer" { (rec.url) }
                                        @if let Some(ref query) = rec.query_used {
                                            span ."o-recommendations__query" { "Keyword: " (query) }
                                        }
                                    }
                                    form method="post" action=(format!("{LIST_PATH}/recommendations")) {
                                        input type="hidden" name="name" value=(rec.name);
                                        input type="hidden" name="url" value=(rec.url);
                                        button ."u-button" type="submit" { "追加" }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            section ."o-card" {
                @if sources.is_empty() {
                    p ."o-empty" { "メディアはまだ登録されていません" }
                } @else {
                    ul ."o-sources" {
                        @for source in &sources {
                            li ."o-sources__item" ."-inactive"[!source.is_active] {
                                div {
                                    strong { (source.name) }
                                    span ."o-badge" {
                                        @if source.source_type == SourceType::KoreanMedia { "KOREA" } @else { "JAPAN" }
                                    }
                                    @if let Some(last_crawled_at) = source.last_crawled_at {
                                        span ."o-sources__crawled" {
                                            "Last crawled: " (last_crawled_at.to_short_display())
                                        }
                                    }
                                    a href=(source.url) target="_blank" rel="noopener noreferrer" { (source.url) }
                                }
                                div ."o-table__actions" {
                                    form method="post" action=(format!("{LIST_PATH}/{}/toggle", source.id)) {
                                        button ."u-button" type="submit" {
                                            @if source.is_active { "無効にする" } @else { "有効にする" }
                                        }
                                    }
                                    a ."u-button" href=(format!("{LIST_PATH}/{}/edit", source.id)) { "編集" }
                                    form method="post"
                                        action=(format!("{LIST_PATH}/{}/delete", source.id))
                                        data-confirm="本当に削除しますか？"
                                    {
                                        button ."u-button -danger" type="submit" { "削除" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        };

        self.render_admin_page("メディア管理", AdminNav::Media, notice.as_ref(), content)
            .await
    }
}

fn render_source_form(editing: Option<&SourceRecord>) -> Markup {
    let action = match editing {
        Some(source) => format!("{LIST_PATH}/{}", source.id),
        None => LIST_PATH.to_string(),
    };
    let current_type = editing.map(|s| s.source_type).unwrap_or_default();
    html! {
        h2 ."o-card__title" {
            @if editing.is_some() { "メディアを編集" } @else { "メディアを登録" }
        }
        form ."o-form" method="post" action=(action) {
            label ."o-field" {
                span { "メディア名称 (必須)" }
                input type="text" name="name" required placeholder="例: VoCE公式サイト"
                    value=(editing.map(|s| s.name.as_str()).unwrap_or_default());
            }
            label ."o-field" {
                span { "URL (必須)" }
                input type="url" name="url" required placeholder="https://..."
                    value=(editing.map(|s| s.url.as_str()).unwrap_or_default());
            }
            label ."o-field" {
                span { "種別" }
                select name="type" {
                    @for source_type in SourceType::ALL {
                        option value=(source_type.as_str()) selected[source_type == current_type] {
                            (source_type.label())
                        }
                    }
                }
            }
            button ."u-button -primary" type="submit" {
                @if editing.is_some() { "更新する" } @else { "登録する" }
            }
            @if editing.is_some() {
                a ."u-buttonLink" href=(LIST_PATH) { "キャンセル" }
            }
        }
    }
}
