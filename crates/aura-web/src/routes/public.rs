use std::collections::HashMap;

use aura_core::article::summarize;
use aura_core::{ArticleId, CategoryId, LinkType};
use aura_db::{ArticleRecord, CategoryRecord};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect};
use maud::{Markup, html};
use serde::Deserialize;
use snafu::OptionExt as _;
use tracing::debug;

use super::Maud;
use super::login::session::AdminSession;
use crate::error::{RequestResult, SomethingNotFoundSnafu};
use crate::layout::{DEFAULT_ARTICLE_IMAGE, OpenGraphMeta};
use crate::markdown::{EMPTY_CONTENT_PLACEHOLDER, render_markdown};
use crate::{LOG_TARGET, SharedState, UiState};

const HOME_ARTICLES: usize = 8;
const RELATED_ARTICLES: usize = 3;
const DEFAULT_CATEGORY_NAME: &str = "Beauty";
const CLINIC_FALLBACK_URL: &str = "/clinics";
const LINE_FALLBACK_URL: &str = "https://line.me/";

type CategoryNames = HashMap<CategoryId, CategoryRecord>;

pub async fn get_home(state: State<SharedState>) -> RequestResult<impl IntoResponse> {
    let clinic_url = state.link_url_or(LinkType::Clinic, CLINIC_FALLBACK_URL).await?;
    let articles = state
        .db
        .list_published_articles(None, HOME_ARTICLES)
        .await?;
    let categories = state.categories_by_id().await?;

    let content = html! {
        section ."o-hero" {
            p ."o-hero__eyebrow" { "BIKATSU CLUB" }
            h1 ."o-hero__title" { "美しさは、" br; "日々の積み重ねから" }
            p ."o-hero__lead" {
                "美に投資する人のための美活コラム。" br;
                "AIが最新トレンドを分析し、専門家が監修してお届けします。"
            }
            a ."u-button -primary" href="#latest-topics-section" { "最新のトピックを見る" }
        }
        (render_conversion_banner(
            "clinic",
            "厳選！おすすめクリニック",
            "AURA編集部が自信を持って推薦する、技術と信頼のパートナー・クリニックをご紹介します。",
            &clinic_url,
            "詳しく見る",
        ))
        section id="latest-topics-section" ."o-latestTopics" {
            h2 ."o-sectionTitle" { "Latest Topics" }
            (render_category_pills(&categories, None))
            (render_article_grid(&articles, &categories))
            a ."u-buttonLink" href="/blog" { "すべての記事を見る" }
        }
    };

    Ok(Maud(state.render_public_page(None, content, None).await?))
}

#[derive(Deserialize)]
pub struct BlogListQuery {
    category: Option<String>,
}

pub async fn get_blog_list(
    state: State<SharedState>,
    Query(query): Query<BlogListQuery>,
) -> RequestResult<impl IntoResponse> {
    let categories = state.categories_by_id().await?;
    let selected = match query.category.as_deref().filter(|s| !s.is_empty()) {
        Some(slug) => Some(state.db.get_category_by_slug(slug).await?),
        None => None,
    };
    let articles = match selected {
        // unknown slug
        Some(None) => vec![],
        Some(Some(ref category)) => {
            state
                .db
                .list_published_articles(Some(category.id), usize::MAX)
                .await?
        }
        None => state.db.list_published_articles(None, usize::MAX).await?,
    };
    let selected_slug = query.category.as_deref();

    let content = html! {
        section ."o-latestTopics" {
            h1 ."o-sectionTitle" { "記事一覧" }
            (render_category_pills(&categories, selected_slug))
            (render_article_grid(&articles, &categories))
        }
    };
    Ok(Maud(
        state
            .render_public_page(Some("記事一覧"), content, None)
            .await?,
    ))
}

pub async fn get_blog_post(
    state: State<SharedState>,
    admin: Option<AdminSession>,
    Path(id): Path<ArticleId>,
) -> RequestResult<impl IntoResponse> {
    let article = state
        .db
        .get_article(id)
        .await?
        .context(SomethingNotFoundSnafu)?;
    let is_preview = !article.status.is_public();
    if is_preview && admin.is_none() {
        debug!(target: LOG_TARGET, %id, status = %article.status.as_str(), "Hiding non-public article");
        return Err(SomethingNotFoundSnafu.build().into());
    }

    let categories = state.categories_by_id().await?;
    let category_name = category_name(&article, &categories);
    let summary = article
        .summary
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| summarize(&article.content));
    let thumbnail = article
        .thumbnail_url
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_ARTICLE_IMAGE);
    let body = if article.content.trim().is_empty() {
        EMPTY_CONTENT_PLACEHOLDER
    } else {
        article.content.as_str()
    };
    let line_url = state.link_url_or(LinkType::Line, LINE_FALLBACK_URL).await?;
    let clinic_url = state.link_url_or(LinkType::Clinic, CLINIC_FALLBACK_URL).await?;
    let others: Vec<_> = state
        .db
        .list_published_articles(None, RELATED_ARTICLES + 1)
        .await?
        .into_iter()
        .filter(|a| a.id != article.id)
        .take(RELATED_ARTICLES)
        .collect();

    let content = html! {
        @if is_preview {
            div ."o-previewBanner" role="status" {
                "プレビュー表示中（ステータス: " (article.status.label()) "）。この記事は公開されていません。"
                a href=(format!("/admin/dashboard/articles/{}", article.id)) { "管理画面に戻る" }
            }
        }
        header ."o-articleHeader" {
            span ."o-pill -primary" { (category_name) }
            h1 ."o-articleHeader__title" { (article.title) }
            time ."o-articleHeader__date" datetime=(article.created_at.to_rfc3339()) {
                (article.created_at.to_date_display())
            }
        }
        div ."o-articleHero" {
            img src=(thumbnail) alt=(article.title);
        }
        div ."o-articleLayout" {
            article ."o-article" {
                div ."o-articleSummary" {
                    h3 { "✦ Point" }
                    p { (summary) }
                }
                div ."o-articleBody" {
                    (render_markdown(body))
                }
                (render_conversion_banner(
                    "campaign",
                    "初回限定キャンペーン",
                    "今ならLINE登録で、提携クリニックの施術が最大20%OFFになるクーポンをプレゼント中。",
                    &line_url,
                    "クーポンを受け取る",
                ))
            }
            aside ."o-articleSidebar" {
                a ."o-sidebarBanner" href=(clinic_url) {
                    span ."o-sidebarBanner__eyebrow" { "RECOMMENDED CLINIC" }
                    h3 ."o-sidebarBanner__title" { "失敗しないクリニック選び" }
                    p ."o-sidebarBanner__lead" { "AURA編集部厳選の" br; "信頼できる提携クリニック。" }
                    span ."o-sidebarBanner__button" { "提携クリニックを見る" }
                }
            }
        }
        @if !others.is_empty() {
            section ."o-latestPosts" {
                h2 ."o-sectionTitle" { "Latest Posts" }
                (render_article_grid(&others, &categories))
            }
        }
    };

    let og = OpenGraphMeta {
        title: article.title.clone(),
        description: summary.clone(),
        url: format!("{}/blog/{}", state.opts.base_url(), article.id),
        image: article
            .thumbnail_url
            .clone()
            .filter(|s| !s.is_empty()),
    };
    Ok(Maud(
        state
            .render_public_page(Some(&article.title), content, Some(&og))
            .await?,
    ))
}

pub async fn get_contact(state: State<SharedState>) -> RequestResult<impl IntoResponse> {
    let content = html! {
        section ."o-staticPage" {
            h1 ."o-sectionTitle" { "お問い合わせ" }
            div ."o-card" {
                p { "当メディアに関するお問い合わせは、以下のメールアドレスまでお願いいたします。" }
                a ."o-staticPage__mail" href="mailto:contact@aura-beauty.jp" { "contact@aura-beauty.jp" }
                p ."o-staticPage__note" {
                    "※通常、3営業日以内に返信いたします。内容によっては回答できない場合もございますのでご了承ください。"
                }
            }
        }
    };
    Ok(Maud(
        state
            .render_public_page(Some("お問い合わせ"), content, None)
            .await?,
    ))
}

/// Tracked redirect through a keyed link
pub async fn get_go_link(
    state: State<SharedState>,
    Path(key): Path<String>,
) -> RequestResult<Redirect> {
    let link = state
        .db
        .register_link_click(&key)
        .await?
        .context(SomethingNotFoundSnafu)?;
    Ok(Redirect::to(&link.url))
}

impl UiState {
    async fn categories_by_id(&self) -> RequestResult<CategoryNames> {
        Ok(self
            .db
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect())
    }

    /// Url of the newest link of `link_type`, or `fallback`
    async fn link_url_or(&self, link_type: LinkType, fallback: &str) -> RequestResult<String> {
        Ok(self
            .db
            .latest_link_by_type(link_type)
            .await?
            .map(|link| link.url)
            .unwrap_or_else(|| fallback.to_owned()))
    }
}

fn category_name<'a>(article: &ArticleRecord, categories: &'a CategoryNames) -> &'a str {
    article
        .category_id
        .and_then(|id| categories.get(&id))
        .map_or(DEFAULT_CATEGORY_NAME, |c| c.name.as_str())
}

fn render_conversion_banner(
    kind: &str,
    title: &str,
    description: &str,
    url: &str,
    button: &str,
) -> Markup {
    html! {
        section class=(format!("o-conversionBanner -{kind}")) {
            h2 ."o-conversionBanner__title" { (title) }
            p ."o-conversionBanner__lead" { (description) }
            a ."u-button -primary" href=(url) target="_blank" rel="noopener noreferrer sponsored" { (button) }
        }
    }
}

fn render_category_pills(categories: &CategoryNames, selected: Option<&str>) -> Markup {
    let mut sorted: Vec<_> = categories.values().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    html! {
        nav ."o-categoryPills" {
            a ."o-pill" ."-active"[selected.is_none()] href="/blog" { "All" }
            @for category in sorted {
                a ."o-pill"
                    ."-active"[selected == Some(category.slug.as_str())]
                    href=(format!("/blog?category={}", urlencoding::encode(&category.slug)))
                { (category.name) }
            }
        }
    }
}

fn render_article_grid(articles: &[ArticleRecord], categories: &CategoryNames) -> Markup {
    html! {
        @if articles.is_empty() {
            p ."o-empty" { "記事がまだありません" }
        } @else {
            div ."o-articleGrid" {
                @for article in articles {
                    (render_article_card(article, categories))
                }
            }
        }
    }
}

fn render_article_card(article: &ArticleRecord, categories: &CategoryNames) -> Markup {
    let date = article.published_at.unwrap_or(article.created_at);
    let summary = article
        .summary
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| summarize(&article.content));
    html! {
        a ."o-articleCard" href=(format!("/blog/{}", article.id)) {
            div ."o-articleCard__image" {
                img src=(article.thumbnail_url.as_deref().filter(|s| !s.is_empty()).unwrap_or(DEFAULT_ARTICLE_IMAGE))
                    alt=""
                    loading="lazy";
                span ."o-articleCard__category" { (category_name(article, categories)) }
            }
            h3 ."o-articleCard__title" { (article.title) }
            p ."o-articleCard__summary" { (summary) }
            time ."o-articleCard__date" datetime=(date.to_rfc3339()) { (date.to_date_display()) }
        }
    }
}

#[cfg(test)]
mod tests {
    use aura_core::{ArticleStatus, Timestamp};

    use super::*;

    fn article(category_id: Option<CategoryId>) -> ArticleRecord {
        ArticleRecord {
            id: ArticleId::new(1),
            title: "t".into(),
            content: "c".into(),
            status: ArticleStatus::Published,
            category_id,
            thumbnail_url: None,
            source_url: None,
            admin_feedback: None,
            generated_by: None,
            summary: None,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
            published_at: None,
        }
    }

    #[test]
    fn category_name_falls_back() {
        let mut categories = CategoryNames::new();
        categories.insert(
            CategoryId::new(3),
            CategoryRecord {
                id: CategoryId::new(3),
                name: "スキンケア".into(),
                slug: "skincare".into(),
                created_at: Timestamp::now(),
            },
        );
        assert_eq!(category_name(&article(None), &categories), "Beauty");
        assert_eq!(
            category_name(&article(Some(CategoryId::new(9))), &categories),
            "Beauty"
        );
        assert_eq!(
            category_name(&article(Some(CategoryId::new(3))), &categories),
            "スキンケア"
        );
    }
}
