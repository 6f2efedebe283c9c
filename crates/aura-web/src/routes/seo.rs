//! Crawler-facing documents: sitemap, robots and the Atom feed

use aura_core::Timestamp;
use atom_syndication::{Content, Entry, Feed, Link, Person};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use maud::{PreEscaped, html};

use crate::SharedState;
use crate::error::RequestResult;
use crate::markdown::render_markdown;

const FEED_SIZE: usize = 50;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Response wrapper for Atom feeds
pub struct AtomFeed(pub Feed);

impl IntoResponse for AtomFeed {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, "application/atom+xml; charset=utf-8")],
            self.0.to_string(),
        )
            .into_response()
    }
}

pub async fn get_sitemap(state: State<SharedState>) -> RequestResult<impl IntoResponse> {
    let base_url = state.opts.base_url();
    let now = Timestamp::now().to_rfc3339();
    let articles = state.db.list_published_articles(None, usize::MAX).await?;

    let doc = html! {
        (PreEscaped(r#"<?xml version="1.0" encoding="UTF-8"?>"#))
        urlset xmlns=(SITEMAP_NS) {
            url {
                loc { (base_url) }
                lastmod { (now) }
                changefreq { "daily" }
                priority { "1.0" }
            }
            url {
                loc { (base_url) "/#latest-topics-section" }
                lastmod { (now) }
                changefreq { "daily" }
                priority { "0.9" }
            }
            @for article in &articles {
                url {
                    loc { (base_url) "/blog/" (article.id) }
                    lastmod { (article.updated_at.to_rfc3339()) }
                    changefreq { "weekly" }
                    priority { "0.8" }
                }
            }
        }
    };

    Ok((
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        doc.into_string(),
    ))
}

pub async fn get_robots(state: State<SharedState>) -> impl IntoResponse {
    let body = format!(
        "User-agent: *\nAllow: /\nDisallow: /admin/\nDisallow: /api/\n\nSitemap: {}/sitemap.xml\n",
        state.opts.base_url()
    );
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}

pub async fn get_feed_atom(state: State<SharedState>) -> RequestResult<impl IntoResponse> {
    let base_url = state.opts.base_url();
    let site = state.db.get_site_settings().await?;
    let articles = state.db.list_published_articles(None, FEED_SIZE).await?;

    let entries: Vec<Entry> = articles
        .iter()
        .map(|article| {
            let published = article.published_at.unwrap_or(article.created_at);
            Entry {
                id: format!("{base_url}/blog/{}", article.id),
                title: article.title.clone(),
                updated: article.updated_at.to_rfc3339(),
                published: Some(published.to_rfc3339()),
                authors: vec![Person {
                    name: site.title.clone(),
                    ..Default::default()
                }],
                links: vec![Link {
                    href: format!("{base_url}/blog/{}", article.id),
                    rel: Some("alternate".to_string()),
                    ..Default::default()
                }],
                content: Some(Content::Html(
                    render_markdown(&article.content).into_string(),
                )),
                ..Default::default()
            }
        })
        .collect();

    // latest edit among the entries, not the latest publication
    let updated = articles
        .iter()
        .map(|article| article.updated_at)
        .max()
        .unwrap_or(Timestamp::ZERO)
        .to_rfc3339();

    let feed = Feed {
        id: format!("{base_url}/"),
        title: site.title.clone(),
        updated,
        entries,
        links: vec![
            Link {
                href: format!("{base_url}/feed.xml"),
                rel: Some("self".to_string()),
                mediatype: Some("application/atom+xml".to_string()),
                ..Default::default()
            },
            Link {
                href: format!("{base_url}/"),
                rel: Some("alternate".to_string()),
                ..Default::default()
            },
        ],
        authors: vec![Person {
            name: site.title,
            ..Default::default()
        }],
        ..Default::default()
    };

    Ok(AtomFeed(feed))
}
