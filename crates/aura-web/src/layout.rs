use aura_core::SiteSettings;
use maud::{DOCTYPE, Markup, html};
use serde::{Deserialize, Serialize};

use crate::UiState;
use crate::error::RequestResult;

/// Bundled image used for articles without a thumbnail
pub const DEFAULT_ARTICLE_IMAGE: &str = "/assets/article_header_water_glow.svg";

/// Open Graph meta tags for rich link previews
pub struct OpenGraphMeta {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// One-off message shown at the top of an admin page
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn render(&self) -> Markup {
        let class = match self.kind {
            NoticeKind::Success => "o-notice -success",
            NoticeKind::Error => "o-notice -error",
        };
        html! {
            div class=(class) role="status" { (self.message) }
        }
    }
}

/// Sections of the admin sidebar
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminNav {
    Dashboard,
    Articles,
    Links,
    AiSettings,
    Settings,
    Media,
}

impl AdminNav {
    const ALL: [AdminNav; 6] = [
        AdminNav::Dashboard,
        AdminNav::Articles,
        AdminNav::Links,
        AdminNav::AiSettings,
        AdminNav::Settings,
        AdminNav::Media,
    ];

    fn href(self) -> &'static str {
        match self {
            AdminNav::Dashboard => "/admin/dashboard",
            AdminNav::Articles => "/admin/dashboard/articles",
            AdminNav::Links => "/admin/dashboard/links",
            AdminNav::AiSettings => "/admin/dashboard/ai-settings",
            AdminNav::Settings => "/admin/dashboard/settings",
            AdminNav::Media => "/admin/dashboard/media",
        }
    }

    fn label(self) -> &'static str {
        match self {
            AdminNav::Dashboard => "ダッシュボード",
            AdminNav::Articles => "記事管理",
            AdminNav::Links => "リンク管理",
            AdminNav::AiSettings => "AI人格設定",
            AdminNav::Settings => "一般設定",
            AdminNav::Media => "メディア管理",
        }
    }
}

impl UiState {
    /// Html page header
    pub(crate) fn render_html_head(
        &self,
        page_title: &str,
        site: &SiteSettings,
        og: Option<&OpenGraphMeta>,
    ) -> Markup {
        let description = og.map_or(site.description.as_str(), |og| og.description.as_str());
        let og_image = og
            .and_then(|og| og.image.as_deref())
            .unwrap_or(site.og_image.as_str());
        html! {
            (DOCTYPE)
            html lang="ja";
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="description" content=(description);
                link rel="stylesheet" type="text/css" href="/assets/style.css";
                link rel="icon" type="image/svg+xml" href="/assets/favicon.svg";
                link rel="alternate" type="application/atom+xml"
                     title=(site.title) href="/feed.xml";
                title { (page_title) }
                meta property="og:site_name" content=(site.title);
                @if let Some(og) = og {
                    meta property="og:type" content="article";
                    meta property="og:title" content=(og.title);
                    meta property="og:url" content=(og.url);
                } @else {
                    meta property="og:type" content="website";
                    meta property="og:title" content=(site.title);
                }
                meta property="og:description" content=(description);
                meta property="og:image" content=(og_image);
                meta name="twitter:card" content="summary_large_image";
                meta name="twitter:site" content=(site.twitter_handle);
                script defer src="/assets/app.js" {}
            }
        }
    }

    /// A full public page, with site header and footer
    pub async fn render_public_page(
        &self,
        title: Option<&str>,
        content: Markup,
        og: Option<&OpenGraphMeta>,
    ) -> RequestResult<Markup> {
        let site = self.db.get_site_settings().await?;
        let page_title = match title {
            Some(title) => format!("{title} | {}", site.title),
            None => site.title.clone(),
        };
        Ok(html! {
            (self.render_html_head(&page_title, &site, og))
            body ."o-body" {
                (render_site_header())
                main ."o-main" { (content) }
                (render_site_footer(&site))
            }
        })
    }

    /// A full admin page with the sidebar
    pub async fn render_admin_page(
        &self,
        title: &str,
        active: AdminNav,
        notice: Option<&Notice>,
        content: Markup,
    ) -> RequestResult<Markup> {
        let site = self.db.get_site_settings().await?;
        Ok(html! {
            (self.render_html_head(&format!("{title} | AURA Admin"), &site, None))
            body ."o-body -admin" {
                div ."o-adminLayout" {
                    (render_admin_sidebar(active))
                    main ."o-adminMain" {
                        h1 ."o-adminMain__title" { (title) }
                        @if let Some(notice) = notice {
                            (notice.render())
                        }
                        (content)
                    }
                }
            }
        })
    }
}

fn render_admin_sidebar(active: AdminNav) -> Markup {
    html! {
        nav ."o-adminSidebar" {
            a ."o-adminSidebar__brand" href="/admin/dashboard" { "AURA Admin" }
            ul ."o-adminSidebar__items" {
                @for item in AdminNav::ALL {
                    li {
                        a ."o-adminSidebar__item"
                            ."-active"[item == active]
                            href=(item.href())
                        { (item.label()) }
                    }
                }
            }
            form ."o-adminSidebar__logout" method="post" action="/admin/logout" {
                button type="submit" ."u-buttonLink" { "ログアウト" }
            }
            a ."o-adminSidebar__site" href="/" target="_blank" { "サイトを表示" }
        }
    }
}

fn render_site_header() -> Markup {
    html! {
        header ."o-siteHeader" {
            a ."o-siteHeader__brand" href="/" {
                img ."o-siteHeader__logo" src="/assets/favicon.svg" alt="" width="40" height="40";
                span ."o-siteHeader__name" { "AURA" }
                span ."o-siteHeader__sub" { "BIKATSU CLUB" }
            }
            nav ."o-siteHeader__nav" {
                a href="/" { "Top" }
                a href="/#latest-topics-section" ."-active" { "Column" }
            }
        }
    }
}

fn render_site_footer(site: &SiteSettings) -> Markup {
    html! {
        footer ."o-siteFooter" {
            p { "© 2026 " (site.title) ". All rights reserved." }
            nav ."o-siteFooter__links" {
                a href="/blog" { "Column" }
                a href="/contact" { "Contact" }
                a href="/feed.xml" { "Feed" }
                a ."-faint" href="/admin/login" { "Admin" }
            }
        }
    }
}
