use aura_core::SiteSettings;
use axum::Form;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect};
use maud::html;
use serde::Deserialize;
use tower_sessions::Session;

use super::{finish_db_action, take_notice};
use crate::error::RequestResult;
use crate::layout::AdminNav;
use crate::routes::Maud;
use crate::routes::login::session::AdminSession;
use crate::SharedState;

const PAGE_PATH: &str = "/admin/dashboard/settings";

pub async fn get_settings(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
) -> RequestResult<impl IntoResponse> {
    let notice = take_notice(&session).await?;
    let site = state.db.get_site_settings().await?;

    let content = html! {
        p ."o-adminMain__lead" { "Webサイトの基本情報やSEO設定を管理します" }
        section ."o-card" {
            h2 ."o-card__title" { "基本情報 & SEO" }
            p ."o-card__lead" { "検索エンジンやSNSで表示されるサイト全体の情報を設定します。" }
            form ."o-form" method="post" action=(PAGE_PATH) {
                label ."o-field" {
                    span { "サイトタイトル" }
                    input type="text" name="title" value=(site.title) placeholder="Bikatsu Club AURA";
                    small { "ブラウザのタブや検索結果のタイトルに表示されます。" }
                }
                label ."o-field" {
                    span { "サイト説明文 (Meta Description)" }
                    textarea name="description" rows="3" placeholder="サイトの概要を入力..." {
                        (site.description)
                    }
                    small { "検索結果の下部に表示される説明文（スニペット）です。120文字程度が推奨です。" }
                }
                div ."o-form__row" {
                    label ."o-field" {
                        span { "デフォルトOGP画像 URL" }
                        input type="text" name="og_image" value=(site.og_image) placeholder="https://...";
                    }
                    label ."o-field" {
                        span { "X (Twitter) アカウント" }
                        input type="text" name="twitter_handle" value=(site.twitter_handle) placeholder="@username";
                    }
                }
                button ."u-button -primary" type="submit" { "設定を保存" }
            }
        }
    };

    Ok(Maud(
        state
            .render_admin_page(
                "一般設定 (General Settings)",
                AdminNav::Settings,
                notice.as_ref(),
                content,
            )
            .await?,
    ))
}

#[derive(Deserialize)]
pub struct SiteSettingsForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    og_image: String,
    #[serde(default)]
    twitter_handle: String,
}

impl From<SiteSettingsForm> for SiteSettings {
    fn from(form: SiteSettingsForm) -> Self {
        SiteSettings {
            title: form.title.trim().to_owned(),
            description: form.description.trim().to_owned(),
            og_image: form.og_image.trim().to_owned(),
            twitter_handle: form.twitter_handle.trim().to_owned(),
        }
    }
}

pub async fn post_settings(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Form(form): Form<SiteSettingsForm>,
) -> RequestResult<Redirect> {
    let site: SiteSettings = form.into();
    finish_db_action(
        &session,
        state.db.save_site_settings(&site).await,
        |_| "設定を保存しました。".to_string(),
        PAGE_PATH,
    )
    .await
}
