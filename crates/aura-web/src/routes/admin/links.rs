use aura_core::{LinkId, LinkType};
use aura_db::{LinkInput, LinkRecord};
use axum::Form;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect};
use maud::{Markup, html};
use serde::Deserialize;
use snafu::OptionExt as _;
use tower_sessions::Session;

use super::{finish_db_action, take_notice};
use crate::error::{RequestResult, SomethingNotFoundSnafu};
use crate::layout::{AdminNav, Notice};
use crate::routes::Maud;
use crate::routes::login::session::AdminSession;
use crate::{SharedState, UiState};

const LIST_PATH: &str = "/admin/dashboard/links";

fn type_option_label(link_type: LinkType) -> &'static str {
    match link_type {
        LinkType::Affiliate => "アフィリエイト (Article Ad)",
        LinkType::Line => "LINE公式 (Footer/CTA)",
        LinkType::Clinic => "おすすめクリニック (Sidebar/Banner)",
    }
}

#[derive(Deserialize)]
pub struct LinkForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    key: Option<String>,
    #[serde(default, rename = "type")]
    link_type: LinkType,
}

impl From<LinkForm> for LinkInput {
    fn from(form: LinkForm) -> Self {
        LinkInput {
            name: form.name,
            url: form.url,
            key: form.key,
            link_type: form.link_type,
        }
    }
}

pub async fn get_links(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
) -> RequestResult<impl IntoResponse> {
    let notice = take_notice(&session).await?;
    Ok(Maud(state.links_page(None, notice).await?))
}

pub async fn get_edit_link(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<LinkId>,
) -> RequestResult<impl IntoResponse> {
    let notice = take_notice(&session).await?;
    let link = state
        .db
        .get_link(id)
        .await?
        .context(SomethingNotFoundSnafu)?;
    Ok(Maud(state.links_page(Some(&link), notice).await?))
}

pub async fn post_new_link(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Form(form): Form<LinkForm>,
) -> RequestResult<Redirect> {
    finish_db_action(
        &session,
        state.db.create_link(form.into()).await,
        |_| "Created successfully".to_string(),
        LIST_PATH,
    )
    .await
}

pub async fn post_update_link(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<LinkId>,
    Form(form): Form<LinkForm>,
) -> RequestResult<Redirect> {
    let res = state.db.update_link(id, form.into()).await;
    let back = if res.is_ok() {
        LIST_PATH.to_string()
    } else {
        format!("{LIST_PATH}/{id}/edit")
    };
    finish_db_action(&session, res, |_| "Updated successfully".to_string(), &back).await
}

pub async fn post_delete_link(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Path(id): Path<LinkId>,
) -> RequestResult<Redirect> {
    finish_db_action(
        &session,
        state.db.delete_link(id).await,
        |link| format!("Deleted: {}", link.name),
        LIST_PATH,
    )
    .await
}

impl UiState {
    async fn links_page(
        &self,
        editing: Option<&LinkRecord>,
        notice: Option<Notice>,
    ) -> RequestResult<Markup> {
        let links = self.db.list_links().await?;
        let content = html! {
            section ."o-card" {
                (render_link_form(editing))
            }
            section ."o-card" {
                @if links.is_empty() {
                    p ."o-empty" { "リンクがありません" }
                } @else {
                    table ."o-table" {
                        thead {
                            tr {
                                th { "Name" }
                                th { "Type" }
                                th { "Key" }
                                th { "URL" }
                                th { "Clicks" }
                                th {}
                            }
                        }
                        tbody {
                            @for link in &links {
                                tr {
                                    td { (link.name) }
                                    td { (link.link_type.label()) }
                                    td {
                                        @if let Some(ref key) = link.key {
                                            a href=(format!("/go/{}", urlencoding::encode(key))) target="_blank" {
                                                code { (key) }
                                            }
                                        } @else {
                                            "-"
                                        }
                                    }
                                    td ."o-table__url" {
                                        a href=(link.url) target="_blank" rel="noopener noreferrer" { (link.url) }
                                    }
                                    td { (link.clicks) }
                                    td ."o-table__actions" {
                                        a ."u-button" href=(format!("{LIST_PATH}/{}/edit", link.id)) { "Edit" }
                                        form method="post"
                                            action=(format!("{LIST_PATH}/{}/delete", link.id))
                                            data-confirm="Are you sure?"
                                        {
                                            button ."u-button -danger" type="submit" { "Delete" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        };
        self.render_admin_page("リンク管理", AdminNav::Links, notice.as_ref(), content)
            .await
    }
}

fn render_link_form(editing: Option<&LinkRecord>) -> Markup {
    let action = match editing {
        Some(link) => format!("{LIST_PATH}/{}", link.id),
        None => LIST_PATH.to_string(),
    };
    let current_type = editing.map(|l| l.link_type).unwrap_or_default();
    html! {
        h2 ."o-card__title" {
            @if editing.is_some() { "Edit Link" } @else { "Add New Link" }
        }
        form ."o-form" method="post" action=(action) {
            label ."o-field" {
                span { "Type" }
                select name="type" {
                    @for link_type in LinkType::ALL {
                        option value=(link_type.as_str()) selected[link_type == current_type] {
                            (type_option_label(link_type))
                        }
                    }
                }
            }
            label ."o-field" {
                span { "Name" }
                input type="text" name="name" required placeholder="Example Campaign"
                    value=(editing.map(|l| l.name.as_str()).unwrap_or_default());
            }
            label ."o-field" {
                span { "URL" }
                input type="url" name="url" required placeholder="https://..."
                    value=(editing.map(|l| l.url.as_str()).unwrap_or_default());
            }
            label ."o-field" {
                span { "Key (optional)" }
                input type="text" name="key" placeholder="campaign-spring-2026"
                    value=(editing.and_then(|l| l.key.as_deref()).unwrap_or_default());
            }
            button ."u-button -primary" type="submit" {
                @if editing.is_some() { "Update" } @else { "Create" }
            }
            @if editing.is_some() {
                a ."u-buttonLink" href=(LIST_PATH) { "Cancel" }
            }
        }
    }
}
