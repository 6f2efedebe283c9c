use aura_core::settings::{DEFAULT_PERSONA_PROMPT, PERSONA_PROMPT_DESCRIPTION, PERSONA_PROMPT_KEY};
use aura_core::Timestamp;
use axum::Form;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect};
use maud::{Markup, html};
use serde::Deserialize;
use tower_sessions::Session;

use super::{finish_db_action, take_notice};
use crate::error::RequestResult;
use crate::layout::{AdminNav, Notice};
use crate::routes::Maud;
use crate::routes::login::session::AdminSession;
use crate::{SharedState, UiState};

const PAGE_PATH: &str = "/admin/dashboard/ai-settings";

pub async fn get_ai_settings(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
) -> RequestResult<impl IntoResponse> {
    let notice = take_notice(&session).await?;
    let stored = state.db.get_setting(PERSONA_PROMPT_KEY).await?;
    let (prompt, updated_at) = match stored {
        Some(record) => (record.value, Some(record.updated_at)),
        None => (DEFAULT_PERSONA_PROMPT.to_owned(), None),
    };
    Ok(Maud(
        state
            .ai_settings_page(&prompt, updated_at, notice)
            .await?,
    ))
}

#[derive(Deserialize)]
pub struct PersonaForm {
    #[serde(default)]
    prompt: String,
}

pub async fn post_ai_settings(
    state: State<SharedState>,
    _admin: AdminSession,
    session: Session,
    Form(form): Form<PersonaForm>,
) -> RequestResult<Redirect> {
    finish_db_action(
        &session,
        state
            .db
            .upsert_setting(
                PERSONA_PROMPT_KEY,
                form.prompt,
                Some(PERSONA_PROMPT_DESCRIPTION),
            )
            .await,
        |_| "設定を保存しました。次回の記事生成から反映されます。".to_string(),
        PAGE_PATH,
    )
    .await
}

/// Put the built-in prompt back into the editor, without saving it
pub async fn post_reset(
    state: State<SharedState>,
    _admin: AdminSession,
) -> RequestResult<impl IntoResponse> {
    let updated_at = state
        .db
        .get_setting(PERSONA_PROMPT_KEY)
        .await?
        .map(|record| record.updated_at);
    let notice = Notice::success("初期値を読み込みました。保存するまで反映されません。");
    Ok(Maud(
        state
            .ai_settings_page(DEFAULT_PERSONA_PROMPT, updated_at, Some(notice))
            .await?,
    ))
}

impl UiState {
    async fn ai_settings_page(
        &self,
        prompt: &str,
        updated_at: Option<Timestamp>,
        notice: Option<Notice>,
    ) -> RequestResult<Markup> {
        let content = html! {
            p ."o-adminMain__lead" {
                "記事生成に使用するAI「美咲」の振る舞いやルールを設定します"
            }
            p ."o-adminMain__meta" {
                "Last Updated: "
                @if let Some(updated_at) = updated_at {
                    (updated_at.to_short_display())
                } @else {
                    "Never"
                }
            }
            section ."o-card -critical" {
                div ."o-card__header" {
                    h2 ."o-card__title" {
                        "システムプロンプト (System Prompt) "
                        span ."o-badge -danger" { "Critical" }
                    }
                    form method="post" action=(format!("{PAGE_PATH}/reset"))
                        data-confirm="プロンプトを初期値（デフォルト）に戻しますか？保存するまで反映されません。"
                    {
                        button ."u-button" type="submit" { "リセット" }
                    }
                }
                p ."o-card__lead" {
                    "AIの性格、文体、記事構成のルールを定義します。変更は慎重に行ってください。"
                }
                div ."o-warning" {
                    "プロンプト内の " code { "{keyword}" } " などの波括弧は、生成時に動的に置換されます。削除しないように注意してください。"
                }
                form ."o-form" method="post" action=(PAGE_PATH) {
                    textarea ."o-field__textarea -mono"
                        name="prompt"
                        rows="24"
                        placeholder="ここにプロンプトを入力..."
                    { (prompt) }
                    button ."u-button -primary" type="submit" { "設定を保存" }
                }
            }
        };
        self.render_admin_page(
            "AI人格設定 (Persona)",
            AdminNav::AiSettings,
            notice.as_ref(),
            content,
        )
        .await
    }
}
