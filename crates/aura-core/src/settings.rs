use serde::{Deserialize, Serialize};

/// Setting key holding the [`SiteSettings`] JSON document
pub const SITE_SETTINGS_KEY: &str = "site_settings";
pub const SITE_SETTINGS_DESCRIPTION: &str = "サイト全体の設定（SEO, Meta）";

/// Setting key holding the AI editor persona system prompt
pub const PERSONA_PROMPT_KEY: &str = "system_prompt_misaki";
pub const PERSONA_PROMPT_DESCRIPTION: &str = "AI編集長「美咲」のシステムプロンプト";

/// Persona prompt used until an admin saves one
pub const DEFAULT_PERSONA_PROMPT: &str = "あなたは美容メディア「AURA」の編集長「美咲（みさき）」です。
「AURA」は、20代〜40代の美容関心層に向けた、信頼できる美容情報メディアです。
あなたは編集長として、日本の薬機法・景表法・医療広告ガイドラインに最大限配慮しつつ、読者が「理解→納得→行動」できる専門的かつ実践的なコラムを執筆します。";

/// Site-wide SEO and metadata
///
/// Stored as JSON under [`SITE_SETTINGS_KEY`]. Any missing field takes its
/// default, so older or partial documents still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    pub title: String,
    pub description: String,
    pub og_image: String,
    pub twitter_handle: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: "Bikatsu Club AURA".to_string(),
            description: "美容医療・韓国美容の最新情報をお届けする信頼のメディア".to_string(),
            og_image: "https://placehold.co/1200x630.png".to_string(),
            twitter_handle: "@aura_beauty".to_string(),
        }
    }
}

impl SiteSettings {
    /// Parse a stored document, falling back to defaults if it is not valid
    /// JSON
    pub fn from_json_or_default(value: &str) -> Self {
        serde_json::from_str(value).unwrap_or_default()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("Can't fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_is_merged_over_defaults() {
        let s = SiteSettings::from_json_or_default(r#"{"title":"AURA Test"}"#);
        assert_eq!(s.title, "AURA Test");
        assert_eq!(s.twitter_handle, "@aura_beauty");
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        assert_eq!(
            SiteSettings::from_json_or_default("not json"),
            SiteSettings::default()
        );
    }

    #[test]
    fn uses_camel_case_keys() {
        let json = SiteSettings::default().to_json();
        assert!(json.contains("\"ogImage\""));
        assert!(json.contains("\"twitterHandle\""));
    }
}
