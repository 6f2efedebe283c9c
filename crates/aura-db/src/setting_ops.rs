use aura_core::settings::{
    DEFAULT_PERSONA_PROMPT, PERSONA_PROMPT_KEY, SITE_SETTINGS_DESCRIPTION, SITE_SETTINGS_KEY,
};
use aura_core::{SiteSettings, Timestamp};
use redb_bincode::ReadableTable as _;
use tracing::info;

use crate::{Database, DbResult, LOG_TARGET, SettingRecord, settings};

impl Database {
    pub async fn get_setting(&self, key: &str) -> DbResult<Option<SettingRecord>> {
        let key = key.to_owned();
        self.read_with(|tx| {
            let settings_tbl = tx.open_table(&settings::TABLE)?;
            Ok(settings_tbl.get(&key)?.map(|g| g.value()))
        })
        .await
    }

    /// Insert or replace the setting value
    ///
    /// A `None` description keeps the one already stored.
    pub async fn upsert_setting(
        &self,
        key: &str,
        value: String,
        description: Option<&str>,
    ) -> DbResult<SettingRecord> {
        let key = key.to_owned();
        self.write_with(|tx| {
            let mut settings_tbl = tx.open_table(&settings::TABLE)?;
            let existing_description = settings_tbl
                .get(&key)?
                .and_then(|g| g.value().description);

            let record = SettingRecord {
                key: key.clone(),
                value,
                description: description.map(ToOwned::to_owned).or(existing_description),
                updated_at: Timestamp::now(),
            };
            settings_tbl.insert(&key, &record)?;
            info!(target: LOG_TARGET, key = %record.key, "Setting saved");
            Ok(record)
        })
        .await
    }

    /// Site settings, with defaults for anything missing
    pub async fn get_site_settings(&self) -> DbResult<SiteSettings> {
        Ok(self
            .get_setting(SITE_SETTINGS_KEY)
            .await?
            .map(|record| SiteSettings::from_json_or_default(&record.value))
            .unwrap_or_default())
    }

    pub async fn save_site_settings(&self, site_settings: &SiteSettings) -> DbResult<SettingRecord> {
        self.upsert_setting(
            SITE_SETTINGS_KEY,
            site_settings.to_json(),
            Some(SITE_SETTINGS_DESCRIPTION),
        )
        .await
    }

    /// The AI persona prompt, or the built-in default if none was saved
    pub async fn get_persona_prompt(&self) -> DbResult<String> {
        Ok(self
            .get_setting(PERSONA_PROMPT_KEY)
            .await?
            .map(|record| record.value)
            .unwrap_or_else(|| DEFAULT_PERSONA_PROMPT.to_owned()))
    }
}
