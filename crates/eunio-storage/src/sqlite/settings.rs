//! 사용자 설정 스토리지 (SettingsStore 포트 구현).

use async_trait::async_trait;
use eunio_core::error::CoreError;
use eunio_core::models::settings::UserSettings;
use eunio_core::ports::repository::SettingsStore;
use rusqlite::OptionalExtension;
use tracing::debug;

use super::SqliteStorage;

#[async_trait]
impl SettingsStore for SqliteStorage {
    async fn load(&self, user_id: &str) -> Result<Option<UserSettings>, CoreError> {
        let conn = self.lock()?;

        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM user_settings WHERE user_id = ?1",
                rusqlite::params![user_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CoreError::Persistence(format!("설정 조회 실패: {e}")))?;

        data.map(|json| {
            serde_json::from_str::<UserSettings>(&json)
                .map_err(|e| CoreError::Persistence(format!("저장된 설정 파싱 실패: {e}")))
        })
        .transpose()
    }

    async fn store(&self, settings: &UserSettings) -> Result<(), CoreError> {
        let data = serde_json::to_string(settings)?;
        let conn = self.lock()?;

        // 같은 내용이면 행을 건드리지 않는다
        let changed = conn
            .execute(
                "INSERT INTO user_settings (user_id, data, version, last_modified, sync_status)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                    data = excluded.data,
                    version = excluded.version,
                    last_modified = excluded.last_modified,
                    sync_status = excluded.sync_status,
                    updated_at = datetime('now')
                 WHERE user_settings.data <> excluded.data",
                rusqlite::params![
                    settings.user_id,
                    data,
                    settings.version as i64,
                    settings.last_modified.to_rfc3339(),
                    settings.sync_status.as_str(),
                ],
            )
            .map_err(|e| CoreError::Persistence(format!("설정 저장 실패: {e}")))?;

        debug!(
            "설정 저장: user={} version={} changed={changed}",
            settings.user_id, settings.version
        );
        Ok(())
    }

    async fn remove(&self, user_id: &str) -> Result<(), CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM user_settings WHERE user_id = ?1",
            rusqlite::params![user_id],
        )
        .map_err(|e| CoreError::Persistence(format!("설정 삭제 실패: {e}")))?;
        debug!("설정 삭제: user={user_id}");
        Ok(())
    }
}
