//! 설정 백업 스토리지 (BackupStore 포트 구현).

use async_trait::async_trait;
use eunio_core::error::CoreError;
use eunio_core::models::backup::SettingsBackup;
use eunio_core::ports::repository::BackupStore;
use rusqlite::OptionalExtension;
use tracing::debug;

use super::SqliteStorage;

fn parse_backup(data: &str) -> Result<SettingsBackup, CoreError> {
    serde_json::from_str(data)
        .map_err(|e| CoreError::Persistence(format!("백업 파싱 실패: {e}")))
}

#[async_trait]
impl BackupStore for SqliteStorage {
    async fn save_backup(&self, backup: &SettingsBackup) -> Result<(), CoreError> {
        let data = serde_json::to_string(backup)?;
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO settings_backups
                (backup_id, user_id, created_at, settings_version, size_bytes, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                backup.backup_id,
                backup.user_id,
                backup.created_at.to_rfc3339(),
                backup.settings_version as i64,
                backup.size_bytes as i64,
                data,
            ],
        )
        .map_err(|e| CoreError::Persistence(format!("백업 저장 실패: {e}")))?;

        debug!("백업 저장: {} (user={})", backup.backup_id, backup.user_id);
        Ok(())
    }

    async fn get_backup(&self, backup_id: &str) -> Result<Option<SettingsBackup>, CoreError> {
        let conn = self.lock()?;

        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM settings_backups WHERE backup_id = ?1",
                rusqlite::params![backup_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CoreError::Persistence(format!("백업 조회 실패: {e}")))?;

        data.as_deref().map(parse_backup).transpose()
    }

    async fn list_backups(&self, user_id: &str) -> Result<Vec<SettingsBackup>, CoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT data FROM settings_backups
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, settings_version DESC",
            )
            .map_err(|e| CoreError::Persistence(format!("쿼리 준비 실패: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params![user_id], |row| row.get::<_, String>(0))
            .map_err(|e| CoreError::Persistence(format!("쿼리 실행 실패: {e}")))?;

        let mut backups = Vec::new();
        for row in rows {
            let data = row.map_err(|e| CoreError::Persistence(format!("행 읽기 실패: {e}")))?;
            backups.push(parse_backup(&data)?);
        }
        Ok(backups)
    }

    async fn delete_backup(&self, backup_id: &str) -> Result<(), CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM settings_backups WHERE backup_id = ?1",
            rusqlite::params![backup_id],
        )
        .map_err(|e| CoreError::Persistence(format!("백업 삭제 실패: {e}")))?;
        Ok(())
    }
}
