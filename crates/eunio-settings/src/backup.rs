//! 설정 백업/내보내기 관리자.
//!
//! 내보내기는 전송 형식(JSON) 문자열을 돌려주고,
//! 가져오기/복원은 적용 직전 상태를 스냅샷으로 남긴 뒤 덮어쓴다.
//! 스냅샷은 사용자별로 `retention`개까지만 보존한다.

use std::sync::Arc;

use chrono::Utc;
use eunio_core::error::CoreError;
use eunio_core::models::backup::{MergeStrategy, SettingsBackup};
use eunio_core::models::settings::{SyncStatus, UserSettings};
use eunio_core::ports::repository::{BackupStore, SettingsRepository};
use tracing::{debug, info};

fn settings_not_found(user_id: &str) -> CoreError {
    CoreError::NotFound {
        resource_type: "UserSettings".to_string(),
        id: user_id.to_string(),
    }
}

pub struct BackupManager {
    repository: Arc<dyn SettingsRepository>,
    store: Arc<dyn BackupStore>,
    retention: usize,
}

impl BackupManager {
    pub fn new(
        repository: Arc<dyn SettingsRepository>,
        store: Arc<dyn BackupStore>,
        retention: usize,
    ) -> Self {
        Self {
            repository,
            store,
            retention: retention.max(1),
        }
    }

    /// 저장된 설정을 전송 형식으로 내보내기
    pub async fn export_settings(&self, user_id: &str) -> Result<String, CoreError> {
        let settings = self
            .repository
            .get_user_settings(user_id)
            .await?
            .ok_or_else(|| settings_not_found(user_id))?;

        let data = settings.to_transport()?;
        debug!("설정 내보내기: user={user_id} ({} bytes)", data.len());
        Ok(data)
    }

    /// 전송 형식 설정 가져오기
    ///
    /// 페이로드의 `userId`는 무시하고 `user_id`로 덮어쓴다.
    /// 저장되는 버전은 `max(로컬, 가져온 값) + 1`.
    pub async fn import_settings(
        &self,
        user_id: &str,
        data: &str,
        strategy: MergeStrategy,
    ) -> Result<UserSettings, CoreError> {
        let mut imported = UserSettings::from_transport(data)?;
        if imported.user_id != user_id {
            info!(
                "가져온 설정 소유자 재지정: '{}' → '{user_id}'",
                imported.user_id
            );
        }
        imported.user_id = user_id.to_string();
        imported.ensure_valid()?;

        let local = self.repository.get_user_settings(user_id).await?;

        let mut merged = match (strategy, &local) {
            (MergeStrategy::PreferNewer, Some(current))
                if current.last_modified > imported.last_modified =>
            {
                info!("로컬 설정이 더 최근, 가져오기 생략 (user={user_id})");
                return Ok(current.clone());
            }
            (MergeStrategy::KeepManualUnits, Some(current))
                if current.unit_preferences.is_manually_set =>
            {
                imported.unit_preferences = current.unit_preferences;
                imported
            }
            _ => imported,
        };

        match &local {
            Some(current) => {
                self.snapshot(current).await?;
                merged.stamp_mutation(current);
            }
            None => {
                merged.version += 1;
                merged.last_modified = Utc::now();
                merged.sync_status = SyncStatus::Pending;
            }
        }

        self.repository.save_user_settings(&merged).await?;
        self.prune(user_id).await?;

        info!(
            "설정 가져오기 완료: user={user_id} v{} ({strategy:?})",
            merged.version
        );
        Ok(merged)
    }

    /// 현재 설정 스냅샷 생성
    pub async fn create_backup(&self, user_id: &str) -> Result<SettingsBackup, CoreError> {
        let settings = self
            .repository
            .get_user_settings(user_id)
            .await?
            .ok_or_else(|| settings_not_found(user_id))?;

        let backup = self.snapshot(&settings).await?;
        self.prune(user_id).await?;
        Ok(backup)
    }

    pub async fn get_backup(&self, backup_id: &str) -> Result<Option<SettingsBackup>, CoreError> {
        self.store.get_backup(backup_id).await
    }

    /// 사용자 백업 목록 (최신순)
    pub async fn list_backups(&self, user_id: &str) -> Result<Vec<SettingsBackup>, CoreError> {
        self.store.list_backups(user_id).await
    }

    /// 스냅샷으로 복원. 복원 직전 상태도 스냅샷으로 남긴다.
    pub async fn restore_from_backup(&self, backup_id: &str) -> Result<UserSettings, CoreError> {
        let backup = self
            .store
            .get_backup(backup_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                resource_type: "SettingsBackup".to_string(),
                id: backup_id.to_string(),
            })?;

        let user_id = backup.user_id.as_str();
        let mut restored = backup.settings.clone();
        restored.user_id = user_id.to_string();
        restored.ensure_valid()?;

        match self.repository.get_user_settings(user_id).await? {
            Some(current) => {
                self.snapshot(&current).await?;
                restored.stamp_mutation(&current);
            }
            None => {
                restored.version += 1;
                restored.last_modified = Utc::now();
                restored.sync_status = SyncStatus::Pending;
            }
        }

        self.repository.save_user_settings(&restored).await?;
        self.prune(user_id).await?;

        info!(
            "백업 복원: {backup_id} (user={user_id}, 스냅샷 v{} → v{})",
            backup.settings_version, restored.version
        );
        Ok(restored)
    }

    /// 보존 개수를 넘는 오래된 백업 삭제. 삭제한 개수를 반환한다.
    pub async fn prune(&self, user_id: &str) -> Result<usize, CoreError> {
        let backups = self.store.list_backups(user_id).await?;
        let mut removed = 0;
        for stale in backups.iter().skip(self.retention) {
            self.store.delete_backup(&stale.backup_id).await?;
            removed += 1;
        }
        if removed > 0 {
            debug!("오래된 백업 {removed}개 삭제 (user={user_id})");
        }
        Ok(removed)
    }

    async fn snapshot(&self, settings: &UserSettings) -> Result<SettingsBackup, CoreError> {
        let backup = SettingsBackup::snapshot(settings)?;
        self.store.save_backup(&backup).await?;
        debug!(
            "설정 스냅샷 저장: {} (v{})",
            backup.backup_id, backup.settings_version
        );
        Ok(backup)
    }
}
