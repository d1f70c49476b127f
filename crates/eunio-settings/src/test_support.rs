//! 테스트용 인메모리 포트 구현.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use eunio_core::error::CoreError;
use eunio_core::models::backup::SettingsBackup;
use eunio_core::models::notification::{NotificationPreferences, NotificationType};
use eunio_core::models::settings::{SyncStatus, UserSettings};
use eunio_core::models::units::{UnitPreferences, UnitSystem};
use eunio_core::ports::notification::{
    NotificationScheduler, PermissionStatus, PlatformNotifier, ScheduledNotification,
};
use eunio_core::ports::repository::{BackupStore, SettingsRepository};
use eunio_core::ports::session::UserProfileStore;
use eunio_core::ports::triggers::{CycleMetricsTrigger, PredictionTrigger};

use crate::unit_system::UnitPreferencesStore;

#[derive(Default)]
pub struct MemoryRepository {
    pub rows: Mutex<HashMap<String, UserSettings>>,
    pub fail_saves: AtomicBool,
    pub fail_sync: AtomicBool,
    /// 동기화 호출이 끝나지 않음
    pub stall_sync: AtomicBool,
    /// 동기화 시 알림을 끈 원격 문서가 채택된 것처럼 동작
    pub remote_notifications_off: AtomicBool,
    pub saves: AtomicUsize,
    pub loads: AtomicUsize,
}

impl MemoryRepository {
    pub fn with(settings: UserSettings) -> Self {
        let repo = Self::default();
        repo.rows
            .lock()
            .unwrap()
            .insert(settings.user_id.clone(), settings);
        repo
    }

    pub fn row(&self, user_id: &str) -> Option<UserSettings> {
        self.rows.lock().unwrap().get(user_id).cloned()
    }
}

#[async_trait]
impl SettingsRepository for MemoryRepository {
    async fn get_user_settings(&self, user_id: &str) -> Result<Option<UserSettings>, CoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.row(user_id))
    }

    async fn save_user_settings(&self, settings: &UserSettings) -> Result<(), CoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence("디스크 가득 참".to_string()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .unwrap()
            .insert(settings.user_id.clone(), settings.clone());
        Ok(())
    }

    async fn sync_settings(&self, user_id: &str) -> Result<UserSettings, CoreError> {
        if self.stall_sync.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }
        let mut rows = self.rows.lock().unwrap();
        let settings = rows.get_mut(user_id).ok_or_else(|| CoreError::NotFound {
            resource_type: "UserSettings".to_string(),
            id: user_id.to_string(),
        })?;
        if self.remote_notifications_off.load(Ordering::SeqCst) {
            settings.notification_preferences.global_notifications_enabled = false;
        }
        settings.sync_status = if self.fail_sync.load(Ordering::SeqCst) {
            SyncStatus::Error
        } else {
            SyncStatus::Synced
        };
        Ok(settings.clone())
    }

    async fn clear_settings(&self, user_id: &str) -> Result<(), CoreError> {
        self.rows.lock().unwrap().remove(user_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBackupStore {
    pub backups: Mutex<Vec<SettingsBackup>>,
}

#[async_trait]
impl BackupStore for MemoryBackupStore {
    async fn save_backup(&self, backup: &SettingsBackup) -> Result<(), CoreError> {
        self.backups.lock().unwrap().push(backup.clone());
        Ok(())
    }

    async fn get_backup(&self, backup_id: &str) -> Result<Option<SettingsBackup>, CoreError> {
        Ok(self
            .backups
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.backup_id == backup_id)
            .cloned())
    }

    async fn list_backups(&self, user_id: &str) -> Result<Vec<SettingsBackup>, CoreError> {
        let mut list: Vec<SettingsBackup> = self
            .backups
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.settings_version.cmp(&a.settings_version))
        });
        Ok(list)
    }

    async fn delete_backup(&self, backup_id: &str) -> Result<(), CoreError> {
        self.backups
            .lock()
            .unwrap()
            .retain(|b| b.backup_id != backup_id);
        Ok(())
    }
}

/// 예약 요청을 기록하는 플랫폼 알림
pub struct RecordingNotifier {
    pub permission: Mutex<PermissionStatus>,
    /// 권한 요청 시 돌려줄 결과
    pub request_result: PermissionStatus,
    pub scheduled: Mutex<Vec<ScheduledNotification>>,
    pub cancel_calls: AtomicUsize,
    pub failing_kinds: Mutex<Vec<NotificationType>>,
}

impl RecordingNotifier {
    pub fn granted() -> Self {
        Self::with_permission(PermissionStatus::Granted, PermissionStatus::Granted)
    }

    pub fn with_permission(current: PermissionStatus, on_request: PermissionStatus) -> Self {
        Self {
            permission: Mutex::new(current),
            request_result: on_request,
            scheduled: Mutex::new(Vec::new()),
            cancel_calls: AtomicUsize::new(0),
            failing_kinds: Mutex::new(Vec::new()),
        }
    }

    pub fn scheduled_kinds(&self) -> Vec<NotificationType> {
        self.scheduled.lock().unwrap().iter().map(|n| n.kind).collect()
    }
}

#[async_trait]
impl PlatformNotifier for RecordingNotifier {
    async fn permission_status(&self) -> Result<PermissionStatus, CoreError> {
        Ok(*self.permission.lock().unwrap())
    }

    async fn request_permission(&self) -> Result<PermissionStatus, CoreError> {
        *self.permission.lock().unwrap() = self.request_result;
        Ok(self.request_result)
    }

    async fn schedule(&self, request: &ScheduledNotification) -> Result<(), CoreError> {
        if self.failing_kinds.lock().unwrap().contains(&request.kind) {
            return Err(CoreError::Notification(format!("{} 예약 거부", request.id)));
        }
        self.scheduled.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), CoreError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.scheduled.lock().unwrap().clear();
        Ok(())
    }

    async fn open_settings(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

/// 알림 브리지 호출을 기록하는 스케줄러
#[derive(Default)]
pub struct RecordingScheduler {
    pub calls: Mutex<Vec<NotificationPreferences>>,
    pub fail: AtomicBool,
}

impl RecordingScheduler {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationScheduler for RecordingScheduler {
    async fn update_notification_schedule(
        &self,
        preferences: &NotificationPreferences,
    ) -> Result<(), CoreError> {
        self.calls.lock().unwrap().push(*preferences);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::PermissionDenied("테스트 거부".to_string()));
        }
        Ok(())
    }

    async fn permission_status(&self) -> Result<PermissionStatus, CoreError> {
        Ok(PermissionStatus::Granted)
    }

    async fn request_permission(&self) -> Result<PermissionStatus, CoreError> {
        Ok(PermissionStatus::Granted)
    }

    async fn cancel_all_notifications(&self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn open_platform_settings(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

/// 주기 재계산/예측 갱신 호출 기록
#[derive(Default)]
pub struct RecordingTriggers {
    pub calls: Mutex<Vec<String>>,
    pub fail_recalc: AtomicBool,
}

impl RecordingTriggers {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CycleMetricsTrigger for RecordingTriggers {
    async fn recalculate_cycle_metrics(&self, user_id: &str) -> Result<(), CoreError> {
        self.calls.lock().unwrap().push(format!("recalc:{user_id}"));
        if self.fail_recalc.load(Ordering::SeqCst) {
            return Err(CoreError::Internal("재계산 실패".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PredictionTrigger for RecordingTriggers {
    async fn update_prediction_with_current_data(&self, user_id: &str) -> Result<(), CoreError> {
        self.calls.lock().unwrap().push(format!("predict:{user_id}"));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    pub systems: Mutex<HashMap<String, UnitSystem>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl UserProfileStore for MemoryProfileStore {
    async fn update_unit_system(&self, user_id: &str, system: UnitSystem) -> Result<(), CoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::Network("프로필 서버 응답 없음".to_string()));
        }
        self.systems
            .lock()
            .unwrap()
            .insert(user_id.to_string(), system);
        Ok(())
    }
}

/// 사용자별 단위 선호만 보관하는 저장 포트
#[derive(Default)]
pub struct MemoryUnitPreferences {
    pub rows: Mutex<HashMap<String, UnitPreferences>>,
    pub fail_saves: AtomicBool,
    pub saves: AtomicUsize,
}

impl MemoryUnitPreferences {
    pub fn with(user_id: &str, preferences: UnitPreferences) -> Self {
        let store = Self::default();
        store
            .rows
            .lock()
            .unwrap()
            .insert(user_id.to_string(), preferences);
        store
    }

    pub fn get(&self, user_id: &str) -> Option<UnitPreferences> {
        self.rows.lock().unwrap().get(user_id).copied()
    }
}

#[async_trait]
impl UnitPreferencesStore for MemoryUnitPreferences {
    async fn load_unit_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<UnitPreferences>, CoreError> {
        Ok(self.get(user_id))
    }

    async fn save_unit_preferences(
        &self,
        user_id: &str,
        preferences: UnitPreferences,
    ) -> Result<(), CoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence("디스크 가득 참".to_string()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .unwrap()
            .insert(user_id.to_string(), preferences);
        Ok(())
    }
}
