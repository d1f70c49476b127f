//! 설정 관리자.
//!
//! 사용자 세션당 하나. 메모리 사본(`watch` 채널)을 독점 소유하고,
//! 모든 변경을 하나의 원자적 순서로 처리한다:
//!
//! 1. 검증: 실패 시 아무것도 바뀌지 않음
//! 2. 저장: 실패/타임아웃 시 메모리 사본 유지
//! 3. 확정: `send_replace` 한 번으로 구독자에게 발행
//! 4. 부수 효과: 알림 재예약, 주기 재계산, 단위 캐시 갱신 (실패는 경고로만 보고)

use std::future::Future;
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use eunio_core::config::PersistenceConfig;
use eunio_core::error::{CoreError, FieldViolation};
use eunio_core::models::backup::{MergeStrategy, SettingsBackup};
use eunio_core::models::notification::NotificationPreferences;
use eunio_core::models::preferences::{
    CyclePreferences, DisplayPreferences, PrivacyPreferences, SyncPreferences,
};
use eunio_core::models::settings::{PreferenceGroup, SyncStatus, UserSettings};
use eunio_core::models::units::{UnitPreferences, UnitSystem};
use eunio_core::ports::notification::NotificationScheduler;
use eunio_core::ports::repository::SettingsRepository;
use eunio_core::ports::triggers::{CycleMetricsTrigger, PredictionTrigger};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::backup::BackupManager;
use crate::unit_system::{default_system_for_country, UnitPreferencesStore, UnitSystemManager};

/// 저장 이후 실패한 부수 효과 (설정 변경 자체는 확정됨)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectWarning {
    pub group: PreferenceGroup,
    pub message: String,
}

impl SideEffectWarning {
    fn new(group: PreferenceGroup, error: &CoreError) -> Self {
        Self {
            group,
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for SideEffectWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.group, self.message)
    }
}

/// 변경 결과: 확정된 설정 + 부수 효과 경고
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub settings: UserSettings,
    pub warnings: Vec<SideEffectWarning>,
}

impl UpdateOutcome {
    /// 경고 없이 끝났는지
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// 제한 시간 안에 끝나지 않으면 `CoreError::Timeout`
async fn with_deadline<T, F>(operation: &str, limit: Duration, future: F) -> Result<T, CoreError>
where
    F: Future<Output = Result<T, CoreError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{operation} 타임아웃 ({limit:?})");
            Err(CoreError::Timeout {
                operation: operation.to_string(),
                timeout_ms: limit.as_millis() as u64,
            })
        }
    }
}

/// 동기화 도중 취소되면 호출 전 값을 다시 발행
struct RestoreOnCancel<'a> {
    state: &'a watch::Sender<Option<UserSettings>>,
    previous: Option<UserSettings>,
}

impl RestoreOnCancel<'_> {
    fn disarm(mut self) {
        self.previous = None;
    }
}

impl Drop for RestoreOnCancel<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            debug!("동기화 취소, 이전 설정 복원");
            self.state.send_replace(Some(previous));
        }
    }
}

/// 사용자 설정 관리자
pub struct SettingsManager {
    user_id: String,
    repository: Arc<dyn SettingsRepository>,
    backups: Arc<BackupManager>,
    notifications: Arc<dyn NotificationScheduler>,
    cycle_metrics: Arc<dyn CycleMetricsTrigger>,
    predictions: Arc<dyn PredictionTrigger>,
    unit_system: Option<Arc<UnitSystemManager>>,
    /// 확정된 설정 (None = 아직 로드 전)
    state: watch::Sender<Option<UserSettings>>,
    /// 읽기-수정-저장-확정 직렬화 + 첫 로드 직렬화
    write_lock: Mutex<()>,
    config: PersistenceConfig,
}

impl SettingsManager {
    pub fn new(
        user_id: impl Into<String>,
        repository: Arc<dyn SettingsRepository>,
        backups: Arc<BackupManager>,
        notifications: Arc<dyn NotificationScheduler>,
        cycle_metrics: Arc<dyn CycleMetricsTrigger>,
        predictions: Arc<dyn PredictionTrigger>,
        config: PersistenceConfig,
    ) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            user_id: user_id.into(),
            repository,
            backups,
            notifications,
            cycle_metrics,
            predictions,
            unit_system: None,
            state,
            write_lock: Mutex::new(()),
            config,
        }
    }

    /// 단위 변경 시 캐시를 갱신할 단위 체계 관리자 연결
    pub fn with_unit_system(mut self, unit_system: Arc<UnitSystemManager>) -> Self {
        self.unit_system = Some(unit_system);
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn cached(&self) -> Option<UserSettings> {
        self.state.borrow().clone()
    }

    fn publish(&self, settings: UserSettings) {
        self.state.send_replace(Some(settings));
    }

    async fn persist(&self, operation: &str, settings: &UserSettings) -> Result<(), CoreError> {
        with_deadline(
            operation,
            self.config.timeout(),
            self.repository.save_user_settings(settings),
        )
        .await
    }

    async fn fetch(&self) -> Result<Option<UserSettings>, CoreError> {
        with_deadline(
            "설정 조회",
            self.config.timeout(),
            self.repository.get_user_settings(&self.user_id),
        )
        .await
    }

    /// 캐시 → 저장소 → 기본값(저장) 순으로 설정 확보. `write_lock` 보유 상태에서 호출.
    async fn load_locked(&self) -> Result<UserSettings, CoreError> {
        if let Some(settings) = self.cached() {
            return Ok(settings);
        }

        let settings = match self.fetch().await? {
            Some(mut stored) => {
                if stored.user_id != self.user_id {
                    warn!(
                        "저장된 설정의 소유자 불일치 '{}', '{}'로 교정",
                        stored.user_id, self.user_id
                    );
                    stored.user_id.clone_from(&self.user_id);
                }
                stored
            }
            None => {
                let defaults = UserSettings::defaults(&self.user_id);
                self.persist("기본 설정 저장", &defaults).await?;
                info!("첫 실행, 기본 설정 저장 (user={})", self.user_id);
                defaults
            }
        };

        self.publish(settings.clone());
        Ok(settings)
    }

    /// 현재 설정 (첫 호출 시 저장소에서 로드, 없으면 기본값 저장)
    pub async fn get_user_settings(&self) -> Result<UserSettings, CoreError> {
        if let Some(settings) = self.cached() {
            return Ok(settings);
        }
        let _guard = self.write_lock.lock().await;
        self.load_locked().await
    }

    /// 원자적 변경 순서. `forced` 그룹은 값이 같아도 부수 효과를 실행한다.
    async fn commit<F>(
        &self,
        operation: &str,
        transform: F,
        forced: &[PreferenceGroup],
    ) -> Result<UpdateOutcome, CoreError>
    where
        F: FnOnce(&mut UserSettings) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let current = self.load_locked().await?;

        let mut next = current.clone();
        transform(&mut next);
        next.user_id.clone_from(&self.user_id);
        next.ensure_valid()?;

        let mut groups = next.changed_groups(&current);
        if groups.is_empty() {
            debug!("{operation}: 변경 없음");
            let warnings = self.run_side_effects(&current, forced).await;
            return Ok(UpdateOutcome {
                settings: current,
                warnings,
            });
        }

        next.stamp_mutation(&current);
        self.persist(operation, &next).await?;
        self.publish(next.clone());
        debug!(
            "{operation}: v{} 확정 ({})",
            next.version,
            groups
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        for group in forced {
            if !groups.contains(group) {
                groups.push(*group);
            }
        }
        let warnings = self.run_side_effects(&next, &groups).await;
        Ok(UpdateOutcome {
            settings: next,
            warnings,
        })
    }

    async fn run_side_effects(
        &self,
        settings: &UserSettings,
        groups: &[PreferenceGroup],
    ) -> Vec<SideEffectWarning> {
        let mut warnings = Vec::new();

        for &group in groups {
            match group {
                PreferenceGroup::Notification => {
                    if let Err(e) = self
                        .notifications
                        .update_notification_schedule(&settings.notification_preferences)
                        .await
                    {
                        warnings.push(SideEffectWarning::new(group, &e));
                    }
                }
                PreferenceGroup::Cycle => {
                    match self
                        .cycle_metrics
                        .recalculate_cycle_metrics(&self.user_id)
                        .await
                    {
                        Ok(()) => {
                            if let Err(e) = self
                                .predictions
                                .update_prediction_with_current_data(&self.user_id)
                                .await
                            {
                                warnings.push(SideEffectWarning::new(group, &e));
                            }
                        }
                        // 재계산 없이 예측만 갱신하면 오래된 지표를 쓰게 된다
                        Err(e) => warnings.push(SideEffectWarning::new(group, &e)),
                    }
                }
                PreferenceGroup::Unit => {
                    if let Some(unit_system) = &self.unit_system {
                        unit_system.apply_cached(settings.unit_preferences.system());
                    }
                }
                PreferenceGroup::Privacy | PreferenceGroup::Display | PreferenceGroup::Sync => {}
            }
        }

        for warning in &warnings {
            warn!("부수 효과 실패 (설정은 저장됨): {warning}");
        }
        warnings
    }

    pub async fn update_unit_preferences(
        &self,
        preferences: UnitPreferences,
    ) -> Result<UpdateOutcome, CoreError> {
        self.commit(
            "단위 선호 변경",
            move |s| s.unit_preferences = preferences,
            &[],
        )
        .await
    }

    pub async fn update_notification_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> Result<UpdateOutcome, CoreError> {
        self.commit(
            "알림 선호 변경",
            move |s| s.notification_preferences = preferences,
            &[],
        )
        .await
    }

    pub async fn update_cycle_preferences(
        &self,
        preferences: CyclePreferences,
    ) -> Result<UpdateOutcome, CoreError> {
        self.commit(
            "주기 선호 변경",
            move |s| s.cycle_preferences = preferences,
            &[],
        )
        .await
    }

    pub async fn update_privacy_preferences(
        &self,
        preferences: PrivacyPreferences,
    ) -> Result<UpdateOutcome, CoreError> {
        self.commit(
            "개인정보 선호 변경",
            move |s| s.privacy_preferences = preferences,
            &[],
        )
        .await
    }

    pub async fn update_display_preferences(
        &self,
        preferences: DisplayPreferences,
    ) -> Result<UpdateOutcome, CoreError> {
        self.commit(
            "화면 선호 변경",
            move |s| s.display_preferences = preferences,
            &[],
        )
        .await
    }

    pub async fn update_sync_preferences(
        &self,
        preferences: SyncPreferences,
    ) -> Result<UpdateOutcome, CoreError> {
        self.commit(
            "동기화 선호 변경",
            move |s| s.sync_preferences = preferences,
            &[],
        )
        .await
    }

    /// 여러 그룹을 한 번에 바꾸는 원자적 변경. 값이 바뀐 그룹마다 부수 효과 실행.
    pub async fn update_settings<F>(&self, transform: F) -> Result<UpdateOutcome, CoreError>
    where
        F: FnOnce(&mut UserSettings) + Send,
    {
        self.commit("설정 변경", transform, &[]).await
    }

    /// 그룹 규칙 + 집계 규칙 위반 전체
    pub fn validate_settings(&self, settings: &UserSettings) -> Vec<FieldViolation> {
        let mut violations = settings.validate();
        if !settings.user_id.is_empty() && settings.user_id != self.user_id {
            violations.push(FieldViolation::new(
                "userId",
                format!("현재 사용자({})의 설정이 아닙니다", self.user_id),
            ));
        }
        violations
    }

    /// 기본값으로 초기화. 알림은 항상 다시 예약한다.
    pub async fn reset_to_defaults(
        &self,
        preserve_unit_preferences: bool,
    ) -> Result<UpdateOutcome, CoreError> {
        let user_id = self.user_id.clone();
        self.commit(
            "기본값 초기화",
            move |s| {
                let mut defaults = UserSettings::defaults(user_id);
                if preserve_unit_preferences {
                    defaults.unit_preferences = s.unit_preferences;
                }
                // 마지막 동기화 시각은 선호가 아니라 기록이다
                defaults.sync_preferences.last_sync_time = s.sync_preferences.last_sync_time;
                s.unit_preferences = defaults.unit_preferences;
                s.notification_preferences = defaults.notification_preferences;
                s.cycle_preferences = defaults.cycle_preferences;
                s.privacy_preferences = defaults.privacy_preferences;
                s.display_preferences = defaults.display_preferences;
                s.sync_preferences = defaults.sync_preferences;
            },
            &[PreferenceGroup::Notification],
        )
        .await
    }

    /// 전송 형식으로 내보내기
    pub async fn export_settings(&self) -> Result<String, CoreError> {
        self.get_user_settings().await?;
        self.backups.export_settings(&self.user_id).await
    }

    /// 전송 형식 가져오기 (전체 교체)
    pub async fn import_settings(&self, data: &str) -> Result<UpdateOutcome, CoreError> {
        self.import_settings_with(data, MergeStrategy::Replace).await
    }

    /// 병합 전략을 지정한 가져오기. 모든 그룹의 부수 효과를 다시 실행한다.
    pub async fn import_settings_with(
        &self,
        data: &str,
        strategy: MergeStrategy,
    ) -> Result<UpdateOutcome, CoreError> {
        let _guard = self.write_lock.lock().await;
        self.load_locked().await?;

        let imported = with_deadline(
            "설정 가져오기",
            self.config.timeout(),
            self.backups.import_settings(&self.user_id, data, strategy),
        )
        .await?;

        self.recommit_from_store(imported).await
    }

    /// 백업 복원. 다른 사용자의 백업은 거부한다.
    pub async fn restore_backup(&self, backup_id: &str) -> Result<UpdateOutcome, CoreError> {
        let not_found = || CoreError::NotFound {
            resource_type: "SettingsBackup".to_string(),
            id: backup_id.to_string(),
        };

        let backup = self
            .backups
            .get_backup(backup_id)
            .await?
            .ok_or_else(not_found)?;
        if backup.user_id != self.user_id {
            warn!(
                "다른 사용자의 백업 복원 시도 거부: {backup_id} (owner={})",
                backup.user_id
            );
            return Err(not_found());
        }

        let _guard = self.write_lock.lock().await;
        let restored = with_deadline(
            "백업 복원",
            self.config.timeout(),
            self.backups.restore_from_backup(backup_id),
        )
        .await?;

        self.recommit_from_store(restored).await
    }

    /// 저장소 기준으로 다시 읽어 확정하고 모든 그룹의 부수 효과 실행
    async fn recommit_from_store(
        &self,
        fallback: UserSettings,
    ) -> Result<UpdateOutcome, CoreError> {
        let settings = self.fetch().await?.unwrap_or(fallback);
        self.publish(settings.clone());
        let warnings = self
            .run_side_effects(&settings, &PreferenceGroup::ALL)
            .await;
        Ok(UpdateOutcome { settings, warnings })
    }

    pub async fn list_backups(&self) -> Result<Vec<SettingsBackup>, CoreError> {
        self.backups.list_backups(&self.user_id).await
    }

    /// 원격과 동기화. 동기화 중에는 로컬 변경이 대기한다.
    ///
    /// 원격 값이 채택되어 바뀐 그룹은 부수 효과를 다시 실행하고 경고로 보고한다.
    /// 타임아웃 등으로 끝나지 못하면 ERROR 상태를 기록한 뒤 에러를 돌려준다.
    pub async fn sync_settings(&self) -> Result<UpdateOutcome, CoreError> {
        let _guard = self.write_lock.lock().await;
        let before = self.load_locked().await?;

        let mut syncing = before.clone();
        syncing.sync_status = SyncStatus::Syncing;
        let restore = RestoreOnCancel {
            state: &self.state,
            previous: Some(before.clone()),
        };
        self.publish(syncing);

        let result = with_deadline(
            "설정 동기화",
            self.config.sync_timeout(),
            self.repository.sync_settings(&self.user_id),
        )
        .await;

        match result {
            Ok(synced) => {
                self.publish(synced.clone());
                restore.disarm();
                info!(
                    "동기화 결과: user={} {} v{}",
                    self.user_id,
                    synced.sync_status.as_str(),
                    synced.version
                );
                let changed = synced.changed_groups(&before);
                let warnings = self.run_side_effects(&synced, &changed).await;
                Ok(UpdateOutcome {
                    settings: synced,
                    warnings,
                })
            }
            Err(e) => {
                warn!("동기화 실패: user={} {e}", self.user_id);
                self.record_sync_failure(before).await;
                restore.disarm();
                Err(e)
            }
        }
    }

    /// 끝나지 못한 동기화를 ERROR로 기록. 기록도 실패하면 호출 전 값 유지.
    async fn record_sync_failure(&self, before: UserSettings) {
        let mut failed = match self.fetch().await {
            Ok(Some(stored)) => stored,
            _ => before.clone(),
        };
        failed.user_id.clone_from(&self.user_id);
        failed.sync_status = SyncStatus::Error;

        match self.persist("동기화 실패 기록", &failed).await {
            Ok(()) => self.publish(failed),
            Err(e) => {
                warn!("동기화 실패 상태 기록 실패: {e}");
                self.publish(before);
            }
        }
    }

    pub async fn is_synced(&self) -> bool {
        matches!(
            self.get_user_settings().await,
            Ok(settings) if settings.sync_status == SyncStatus::Synced
        )
    }

    /// 설정 변경 스트림. 구독 즉시 현재 값을 먼저 전달한다.
    pub async fn observe_settings_changes(
        &self,
    ) -> Result<impl Stream<Item = UserSettings> + Send + 'static, CoreError> {
        self.get_user_settings().await?;
        Ok(WatchStream::new(self.state.subscribe()).filter_map(|settings| settings))
    }

    /// 동기화 완료 여부 스트림 (값이 바뀔 때만)
    pub async fn observe_sync_status(
        &self,
    ) -> Result<impl Stream<Item = bool> + Send + 'static, CoreError> {
        let mut last = None;
        Ok(self
            .observe_settings_changes()
            .await?
            .filter_map(move |settings| {
                let synced = settings.sync_status == SyncStatus::Synced;
                if last == Some(synced) {
                    None
                } else {
                    last = Some(synced);
                    Some(synced)
                }
            }))
    }

    /// 로케일 기본 단위 적용. 직접 고른 단위는 유지하며, 실패 시 Metric.
    pub async fn initialize_units_from_locale(&self, country_code: &str) -> UnitSystem {
        let system = default_system_for_country(country_code);
        let result = self
            .commit(
                "로케일 단위 초기화",
                move |s| {
                    if !s.unit_preferences.is_manually_set {
                        s.unit_preferences = UnitPreferences::for_system(system, false);
                    }
                },
                &[],
            )
            .await;

        match result {
            Ok(outcome) => {
                let applied = outcome.settings.unit_preferences.system();
                if let Some(unit_system) = &self.unit_system {
                    unit_system.apply_cached(applied);
                }
                applied
            }
            Err(e) => {
                warn!("로케일 단위 초기화 실패 ({country_code}), Metric 사용: {e}");
                UnitSystem::Metric
            }
        }
    }

    /// 사용자가 직접 고른 단위 체계 저장 + 프로필 반영(best-effort)
    pub async fn set_unit_system(&self, system: UnitSystem) -> Result<UpdateOutcome, CoreError> {
        let outcome = self
            .update_unit_preferences(UnitPreferences::for_system(system, true))
            .await?;
        if let Some(unit_system) = &self.unit_system {
            unit_system.apply_cached(system);
            unit_system.mirror_to_profile(&self.user_id, system).await;
        }
        Ok(outcome)
    }

    /// 연결 복구 시 자동 동기화 (자동 동기화 꺼짐/이미 동기화됨이면 생략)
    pub async fn on_connectivity_changed(&self, is_connected: bool) -> Option<UserSettings> {
        if !is_connected {
            debug!("오프라인, 변경은 로컬에만 저장");
            return None;
        }

        let settings = match self.get_user_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("연결 복구 후 설정 조회 실패: {e}");
                return None;
            }
        };

        if !settings.sync_preferences.auto_sync_enabled {
            debug!("자동 동기화 꺼짐, 연결 복구 동기화 생략");
            return None;
        }
        if settings.sync_status == SyncStatus::Synced {
            return None;
        }

        info!("연결 복구, 설정 동기화 시작");
        match self.sync_settings().await {
            Ok(outcome) => Some(outcome.settings),
            Err(e) => {
                warn!("연결 복구 동기화 실패: {e}");
                None
            }
        }
    }

    /// 연결 상태 수신기를 구독해 온라인 전환마다 `on_connectivity_changed` 호출
    pub fn spawn_connectivity_listener(
        self: Arc<Self>,
        mut online: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while online.changed().await.is_ok() {
                let is_connected = *online.borrow_and_update();
                self.on_connectivity_changed(is_connected).await;
            }
            debug!("연결 상태 채널 종료, 리스너 종료");
        })
    }

    pub async fn unit_preferences(&self) -> Result<UnitPreferences, CoreError> {
        Ok(self.get_user_settings().await?.unit_preferences)
    }

    pub async fn notification_preferences(&self) -> Result<NotificationPreferences, CoreError> {
        Ok(self.get_user_settings().await?.notification_preferences)
    }

    pub async fn cycle_preferences(&self) -> Result<CyclePreferences, CoreError> {
        Ok(self.get_user_settings().await?.cycle_preferences)
    }

    pub async fn privacy_preferences(&self) -> Result<PrivacyPreferences, CoreError> {
        Ok(self.get_user_settings().await?.privacy_preferences)
    }

    pub async fn display_preferences(&self) -> Result<DisplayPreferences, CoreError> {
        Ok(self.get_user_settings().await?.display_preferences)
    }

    pub async fn sync_preferences(&self) -> Result<SyncPreferences, CoreError> {
        Ok(self.get_user_settings().await?.sync_preferences)
    }
}

/// 단위 체계 관리자의 저장 포트를 설정 관리자의 쓰기 경로로 연결하는 어댑터.
///
/// 단위 변경도 `write_lock`, 버전 증가, 캐시 확정을 그대로 거친다.
/// 관리자 생성 후 `bind`로 연결한다.
#[derive(Default)]
pub struct ManagedUnitPreferences {
    manager: OnceLock<Weak<SettingsManager>>,
}

impl ManagedUnitPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, manager: &Arc<SettingsManager>) {
        if self.manager.set(Arc::downgrade(manager)).is_err() {
            warn!("단위 선호 어댑터가 이미 설정 관리자에 연결됨");
        }
    }

    fn manager_for(&self, user_id: &str) -> Result<Arc<SettingsManager>, CoreError> {
        let manager = self
            .manager
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| CoreError::Internal("설정 관리자 미연결".to_string()))?;
        if manager.user_id() != user_id {
            return Err(CoreError::validation(
                "userId",
                format!("현재 사용자({})의 설정이 아닙니다", manager.user_id()),
            ));
        }
        Ok(manager)
    }
}

#[async_trait]
impl UnitPreferencesStore for ManagedUnitPreferences {
    async fn load_unit_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<UnitPreferences>, CoreError> {
        let manager = self.manager_for(user_id)?;
        Ok(Some(manager.unit_preferences().await?))
    }

    async fn save_unit_preferences(
        &self,
        user_id: &str,
        preferences: UnitPreferences,
    ) -> Result<(), CoreError> {
        let manager = self.manager_for(user_id)?;
        manager.update_unit_preferences(preferences).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        MemoryBackupStore, MemoryRepository, RecordingScheduler, RecordingTriggers,
    };
    use eunio_core::models::notification::NotificationSetting;
    use eunio_core::models::preferences::HapticIntensity;
    use eunio_core::models::units::TemperatureUnit;
    use eunio_core::ports::session::StaticSession;
    use std::sync::atomic::Ordering;

    struct Harness {
        repo: Arc<MemoryRepository>,
        backups: Arc<MemoryBackupStore>,
        scheduler: Arc<RecordingScheduler>,
        triggers: Arc<RecordingTriggers>,
        unit_system: Arc<UnitSystemManager>,
        manager: Arc<SettingsManager>,
    }

    fn harness_with(repo: MemoryRepository) -> Harness {
        let repo = Arc::new(repo);
        let backups = Arc::new(MemoryBackupStore::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let triggers = Arc::new(RecordingTriggers::default());
        let unit_store = Arc::new(ManagedUnitPreferences::new());
        let unit_system = Arc::new(UnitSystemManager::new(
            Arc::new(StaticSession::new("u1")),
            unit_store.clone(),
        ));
        let manager = SettingsManager::new(
            "u1",
            repo.clone(),
            Arc::new(BackupManager::new(repo.clone(), backups.clone(), 5)),
            scheduler.clone(),
            triggers.clone(),
            triggers.clone(),
            PersistenceConfig::default(),
        )
        .with_unit_system(unit_system.clone());
        let manager = Arc::new(manager);
        unit_store.bind(&manager);

        Harness {
            repo,
            backups,
            scheduler,
            triggers,
            unit_system,
            manager,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryRepository::default())
    }

    #[tokio::test]
    async fn first_run_persists_defaults() {
        let h = harness();
        let settings = h.manager.get_user_settings().await.unwrap();

        assert_eq!(settings.user_id, "u1");
        assert_eq!(settings.version, 1);
        assert_eq!(settings.sync_status, SyncStatus::Pending);
        assert_eq!(h.repo.row("u1").unwrap(), settings);

        // 두 번째 조회는 캐시
        h.manager.get_user_settings().await.unwrap();
        assert_eq!(h.repo.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_first_access_loads_once() {
        let h = harness();
        let (a, b) = tokio::join!(h.manager.get_user_settings(), h.manager.get_user_settings());
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(h.repo.loads.load(Ordering::SeqCst), 1);
        assert_eq!(h.repo.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stored_owner_mismatch_is_corrected() {
        let h = harness_with(MemoryRepository::default());
        let mut foreign = UserSettings::defaults("someone-else");
        foreign.version = 3;
        h.repo
            .rows
            .lock()
            .unwrap()
            .insert("u1".to_string(), foreign);

        assert_eq!(h.manager.get_user_settings().await.unwrap().user_id, "u1");
    }

    #[tokio::test]
    async fn each_group_round_trips() {
        let h = harness();

        let units = UnitPreferences::for_system(UnitSystem::Imperial, true);
        h.manager.update_unit_preferences(units).await.unwrap();
        assert_eq!(h.manager.unit_preferences().await.unwrap(), units);

        let mut notifications = NotificationPreferences::default();
        notifications.ovulation_alert = NotificationSetting::new(true, 7, 15, 3);
        h.manager
            .update_notification_preferences(notifications)
            .await
            .unwrap();
        assert_eq!(
            h.manager.notification_preferences().await.unwrap(),
            notifications
        );

        let cycle = CyclePreferences {
            average_cycle_length: 30,
            average_luteal_phase_length: 12,
            period_duration: 6,
            is_customized: true,
        };
        h.manager.update_cycle_preferences(cycle).await.unwrap();
        assert_eq!(h.manager.cycle_preferences().await.unwrap(), cycle);

        let privacy = PrivacyPreferences {
            data_sharing_enabled: true,
            ..PrivacyPreferences::default()
        };
        h.manager.update_privacy_preferences(privacy).await.unwrap();
        assert_eq!(h.manager.privacy_preferences().await.unwrap(), privacy);

        let display = DisplayPreferences {
            text_size_scale: 1.5,
            high_contrast_mode: true,
            haptic_feedback_enabled: false,
            haptic_intensity: HapticIntensity::Disabled,
        };
        h.manager.update_display_preferences(display).await.unwrap();
        assert_eq!(h.manager.display_preferences().await.unwrap(), display);

        let sync = SyncPreferences {
            wifi_only_sync: true,
            ..SyncPreferences::default()
        };
        h.manager.update_sync_preferences(sync).await.unwrap();
        assert_eq!(h.manager.sync_preferences().await.unwrap(), sync);

        let stored = h.repo.row("u1").unwrap();
        assert_eq!(stored.version, 7);
        assert_eq!(stored.sync_status, SyncStatus::Pending);
    }

    #[tokio::test]
    async fn invalid_cycle_length_changes_nothing() {
        let h = harness();
        let before = h.manager.get_user_settings().await.unwrap();
        let saves = h.repo.saves.load(Ordering::SeqCst);

        let err = h
            .manager
            .update_cycle_preferences(CyclePreferences {
                average_cycle_length: 50,
                ..CyclePreferences::default()
            })
            .await
            .unwrap_err();

        assert_eq!(err.violations()[0].field, "cyclePreferences.averageCycleLength");
        assert_eq!(h.manager.get_user_settings().await.unwrap(), before);
        assert_eq!(h.repo.saves.load(Ordering::SeqCst), saves);
        assert!(h.triggers.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_save_keeps_previous_state() {
        let h = harness();
        let before = h.manager.get_user_settings().await.unwrap();
        let mut observed = Box::pin(h.manager.observe_settings_changes().await.unwrap());
        assert_eq!(observed.next().await.unwrap(), before);

        h.repo.fail_saves.store(true, Ordering::SeqCst);
        let err = h
            .manager
            .update_settings(|s| {
                s.cycle_preferences.average_cycle_length = 30;
                s.display_preferences.high_contrast_mode = true;
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Persistence(_)));
        assert_eq!(h.manager.get_user_settings().await.unwrap(), before);
        assert!(h.triggers.calls().is_empty());
        // 실패한 변경은 발행되지 않는다
        let pending = tokio::time::timeout(Duration::from_millis(20), observed.next()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn notification_failure_is_a_warning() {
        let h = harness();
        h.scheduler.fail.store(true, Ordering::SeqCst);

        let mut prefs = NotificationPreferences::default();
        prefs.global_notifications_enabled = false;
        let outcome = h
            .manager
            .update_notification_preferences(prefs)
            .await
            .unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].group, PreferenceGroup::Notification);
        assert!(!h
            .repo
            .row("u1")
            .unwrap()
            .notification_preferences
            .global_notifications_enabled);
    }

    #[tokio::test]
    async fn cycle_change_recalculates_then_predicts() {
        let h = harness();
        let outcome = h
            .manager
            .update_cycle_preferences(CyclePreferences {
                average_cycle_length: 32,
                is_customized: true,
                ..CyclePreferences::default()
            })
            .await
            .unwrap();

        assert!(outcome.is_clean());
        assert_eq!(h.triggers.calls(), vec!["recalc:u1", "predict:u1"]);
        assert_eq!(h.scheduler.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_recalculation_skips_prediction() {
        let h = harness();
        h.triggers.fail_recalc.store(true, Ordering::SeqCst);

        let outcome = h
            .manager
            .update_cycle_preferences(CyclePreferences {
                period_duration: 7,
                ..CyclePreferences::default()
            })
            .await
            .unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(h.triggers.calls(), vec!["recalc:u1"]);
        assert_eq!(h.repo.row("u1").unwrap().cycle_preferences.period_duration, 7);
    }

    #[tokio::test]
    async fn multi_group_update_triggers_each_changed_group() {
        let h = harness();
        let outcome = h
            .manager
            .update_settings(|s| {
                s.cycle_preferences.average_cycle_length = 29;
                s.notification_preferences.daily_logging_reminder.enabled = true;
                s.unit_preferences = UnitPreferences::for_system(UnitSystem::Imperial, true);
            })
            .await
            .unwrap();

        assert_eq!(outcome.settings.version, 2);
        assert_eq!(h.scheduler.call_count(), 1);
        assert_eq!(h.triggers.calls().len(), 2);
        assert_eq!(
            h.unit_system.get_current_unit_system().await,
            UnitSystem::Imperial
        );
    }

    #[tokio::test]
    async fn unchanged_update_is_not_persisted() {
        let h = harness();
        let before = h.manager.get_user_settings().await.unwrap();
        let outcome = h
            .manager
            .update_privacy_preferences(before.privacy_preferences)
            .await
            .unwrap();
        assert_eq!(outcome.settings.version, before.version);
        assert_eq!(h.repo.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transform_cannot_change_owner() {
        let h = harness();
        let outcome = h
            .manager
            .update_settings(|s| {
                s.user_id = "intruder".to_string();
                s.privacy_preferences.research_participation_enabled = true;
            })
            .await
            .unwrap();
        assert_eq!(outcome.settings.user_id, "u1");
        assert!(h.repo.row("intruder").is_none());
    }

    #[tokio::test]
    async fn concurrent_updates_to_different_groups_both_survive() {
        let h = harness();
        h.manager.get_user_settings().await.unwrap();

        let m1 = h.manager.clone();
        let m2 = h.manager.clone();
        let (a, b) = tokio::join!(
            tokio::spawn(async move {
                m1.update_display_preferences(DisplayPreferences {
                    text_size_scale: 1.2,
                    ..DisplayPreferences::default()
                })
                .await
            }),
            tokio::spawn(async move {
                m2.update_privacy_preferences(PrivacyPreferences {
                    anonymous_analytics_enabled: true,
                    ..PrivacyPreferences::default()
                })
                .await
            })
        );
        a.unwrap().unwrap();
        b.unwrap().unwrap();

        let stored = h.repo.row("u1").unwrap();
        assert_eq!(stored.display_preferences.text_size_scale, 1.2);
        assert!(stored.privacy_preferences.anonymous_analytics_enabled);
        assert_eq!(stored.version, 3);
    }

    #[tokio::test]
    async fn reset_preserves_units_and_is_idempotent() {
        let h = harness();
        h.manager
            .update_settings(|s| {
                s.unit_preferences = UnitPreferences::for_system(UnitSystem::Imperial, true);
                s.cycle_preferences.average_cycle_length = 35;
                s.display_preferences.high_contrast_mode = true;
            })
            .await
            .unwrap();

        let first = h.manager.reset_to_defaults(true).await.unwrap();
        let second = h.manager.reset_to_defaults(true).await.unwrap();

        assert!(first.settings.same_preferences(&second.settings));
        assert_eq!(
            second.settings.unit_preferences.temperature_unit,
            TemperatureUnit::Fahrenheit
        );
        assert_eq!(second.settings.cycle_preferences.average_cycle_length, 28);
        // 값이 그대로여도 알림은 매번 다시 예약한다
        assert_eq!(h.scheduler.call_count(), 2);
        assert_eq!(second.settings.version, first.settings.version);
    }

    #[tokio::test]
    async fn reset_without_preserving_units_restores_metric() {
        let h = harness();
        h.manager
            .set_unit_system(UnitSystem::Imperial)
            .await
            .unwrap();
        let outcome = h.manager.reset_to_defaults(false).await.unwrap();
        assert_eq!(
            outcome.settings.unit_preferences,
            UnitPreferences::default()
        );
        assert_eq!(
            h.unit_system.get_current_unit_system().await,
            UnitSystem::Metric
        );
    }

    #[tokio::test]
    async fn import_takes_ownership_and_retriggers_everything() {
        let h = harness();
        h.manager.get_user_settings().await.unwrap();

        let mut foreign = UserSettings::defaults("other-user");
        foreign.cycle_preferences.average_cycle_length = 26;
        let data = foreign.to_transport().unwrap();

        let outcome = h.manager.import_settings(&data).await.unwrap();
        assert_eq!(outcome.settings.user_id, "u1");
        assert_eq!(outcome.settings.cycle_preferences.average_cycle_length, 26);
        assert_eq!(h.repo.row("u1").unwrap().user_id, "u1");
        assert!(h.repo.row("other-user").is_none());
        assert_eq!(h.scheduler.call_count(), 1);
        assert_eq!(h.triggers.calls(), vec!["recalc:u1", "predict:u1"]);
        assert_eq!(h.manager.list_backups().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_import_leaves_state_untouched() {
        let h = harness();
        let before = h.manager.get_user_settings().await.unwrap();
        let err = h.manager.import_settings("not json").await.unwrap_err();
        assert!(matches!(err, CoreError::Export(_)));
        assert_eq!(h.manager.get_user_settings().await.unwrap(), before);
    }

    #[tokio::test]
    async fn export_round_trips_through_import() {
        let h = harness();
        h.manager
            .update_display_preferences(DisplayPreferences {
                text_size_scale: 0.8,
                ..DisplayPreferences::default()
            })
            .await
            .unwrap();
        let exported = h.manager.export_settings().await.unwrap();

        h.manager.reset_to_defaults(false).await.unwrap();
        let outcome = h.manager.import_settings(&exported).await.unwrap();
        assert_eq!(outcome.settings.display_preferences.text_size_scale, 0.8);
    }

    #[tokio::test]
    async fn restore_refuses_foreign_backup() {
        let h = harness();
        let foreign = eunio_core::models::backup::SettingsBackup::snapshot(
            &UserSettings::defaults("u2"),
        )
        .unwrap();
        h.backups.backups.lock().unwrap().push(foreign.clone());

        let err = h.manager.restore_backup(&foreign.backup_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn restore_own_backup_recommits() {
        let h = harness();
        h.manager
            .update_cycle_preferences(CyclePreferences {
                average_cycle_length: 40,
                ..CyclePreferences::default()
            })
            .await
            .unwrap();
        let exported = UserSettings::defaults("u1").to_transport().unwrap();
        h.manager.import_settings(&exported).await.unwrap();

        let backups = h.manager.list_backups().await.unwrap();
        let outcome = h.manager.restore_backup(&backups[0].backup_id).await.unwrap();
        assert_eq!(outcome.settings.cycle_preferences.average_cycle_length, 40);
        assert_eq!(
            h.manager
                .get_user_settings()
                .await
                .unwrap()
                .cycle_preferences
                .average_cycle_length,
            40
        );
    }

    #[tokio::test]
    async fn observers_replay_latest_then_follow() {
        let h = harness();
        h.manager
            .update_privacy_preferences(PrivacyPreferences {
                data_sharing_enabled: true,
                ..PrivacyPreferences::default()
            })
            .await
            .unwrap();

        let mut first = Box::pin(h.manager.observe_settings_changes().await.unwrap());
        let mut second = Box::pin(h.manager.observe_settings_changes().await.unwrap());
        assert!(first.next().await.unwrap().privacy_preferences.data_sharing_enabled);
        assert_eq!(second.next().await.unwrap().version, 2);

        h.manager
            .update_display_preferences(DisplayPreferences {
                high_contrast_mode: true,
                ..DisplayPreferences::default()
            })
            .await
            .unwrap();
        assert_eq!(first.next().await.unwrap().version, 3);
        assert_eq!(second.next().await.unwrap().version, 3);
    }

    #[tokio::test]
    async fn sync_updates_status_stream() {
        let h = harness();
        let mut status = Box::pin(h.manager.observe_sync_status().await.unwrap());
        assert_eq!(status.next().await, Some(false));

        let synced = h.manager.sync_settings().await.unwrap();
        assert_eq!(synced.settings.sync_status, SyncStatus::Synced);
        assert!(synced.is_clean());
        assert!(h.manager.is_synced().await);
        assert_eq!(status.next().await, Some(true));

        h.manager
            .update_display_preferences(DisplayPreferences {
                high_contrast_mode: true,
                ..DisplayPreferences::default()
            })
            .await
            .unwrap();
        assert!(!h.manager.is_synced().await);
        assert_eq!(status.next().await, Some(false));
    }

    #[tokio::test]
    async fn sync_failure_is_reported_as_status() {
        let h = harness();
        h.repo.fail_sync.store(true, Ordering::SeqCst);
        let result = h.manager.sync_settings().await.unwrap();
        assert_eq!(result.settings.sync_status, SyncStatus::Error);
        assert!(!h.manager.is_synced().await);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_sync_records_error_and_recovers() {
        let h = harness();
        h.manager.get_user_settings().await.unwrap();
        h.repo.stall_sync.store(true, Ordering::SeqCst);

        let err = h.manager.sync_settings().await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout { .. }));
        assert_eq!(
            h.manager.get_user_settings().await.unwrap().sync_status,
            SyncStatus::Error
        );
        assert_eq!(h.repo.row("u1").unwrap().sync_status, SyncStatus::Error);

        h.repo.stall_sync.store(false, Ordering::SeqCst);
        let synced = h.manager.on_connectivity_changed(true).await.unwrap();
        assert_eq!(synced.sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn cancelled_sync_restores_previous_state() {
        let h = harness();
        let before = h.manager.get_user_settings().await.unwrap();
        h.repo.stall_sync.store(true, Ordering::SeqCst);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(20), h.manager.sync_settings()).await;
        assert!(cancelled.is_err());
        assert_eq!(h.manager.get_user_settings().await.unwrap(), before);
        assert_eq!(h.repo.row("u1").unwrap().sync_status, SyncStatus::Pending);
    }

    #[tokio::test]
    async fn remote_adoption_reports_side_effect_warnings() {
        let h = harness();
        h.manager.get_user_settings().await.unwrap();
        h.scheduler.fail.store(true, Ordering::SeqCst);
        h.repo.remote_notifications_off.store(true, Ordering::SeqCst);

        let outcome = h.manager.sync_settings().await.unwrap();
        assert!(!outcome.settings.notification_preferences.global_notifications_enabled);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].group, PreferenceGroup::Notification);
    }

    #[tokio::test]
    async fn unit_manager_writes_go_through_manager() {
        let h = harness();
        let first = h.manager.get_user_settings().await.unwrap();

        h.unit_system
            .set_unit_system(UnitSystem::Imperial, true)
            .await
            .unwrap();
        assert_eq!(
            h.manager.unit_preferences().await.unwrap().temperature_unit,
            TemperatureUnit::Fahrenheit
        );

        let outcome = h
            .manager
            .update_privacy_preferences(PrivacyPreferences {
                data_sharing_enabled: true,
                ..PrivacyPreferences::default()
            })
            .await
            .unwrap();

        let stored = h.repo.row("u1").unwrap();
        assert_eq!(stored, outcome.settings);
        assert_eq!(stored.version, first.version + 2);
        assert_eq!(stored.unit_preferences.temperature_unit, TemperatureUnit::Fahrenheit);
        assert!(stored.unit_preferences.is_manually_set);
        assert_eq!(
            h.unit_system.get_current_unit_system().await,
            UnitSystem::Imperial
        );
    }

    #[tokio::test]
    async fn unit_locale_default_goes_through_manager() {
        let h = harness();
        assert_eq!(
            h.unit_system.initialize_from_locale("US").await,
            UnitSystem::Imperial
        );
        let settings = h.manager.get_user_settings().await.unwrap();
        assert_eq!(settings.unit_preferences.system(), UnitSystem::Imperial);
        assert!(!settings.unit_preferences.is_manually_set);
        assert_eq!(settings.version, 2);
        assert_eq!(h.repo.row("u1").unwrap(), settings);
    }

    #[tokio::test]
    async fn managed_unit_store_rejects_other_user() {
        let h = harness();
        let store = ManagedUnitPreferences::new();
        store.bind(&h.manager);

        let err = store
            .save_unit_preferences("u2", UnitPreferences::default())
            .await
            .unwrap_err();
        assert_eq!(err.violations()[0].field, "userId");
        assert!(h.repo.row("u2").is_none());
    }

    #[tokio::test]
    async fn unbound_unit_store_fails_without_writing() {
        let store = ManagedUnitPreferences::new();
        assert!(matches!(
            store.load_unit_preferences("u1").await,
            Err(CoreError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn connectivity_restore_syncs_pending_changes() {
        let h = harness();
        assert!(h.manager.on_connectivity_changed(false).await.is_none());

        let synced = h.manager.on_connectivity_changed(true).await.unwrap();
        assert_eq!(synced.sync_status, SyncStatus::Synced);

        // 이미 동기화됨
        assert!(h.manager.on_connectivity_changed(true).await.is_none());
    }

    #[tokio::test]
    async fn connectivity_restore_respects_auto_sync_switch() {
        let h = harness();
        h.manager
            .update_sync_preferences(SyncPreferences {
                auto_sync_enabled: false,
                ..SyncPreferences::default()
            })
            .await
            .unwrap();
        assert!(h.manager.on_connectivity_changed(true).await.is_none());
        assert!(!h.manager.is_synced().await);
    }

    #[tokio::test]
    async fn connectivity_listener_syncs_on_reconnect() {
        let h = harness();
        h.manager.get_user_settings().await.unwrap();
        let (tx, rx) = watch::channel(false);
        let mut status = Box::pin(h.manager.observe_sync_status().await.unwrap());
        assert_eq!(status.next().await, Some(false));

        let handle = h.manager.clone().spawn_connectivity_listener(rx);
        tx.send(true).unwrap();

        let synced = tokio::time::timeout(Duration::from_secs(1), status.next())
            .await
            .unwrap();
        assert_eq!(synced, Some(true));

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn locale_respects_manual_choice() {
        let h = harness();
        h.manager
            .update_unit_preferences(UnitPreferences {
                temperature_unit: TemperatureUnit::Fahrenheit,
                weight_unit: eunio_core::models::units::WeightUnit::Pounds,
                is_manually_set: true,
            })
            .await
            .unwrap();

        assert_eq!(
            h.manager.initialize_units_from_locale("GB").await,
            UnitSystem::Imperial
        );
        assert_eq!(
            h.manager.unit_preferences().await.unwrap().temperature_unit,
            TemperatureUnit::Fahrenheit
        );
    }

    #[tokio::test]
    async fn locale_default_applies_when_not_manual() {
        let h = harness();
        assert_eq!(
            h.manager.initialize_units_from_locale("us").await,
            UnitSystem::Imperial
        );
        let prefs = h.manager.unit_preferences().await.unwrap();
        assert!(!prefs.is_manually_set);
        assert_eq!(
            h.unit_system.get_current_unit_system().await,
            UnitSystem::Imperial
        );
    }

    #[tokio::test]
    async fn locale_failure_falls_back_to_metric() {
        let h = harness();
        h.repo.fail_saves.store(true, Ordering::SeqCst);
        assert_eq!(
            h.manager.initialize_units_from_locale("US").await,
            UnitSystem::Metric
        );
    }

    #[tokio::test]
    async fn validate_reports_all_violations() {
        let h = harness();
        let mut settings = UserSettings::defaults("u2");
        settings.cycle_preferences.average_cycle_length = 10;
        settings.display_preferences.text_size_scale = 3.0;

        let fields: Vec<String> = h
            .manager
            .validate_settings(&settings)
            .into_iter()
            .map(|v| v.field)
            .collect();
        assert_eq!(fields.len(), 3);
        assert!(fields.contains(&"userId".to_string()));
    }

    /// 응답하지 않는 저장소
    struct StalledRepository;

    #[async_trait]
    impl SettingsRepository for StalledRepository {
        async fn get_user_settings(
            &self,
            _user_id: &str,
        ) -> Result<Option<UserSettings>, CoreError> {
            std::future::pending().await
        }

        async fn save_user_settings(&self, _settings: &UserSettings) -> Result<(), CoreError> {
            std::future::pending().await
        }

        async fn sync_settings(&self, _user_id: &str) -> Result<UserSettings, CoreError> {
            std::future::pending().await
        }

        async fn clear_settings(&self, _user_id: &str) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_persistence_times_out() {
        let repo: Arc<dyn SettingsRepository> = Arc::new(StalledRepository);
        let triggers = Arc::new(RecordingTriggers::default());
        let manager = SettingsManager::new(
            "u1",
            repo.clone(),
            Arc::new(BackupManager::new(
                repo,
                Arc::new(MemoryBackupStore::default()),
                5,
            )),
            Arc::new(RecordingScheduler::default()),
            triggers.clone(),
            triggers,
            PersistenceConfig::default(),
        );

        let err = manager.get_user_settings().await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout { timeout_ms: 5000, .. }));
    }
}
