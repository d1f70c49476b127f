//! DI 와이어링.
//!
//! `AppConfig`로부터 저장소, 원격 클라이언트, 브리지, 관리자를 생성해 연결한다.

use std::path::Path;
use std::sync::Arc;

use eunio_core::config::AppConfig;
use eunio_core::error::CoreError;
use eunio_core::ports::notification::NotificationScheduler;
use eunio_core::ports::repository::{SettingsRepository, SettingsStore};
use eunio_core::ports::session::StaticSession;
use eunio_network::{ConnectivityManager, HttpRemoteStore};
use eunio_settings::{
    BackupManager, ManagedUnitPreferences, NotificationBridge, SettingsManager, UnitSystemManager,
};
use eunio_storage::{RetryPolicy, SqliteStorage, SyncedSettingsRepository};
use tracing::info;

use crate::platform::{LocalProfileStore, LoggingCycleTriggers, LoggingNotifier};

/// 와이어링된 앱 구성 요소
pub struct AppContext {
    pub manager: Arc<SettingsManager>,
    /// 저장은 `manager`의 쓰기 경로를 거친다
    pub unit_system: Arc<UnitSystemManager>,
    /// 원격 서버가 설정된 경우에만 존재
    pub connectivity: Option<Arc<ConnectivityManager>>,
    pub notifier: Arc<LoggingNotifier>,
    pub triggers: Arc<LoggingCycleTriggers>,
    pub profile: Arc<LocalProfileStore>,
}

/// 파일 기반 SQLite로 앱 구성
pub fn build(config: &AppConfig, user_id: &str, db_path: &Path) -> Result<AppContext, CoreError> {
    let storage = Arc::new(SqliteStorage::open(db_path)?);
    info!("SQLite 저장소: {}", db_path.display());
    build_with_storage(config, user_id, storage)
}

/// 주어진 저장소로 앱 구성
pub fn build_with_storage(
    config: &AppConfig,
    user_id: &str,
    storage: Arc<SqliteStorage>,
) -> Result<AppContext, CoreError> {
    let local: Arc<dyn SettingsStore> = storage.clone();

    // 1. 설정 Repository (원격 설정 여부에 따라 동기화/로컬 전용)
    let (repository, connectivity) = match HttpRemoteStore::from_config(&config.sync)? {
        Some(remote) => {
            let connectivity = Arc::new(ConnectivityManager::default());
            let remote: Arc<dyn SettingsStore> =
                Arc::new(remote.with_connectivity(connectivity.clone()));
            info!(
                "원격 동기화 활성화: {}",
                config.sync.server_url.as_deref().unwrap_or_default()
            );
            let retry = RetryPolicy::from_config(&config.sync);
            (
                SyncedSettingsRepository::new(local, remote, retry),
                Some(connectivity),
            )
        }
        None => {
            info!("원격 서버 미설정, 로컬 전용 모드");
            (SyncedSettingsRepository::local_only(local), None)
        }
    };
    let repository: Arc<dyn SettingsRepository> = Arc::new(repository);

    // 2. 백업
    let backups = Arc::new(BackupManager::new(
        repository.clone(),
        storage,
        config.backup.retention_count,
    ));

    // 3. 알림 브리지 + 주기 트리거
    let notifier = Arc::new(LoggingNotifier::new());
    let scheduler: Arc<dyn NotificationScheduler> =
        Arc::new(NotificationBridge::new(notifier.clone()));
    let triggers = Arc::new(LoggingCycleTriggers::default());

    // 4. 단위 체계 관리자 (저장 포트는 5에서 설정 관리자에 연결)
    let unit_store = Arc::new(ManagedUnitPreferences::new());
    let profile = Arc::new(LocalProfileStore::default());
    let unit_system = Arc::new(
        UnitSystemManager::new(Arc::new(StaticSession::new(user_id)), unit_store.clone())
            .with_profile_store(profile.clone()),
    );

    // 5. 설정 관리자
    let manager = Arc::new(
        SettingsManager::new(
            user_id,
            repository,
            backups,
            scheduler,
            triggers.clone(),
            triggers.clone(),
            config.persistence.clone(),
        )
        .with_unit_system(unit_system.clone()),
    );
    unit_store.bind(&manager);

    Ok(AppContext {
        manager,
        unit_system,
        connectivity,
        notifier,
        triggers,
        profile,
    })
}
