//! 로컬 + 원격 복제본을 묶는 설정 Repository.
//!
//! 저장은 항상 로컬 우선(PENDING)이고, 원격 반영은 `sync_settings`에서만 일어난다.
//! SYNCING은 진행 중 표시일 뿐 로컬에 기록하지 않으므로, 중단된 동기화는 호출 전 행을 남긴다.
//! 충돌 해소는 `last_modified` 기준 last-write-wins이며,
//! 수정 시각이 같은데 내용이 다르면 CONFLICT로 남겨 둔다.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use eunio_core::config::SyncConfig;
use eunio_core::error::CoreError;
use eunio_core::models::settings::{SyncStatus, UserSettings};
use eunio_core::ports::repository::{SettingsRepository, SettingsStore};
use tracing::{debug, info, warn};

/// 원격 호출 재시도 정책 (exponential backoff)
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
        }
    }

    /// 재시도 가능한 에러에 한해 backoff 후 재시도
    pub async fn run<F, Fut, T>(&self, operation: &str, mut call: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut delay = self.initial_backoff;
        let mut attempt = 0;

        loop {
            match call().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_retryable() || attempt >= self.max_retries => return Err(e),
                Err(e) => {
                    // RateLimit의 경우 서버 지정 대기 시간 사용 (max_backoff 상한)
                    if let CoreError::RateLimit { retry_after_secs } = &e {
                        delay = Duration::from_secs(*retry_after_secs).min(self.max_backoff);
                    }

                    warn!(
                        "{operation} 실패 (시도 {}/{}): {e}, {delay:?} 후 재시도",
                        attempt + 1,
                        self.max_retries + 1
                    );

                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.max_backoff);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

/// 원격 문서와 로컬 설정의 조정 결과
#[derive(Debug, PartialEq, Eq)]
enum Resolution {
    PushLocal,
    TakeRemote,
    InSync,
    Conflict,
}

/// 동기화 시각을 제외한 내용 비교
fn content_matches(a: &UserSettings, b: &UserSettings) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.sync_preferences.last_sync_time = None;
    b.sync_preferences.last_sync_time = None;
    a.same_preferences(&b)
}

fn resolve(local: &UserSettings, remote: Option<&UserSettings>) -> Resolution {
    let Some(remote) = remote else {
        return Resolution::PushLocal;
    };

    if remote.last_modified > local.last_modified {
        Resolution::TakeRemote
    } else if remote.last_modified < local.last_modified {
        Resolution::PushLocal
    } else if content_matches(local, remote) {
        Resolution::InSync
    } else {
        Resolution::Conflict
    }
}

/// 로컬/원격 설정 Repository: `SettingsRepository` 포트 구현
pub struct SyncedSettingsRepository {
    local: Arc<dyn SettingsStore>,
    remote: Option<Arc<dyn SettingsStore>>,
    retry: RetryPolicy,
}

impl SyncedSettingsRepository {
    /// 원격 없이 로컬만 사용 (오프라인 모드)
    pub fn local_only(local: Arc<dyn SettingsStore>) -> Self {
        Self {
            local,
            remote: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn new(
        local: Arc<dyn SettingsStore>,
        remote: Arc<dyn SettingsStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            local,
            remote: Some(remote),
            retry,
        }
    }

    /// 원격 실패를 로컬 상태로 기록
    async fn record_status(
        &self,
        mut settings: UserSettings,
        status: SyncStatus,
    ) -> Result<UserSettings, CoreError> {
        settings.sync_status = status;
        self.local.store(&settings).await?;
        Ok(settings)
    }

    async fn sync_with_remote(
        &self,
        remote: &Arc<dyn SettingsStore>,
        user_id: &str,
        local: UserSettings,
    ) -> Result<UserSettings, CoreError> {
        let remote_doc = match self
            .retry
            .run("원격 설정 조회", || remote.load(user_id))
            .await
        {
            Ok(doc) => doc,
            Err(e) => {
                warn!("원격 설정 조회 최종 실패: {e}");
                return self.record_status(local, SyncStatus::Error).await;
            }
        };

        let resolution = resolve(&local, remote_doc.as_ref());
        debug!("동기화 조정: user={user_id} {resolution:?}");

        match resolution {
            Resolution::PushLocal => {
                let mut candidate = local.clone();
                candidate.sync_status = SyncStatus::Synced;
                candidate.sync_preferences.last_sync_time = Some(Utc::now());

                if let Err(e) = self
                    .retry
                    .run("원격 설정 업로드", || remote.store(&candidate))
                    .await
                {
                    warn!("원격 설정 업로드 최종 실패: {e}");
                    return self.record_status(local, SyncStatus::Error).await;
                }

                self.local.store(&candidate).await?;
                info!("로컬 설정을 원격에 반영: user={user_id} v{}", candidate.version);
                Ok(candidate)
            }
            Resolution::TakeRemote => {
                let Some(mut candidate) = remote_doc else {
                    return Err(CoreError::Internal("원격 문서 누락".to_string()));
                };
                // 원격 문서의 소유자 필드는 신뢰하지 않는다
                candidate.user_id = local.user_id.clone();
                candidate.version = candidate.version.max(local.version);
                candidate.sync_status = SyncStatus::Synced;
                candidate.sync_preferences.last_sync_time = Some(Utc::now());

                self.local.store(&candidate).await?;
                info!("원격 설정을 로컬에 반영: user={user_id} v{}", candidate.version);
                Ok(candidate)
            }
            Resolution::InSync => {
                let mut candidate = local;
                if let Some(remote_doc) = &remote_doc {
                    candidate.version = candidate.version.max(remote_doc.version);
                }
                candidate.sync_status = SyncStatus::Synced;
                candidate.sync_preferences.last_sync_time = Some(Utc::now());
                self.local.store(&candidate).await?;
                Ok(candidate)
            }
            Resolution::Conflict => {
                warn!("동기화 충돌: user={user_id}, 수정 시각이 같지만 내용이 다름");
                self.record_status(local, SyncStatus::Conflict).await
            }
        }
    }
}

#[async_trait]
impl SettingsRepository for SyncedSettingsRepository {
    async fn get_user_settings(&self, user_id: &str) -> Result<Option<UserSettings>, CoreError> {
        self.local.load(user_id).await
    }

    async fn save_user_settings(&self, settings: &UserSettings) -> Result<(), CoreError> {
        self.local.store(settings).await
    }

    async fn sync_settings(&self, user_id: &str) -> Result<UserSettings, CoreError> {
        let local = self.local.load(user_id).await?;

        let Some(remote) = &self.remote else {
            info!("원격 저장소 미설정, 로컬 전용 모드, 동기화 생략");
            return local.ok_or_else(|| CoreError::NotFound {
                resource_type: "UserSettings".to_string(),
                id: user_id.to_string(),
            });
        };

        match local {
            Some(local) => self.sync_with_remote(remote, user_id, local).await,
            None => {
                // 로컬이 비어 있으면 원격 문서를 그대로 내려받는다
                let remote_doc = self
                    .retry
                    .run("원격 설정 조회", || remote.load(user_id))
                    .await
                    .map_err(|e| CoreError::Sync(format!("원격 설정 조회 실패: {e}")))?;
                let mut settings = remote_doc.ok_or_else(|| CoreError::NotFound {
                    resource_type: "UserSettings".to_string(),
                    id: user_id.to_string(),
                })?;
                settings.user_id = user_id.to_string();
                settings.sync_status = SyncStatus::Synced;
                settings.sync_preferences.last_sync_time = Some(Utc::now());
                self.local.store(&settings).await?;
                Ok(settings)
            }
        }
    }

    async fn clear_settings(&self, user_id: &str) -> Result<(), CoreError> {
        self.local.remove(user_id).await?;
        if let Some(remote) = &self.remote {
            if let Err(e) = remote.remove(user_id).await {
                warn!("원격 설정 삭제 실패 (로컬은 삭제됨): {e}");
            }
        }
        Ok(())
    }
}
