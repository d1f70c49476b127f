//! 호스트 플랫폼 어댑터.
//!
//! 명령줄 호스트에는 OS 알림 센터가 없으므로 예약 요청을 메모리에 유지하고 로그로 남긴다.
//! 주기 재계산/예측 갱신 요청과 프로필 단위 반영도 같은 방식으로 기록만 한다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use eunio_core::error::CoreError;
use eunio_core::ports::notification::{PermissionStatus, PlatformNotifier, ScheduledNotification};
use eunio_core::models::units::UnitSystem;
use eunio_core::ports::session::UserProfileStore;
use eunio_core::ports::triggers::{CycleMetricsTrigger, PredictionTrigger};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// 로그 기반 플랫폼 알림
pub struct LoggingNotifier {
    permission: Mutex<PermissionStatus>,
    scheduled: Mutex<Vec<ScheduledNotification>>,
}

impl LoggingNotifier {
    /// 권한 미결정 상태로 시작 (첫 예약 시 요청 후 허용)
    pub fn new() -> Self {
        Self {
            permission: Mutex::new(PermissionStatus::NotDetermined),
            scheduled: Mutex::new(Vec::new()),
        }
    }

    /// 현재 예약 목록
    pub async fn scheduled(&self) -> Vec<ScheduledNotification> {
        self.scheduled.lock().await.clone()
    }
}

impl Default for LoggingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformNotifier for LoggingNotifier {
    async fn permission_status(&self) -> Result<PermissionStatus, CoreError> {
        Ok(*self.permission.lock().await)
    }

    async fn request_permission(&self) -> Result<PermissionStatus, CoreError> {
        let mut permission = self.permission.lock().await;
        *permission = PermissionStatus::Granted;
        info!("알림 권한 허용");
        Ok(*permission)
    }

    async fn schedule(&self, request: &ScheduledNotification) -> Result<(), CoreError> {
        let mut scheduled = self.scheduled.lock().await;
        scheduled.retain(|existing| existing.id != request.id);
        info!(
            "알림 예약: {} {} ({:?}), {}",
            request.id, request.time, request.repeat, request.title
        );
        scheduled.push(request.clone());
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), CoreError> {
        let mut scheduled = self.scheduled.lock().await;
        if !scheduled.is_empty() {
            debug!("알림 예약 {}건 취소", scheduled.len());
        }
        scheduled.clear();
        Ok(())
    }

    async fn open_settings(&self) -> Result<(), CoreError> {
        info!("알림 권한은 운영체제 설정에서 변경할 수 있습니다");
        Ok(())
    }
}

/// 주기 재계산/예측 갱신 요청을 기록하는 트리거
#[derive(Default)]
pub struct LoggingCycleTriggers {
    recalculations: AtomicU64,
    predictions: AtomicU64,
}

impl LoggingCycleTriggers {
    /// (재계산 횟수, 예측 갱신 횟수)
    pub fn counts(&self) -> (u64, u64) {
        (
            self.recalculations.load(Ordering::Relaxed),
            self.predictions.load(Ordering::Relaxed),
        )
    }
}

#[async_trait]
impl CycleMetricsTrigger for LoggingCycleTriggers {
    async fn recalculate_cycle_metrics(&self, user_id: &str) -> Result<(), CoreError> {
        self.recalculations.fetch_add(1, Ordering::Relaxed);
        info!("주기 지표 재계산 요청: user={user_id}");
        Ok(())
    }
}

#[async_trait]
impl PredictionTrigger for LoggingCycleTriggers {
    async fn update_prediction_with_current_data(&self, user_id: &str) -> Result<(), CoreError> {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        info!("예측 갱신 요청: user={user_id}");
        Ok(())
    }
}

/// 프로세스 안에서만 유지되는 사용자 프로필 레코드
#[derive(Default)]
pub struct LocalProfileStore {
    unit_systems: Mutex<HashMap<String, UnitSystem>>,
}

impl LocalProfileStore {
    /// 프로필에 반영된 단위 체계
    pub async fn unit_system(&self, user_id: &str) -> Option<UnitSystem> {
        self.unit_systems.lock().await.get(user_id).copied()
    }
}

#[async_trait]
impl UserProfileStore for LocalProfileStore {
    async fn update_unit_system(&self, user_id: &str, system: UnitSystem) -> Result<(), CoreError> {
        self.unit_systems
            .lock()
            .await
            .insert(user_id.to_string(), system);
        debug!("프로필 단위 반영: user={user_id} {system}");
        Ok(())
    }
}
