//! 알림 예약 브리지.
//!
//! 알림 선호를 플랫폼 예약/취소 명령으로 번역한다.
//! 예약은 항상 "전체 취소 후 재구성" 방식이라 호출 결과가 이전 상태에 의존하지 않는다.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveTime;
use eunio_core::error::CoreError;
use eunio_core::models::notification::{NotificationPreferences, NotificationType};
use eunio_core::ports::notification::{
    NotificationScheduler, PermissionStatus, PlatformNotifier, RepeatInterval,
    ScheduledNotification,
};
use tracing::{debug, info, warn};

/// 알림 유형별 반복 주기
pub fn cadence(kind: NotificationType) -> RepeatInterval {
    match kind {
        NotificationType::DailyLoggingReminder => RepeatInterval::Daily,
        NotificationType::InsightNotifications => RepeatInterval::Weekly,
        NotificationType::PeriodPredictionAlert | NotificationType::OvulationAlert => {
            RepeatInterval::Monthly
        }
    }
}

fn build_request(
    kind: NotificationType,
    time: NaiveTime,
    days_in_advance: i32,
) -> ScheduledNotification {
    let (title, body) = match kind {
        NotificationType::DailyLoggingReminder => (
            "📝 오늘의 기록".to_string(),
            "오늘 컨디션과 증상을 기록해 주세요.".to_string(),
        ),
        NotificationType::PeriodPredictionAlert => (
            "🩸 생리 예정 알림".to_string(),
            if days_in_advance > 0 {
                format!("{days_in_advance}일 후 생리가 시작될 예정입니다.")
            } else {
                "오늘 생리가 시작될 예정입니다.".to_string()
            },
        ),
        NotificationType::OvulationAlert => (
            "🌱 배란 예정 알림".to_string(),
            if days_in_advance > 0 {
                format!("{days_in_advance}일 후 배란이 예상됩니다.")
            } else {
                "오늘 배란이 예상됩니다.".to_string()
            },
        ),
        NotificationType::InsightNotifications => (
            "📊 새로운 인사이트".to_string(),
            "이번 주 주기 분석 결과를 확인해 보세요.".to_string(),
        ),
    };

    ScheduledNotification {
        id: kind.id().to_string(),
        kind,
        title,
        body,
        time,
        repeat: cadence(kind),
        days_in_advance,
    }
}

/// 알림 브리지: `NotificationScheduler` 포트 구현
pub struct NotificationBridge {
    notifier: Arc<dyn PlatformNotifier>,
}

impl NotificationBridge {
    pub fn new(notifier: Arc<dyn PlatformNotifier>) -> Self {
        Self { notifier }
    }

    /// 권한 확인, 미결정이면 요청까지
    async fn ensure_permission(&self) -> Result<(), CoreError> {
        let mut status = self.notifier.permission_status().await?;
        if status == PermissionStatus::NotDetermined {
            debug!("알림 권한 미결정, 권한 요청");
            status = self.notifier.request_permission().await?;
        }

        match status {
            PermissionStatus::Granted => Ok(()),
            other => Err(CoreError::PermissionDenied(format!(
                "플랫폼 알림 권한 없음 ({other:?})"
            ))),
        }
    }
}

#[async_trait]
impl NotificationScheduler for NotificationBridge {
    async fn update_notification_schedule(
        &self,
        preferences: &NotificationPreferences,
    ) -> Result<(), CoreError> {
        if !preferences.global_notifications_enabled {
            self.notifier.cancel_all().await?;
            info!("전역 알림 비활성화, 모든 예약 취소");
            return Ok(());
        }

        // 권한이 없으면 기존 예약을 건드리지 않고 실패
        self.ensure_permission().await?;
        self.notifier.cancel_all().await?;

        let mut scheduled = 0;
        let mut failed = Vec::new();
        for (kind, time) in preferences.enabled_types() {
            let days = preferences.setting(kind).days_in_advance;
            let request = build_request(kind, time, days);
            match self.notifier.schedule(&request).await {
                Ok(()) => scheduled += 1,
                Err(e) => {
                    warn!("알림 예약 실패: {kind}: {e}");
                    failed.push(kind.id().to_string());
                }
            }
        }

        info!("알림 예약 재구성: {scheduled}건 성공, {}건 실패", failed.len());

        if failed.is_empty() {
            Ok(())
        } else {
            Err(CoreError::PartialSchedule { failed })
        }
    }

    async fn permission_status(&self) -> Result<PermissionStatus, CoreError> {
        self.notifier.permission_status().await
    }

    async fn request_permission(&self) -> Result<PermissionStatus, CoreError> {
        self.notifier.request_permission().await
    }

    async fn cancel_all_notifications(&self) -> Result<(), CoreError> {
        self.notifier.cancel_all().await
    }

    async fn open_platform_settings(&self) -> Result<(), CoreError> {
        self.notifier.open_settings().await
    }
}
