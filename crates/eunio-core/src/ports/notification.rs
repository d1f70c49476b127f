//! 알림 포트.
//!
//! - `NotificationScheduler`: 설정 관리자가 소비하는 알림 브리지 계약
//!   (구현: `eunio-settings::notification_bridge`)
//! - `PlatformNotifier`: 플랫폼 알림 전달 메커니즘 (구현: 호스트 앱)

use async_trait::async_trait;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::notification::{NotificationPreferences, NotificationType};

/// 플랫폼 알림 권한 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
    NotDetermined,
}

/// 반복 주기
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatInterval {
    Daily,
    Weekly,
    Monthly,
}

/// 플랫폼에 전달하는 예약 요청
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotification {
    /// 예약 식별자 (유형별 고정)
    pub id: String,
    pub kind: NotificationType,
    pub title: String,
    pub body: String,
    pub time: NaiveTime,
    pub repeat: RepeatInterval,
    pub days_in_advance: i32,
}

/// 알림 브리지 계약: 선호 변경을 예약/취소 명령으로 번역한다
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    /// 선호에 맞춰 전체 예약을 다시 구성
    ///
    /// 권한 거부 시 전체 실패, 개별 유형 실패는 `CoreError::PartialSchedule`.
    async fn update_notification_schedule(
        &self,
        preferences: &NotificationPreferences,
    ) -> Result<(), CoreError>;

    async fn permission_status(&self) -> Result<PermissionStatus, CoreError>;

    async fn request_permission(&self) -> Result<PermissionStatus, CoreError>;

    async fn cancel_all_notifications(&self) -> Result<(), CoreError>;

    async fn open_platform_settings(&self) -> Result<(), CoreError>;
}

/// 플랫폼 알림 전달 인터페이스
#[async_trait]
pub trait PlatformNotifier: Send + Sync {
    async fn permission_status(&self) -> Result<PermissionStatus, CoreError>;

    async fn request_permission(&self) -> Result<PermissionStatus, CoreError>;

    async fn schedule(&self, request: &ScheduledNotification) -> Result<(), CoreError>;

    async fn cancel_all(&self) -> Result<(), CoreError>;

    async fn open_settings(&self) -> Result<(), CoreError>;
}
