//! 알림 선호.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::FieldViolation;

/// 알림 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    DailyLoggingReminder,
    PeriodPredictionAlert,
    OvulationAlert,
    InsightNotifications,
}

impl NotificationType {
    /// 전체 알림 유형 (예약 순서)
    pub const ALL: [NotificationType; 4] = [
        NotificationType::DailyLoggingReminder,
        NotificationType::PeriodPredictionAlert,
        NotificationType::OvulationAlert,
        NotificationType::InsightNotifications,
    ];

    /// 플랫폼 예약 식별자
    pub fn id(self) -> &'static str {
        match self {
            NotificationType::DailyLoggingReminder => "daily_logging_reminder",
            NotificationType::PeriodPredictionAlert => "period_prediction_alert",
            NotificationType::OvulationAlert => "ovulation_alert",
            NotificationType::InsightNotifications => "insight_notifications",
        }
    }

    fn field_name(self) -> &'static str {
        match self {
            NotificationType::DailyLoggingReminder => "dailyLoggingReminder",
            NotificationType::PeriodPredictionAlert => "periodPredictionAlert",
            NotificationType::OvulationAlert => "ovulationAlert",
            NotificationType::InsightNotifications => "insightNotifications",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// 알림 유형별 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSetting {
    pub enabled: bool,
    /// 알림 시각 (로컬 시간)
    pub time: Option<NaiveTime>,
    /// 며칠 전에 알릴지
    #[serde(default)]
    pub days_in_advance: i32,
}

impl NotificationSetting {
    pub fn new(enabled: bool, hour: u32, minute: u32, days_in_advance: i32) -> Self {
        Self {
            enabled,
            time: NaiveTime::from_hms_opt(hour, minute, 0),
            days_in_advance,
        }
    }

    /// 비활성, 시각 없음
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            time: None,
            days_in_advance: 0,
        }
    }

    fn validate_into(&self, field: &str, violations: &mut Vec<FieldViolation>) {
        if self.enabled && self.time.is_none() {
            violations.push(FieldViolation::new(
                format!("notificationPreferences.{field}.time"),
                "활성화된 알림에는 시각이 필요합니다",
            ));
        }
        if self.days_in_advance < 0 {
            violations.push(FieldViolation::new(
                format!("notificationPreferences.{field}.daysInAdvance"),
                format!("0 이상이어야 합니다 (입력: {})", self.days_in_advance),
            ));
        }
    }
}

/// 알림 선호 그룹
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub daily_logging_reminder: NotificationSetting,
    pub period_prediction_alert: NotificationSetting,
    pub ovulation_alert: NotificationSetting,
    pub insight_notifications: NotificationSetting,
    pub global_notifications_enabled: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            daily_logging_reminder: NotificationSetting::new(false, 20, 0, 0),
            period_prediction_alert: NotificationSetting::new(true, 9, 0, 2),
            ovulation_alert: NotificationSetting::new(false, 9, 0, 1),
            insight_notifications: NotificationSetting::new(true, 10, 0, 0),
            global_notifications_enabled: true,
        }
    }
}

impl NotificationPreferences {
    /// 유형별 설정 조회
    pub fn setting(&self, kind: NotificationType) -> &NotificationSetting {
        match kind {
            NotificationType::DailyLoggingReminder => &self.daily_logging_reminder,
            NotificationType::PeriodPredictionAlert => &self.period_prediction_alert,
            NotificationType::OvulationAlert => &self.ovulation_alert,
            NotificationType::InsightNotifications => &self.insight_notifications,
        }
    }

    /// 예약 대상 (전역 스위치 + 유형별 활성화 + 시각 존재)
    pub fn enabled_types(&self) -> impl Iterator<Item = (NotificationType, NaiveTime)> + '_ {
        NotificationType::ALL.into_iter().filter_map(move |kind| {
            let setting = self.setting(kind);
            match (self.global_notifications_enabled, setting.enabled, setting.time) {
                (true, true, Some(time)) => Some((kind, time)),
                _ => None,
            }
        })
    }

    pub fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        for kind in NotificationType::ALL {
            self.setting(kind)
                .validate_into(kind.field_name(), &mut violations);
        }
        violations
    }
}
