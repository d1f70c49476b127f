//! 사용자 설정 집계 루트.
//!
//! `UserSettings`는 6개 선호 그룹과 메타데이터(수정 시각, 동기화 상태, 버전)를 묶는다.
//! 직렬화 형식이 곧 내보내기/가져오기 전송 형식이다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, FieldViolation};
use crate::models::notification::NotificationPreferences;
use crate::models::preferences::{
    CyclePreferences, DisplayPreferences, PrivacyPreferences, SyncPreferences,
};
use crate::models::units::UnitPreferences;

/// 원격 동기화 상태
///
/// PENDING → SYNCING → {SYNCED | CONFLICT | ERROR}. 로컬 변경은 항상 PENDING으로 되돌린다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    #[default]
    Pending,
    Syncing,
    Synced,
    Conflict,
    Error,
}

impl SyncStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Pending => "PENDING",
            SyncStatus::Syncing => "SYNCING",
            SyncStatus::Synced => "SYNCED",
            SyncStatus::Conflict => "CONFLICT",
            SyncStatus::Error => "ERROR",
        }
    }

    /// 저장소 문자열에서 복원 (알 수 없는 값은 PENDING)
    pub fn parse(value: &str) -> Self {
        match value {
            "SYNCING" => SyncStatus::Syncing,
            "SYNCED" => SyncStatus::Synced,
            "CONFLICT" => SyncStatus::Conflict,
            "ERROR" => SyncStatus::Error,
            _ => SyncStatus::Pending,
        }
    }
}

/// 선호 그룹 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceGroup {
    Unit,
    Notification,
    Cycle,
    Privacy,
    Display,
    Sync,
}

impl PreferenceGroup {
    pub const ALL: [PreferenceGroup; 6] = [
        PreferenceGroup::Unit,
        PreferenceGroup::Notification,
        PreferenceGroup::Cycle,
        PreferenceGroup::Privacy,
        PreferenceGroup::Display,
        PreferenceGroup::Sync,
    ];
}

impl std::fmt::Display for PreferenceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PreferenceGroup::Unit => "unit",
            PreferenceGroup::Notification => "notification",
            PreferenceGroup::Cycle => "cycle",
            PreferenceGroup::Privacy => "privacy",
            PreferenceGroup::Display => "display",
            PreferenceGroup::Sync => "sync",
        };
        f.write_str(name)
    }
}

/// 사용자 설정 집계
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_id: String,
    pub unit_preferences: UnitPreferences,
    pub notification_preferences: NotificationPreferences,
    pub cycle_preferences: CyclePreferences,
    pub privacy_preferences: PrivacyPreferences,
    pub display_preferences: DisplayPreferences,
    pub sync_preferences: SyncPreferences,
    pub last_modified: DateTime<Utc>,
    pub sync_status: SyncStatus,
    pub version: u64,
}

impl UserSettings {
    /// 모든 그룹이 기본값인 새 설정 (version 1, PENDING)
    pub fn defaults(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            unit_preferences: UnitPreferences::default(),
            notification_preferences: NotificationPreferences::default(),
            cycle_preferences: CyclePreferences::default(),
            privacy_preferences: PrivacyPreferences::default(),
            display_preferences: DisplayPreferences::default(),
            sync_preferences: SyncPreferences::default(),
            last_modified: Utc::now(),
            sync_status: SyncStatus::Pending,
            version: 1,
        }
    }

    /// 그룹별 검증 + 집계 수준 검증. 발견된 위반을 모두 반환한다.
    pub fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if self.user_id.trim().is_empty() {
            violations.push(FieldViolation::new("userId", "비어 있을 수 없습니다"));
        }
        violations.extend(self.unit_preferences.validate());
        violations.extend(self.notification_preferences.validate());
        violations.extend(self.cycle_preferences.validate());
        violations.extend(self.privacy_preferences.validate());
        violations.extend(self.display_preferences.validate());
        violations.extend(self.sync_preferences.validate());
        violations
    }

    /// 검증 실패 시 `CoreError::Validation`
    pub fn ensure_valid(&self) -> Result<(), CoreError> {
        let violations = self.validate();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(violations))
        }
    }

    /// 두 설정 사이에서 값이 달라진 그룹
    pub fn changed_groups(&self, other: &UserSettings) -> Vec<PreferenceGroup> {
        PreferenceGroup::ALL
            .into_iter()
            .filter(|group| match group {
                PreferenceGroup::Unit => self.unit_preferences != other.unit_preferences,
                PreferenceGroup::Notification => {
                    self.notification_preferences != other.notification_preferences
                }
                PreferenceGroup::Cycle => self.cycle_preferences != other.cycle_preferences,
                PreferenceGroup::Privacy => self.privacy_preferences != other.privacy_preferences,
                PreferenceGroup::Display => self.display_preferences != other.display_preferences,
                PreferenceGroup::Sync => self.sync_preferences != other.sync_preferences,
            })
            .collect()
    }

    /// 선호 그룹 내용이 같은지 (메타데이터 제외)
    pub fn same_preferences(&self, other: &UserSettings) -> bool {
        self.changed_groups(other).is_empty()
    }

    /// 로컬 변경 확정: 버전 증가, 수정 시각 갱신, PENDING 전환
    ///
    /// `previous`는 같은 사용자의 직전 저장본이다.
    pub fn stamp_mutation(&mut self, previous: &UserSettings) {
        self.user_id.clone_from(&previous.user_id);
        self.version = previous.version.max(self.version) + 1;
        self.last_modified = Utc::now().max(previous.last_modified);
        self.sync_status = SyncStatus::Pending;
    }

    /// 전송 형식(JSON)으로 직렬화
    pub fn to_transport(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Export(format!("설정 직렬화 실패: {e}")))
    }

    /// 전송 형식(JSON) 파싱. 형식 오류는 `CoreError::Export`.
    pub fn from_transport(data: &str) -> Result<Self, CoreError> {
        serde_json::from_str(data).map_err(|e| CoreError::Export(format!("설정 파싱 실패: {e}")))
    }
}
