//! 설정 백업 스냅샷.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::settings::UserSettings;

/// 가져오기 병합 전략
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeStrategy {
    /// 가져온 설정으로 전부 교체
    #[default]
    Replace,
    /// 로컬 수정 시각이 더 최근이면 로컬 유지
    PreferNewer,
    /// 가져온 설정을 쓰되, 로컬에서 직접 고른 단위는 유지
    KeepManualUnits,
}

/// 버전/시각이 붙은 `UserSettings` 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsBackup {
    pub backup_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    /// 스냅샷 시점의 설정 버전
    pub settings_version: u64,
    /// 직렬화된 스냅샷 크기 (바이트)
    pub size_bytes: u64,
    pub settings: UserSettings,
}

impl SettingsBackup {
    /// 설정 스냅샷 생성 (크기는 전송 형식 기준)
    pub fn snapshot(settings: &UserSettings) -> Result<Self, CoreError> {
        let payload = settings.to_transport()?;
        Ok(Self {
            backup_id: Uuid::new_v4().to_string(),
            user_id: settings.user_id.clone(),
            created_at: Utc::now(),
            settings_version: settings.version,
            size_bytes: payload.len() as u64,
            settings: settings.clone(),
        })
    }
}
