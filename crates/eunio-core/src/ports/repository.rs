//! 설정 저장소 포트.
//!
//! 구현: `eunio-storage` crate (rusqlite 로컬 저장소 + 동기화 저장소),
//! `eunio-network` crate (원격 문서 저장소)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::backup::SettingsBackup;
use crate::models::settings::UserSettings;

/// 설정 Repository: 설정 관리자가 사용하는 유일한 영속성 경계
///
/// 로컬/원격 복제본은 이 추상화 뒤에서 최종 일관성을 유지한다.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// 사용자 설정 조회 (없으면 `None`)
    async fn get_user_settings(&self, user_id: &str) -> Result<Option<UserSettings>, CoreError>;

    /// 사용자 설정 저장: 같은 내용을 두 번 저장해도 추가 효과 없음
    async fn save_user_settings(&self, settings: &UserSettings) -> Result<(), CoreError>;

    /// 원격과 동기화 후 동기화된 설정 반환
    ///
    /// 원격 실패는 반환된 설정의 `sync_status`(ERROR/CONFLICT)로 표현하고,
    /// 로컬 저장소 자체가 실패할 때만 `Err`를 반환한다.
    async fn sync_settings(&self, user_id: &str) -> Result<UserSettings, CoreError>;

    /// 사용자 설정 삭제
    async fn clear_settings(&self, user_id: &str) -> Result<(), CoreError>;
}

/// 단일 복제본(로컬 DB 또는 원격 문서 저장소)에 대한 원시 저장 인터페이스
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<Option<UserSettings>, CoreError>;

    async fn store(&self, settings: &UserSettings) -> Result<(), CoreError>;

    async fn remove(&self, user_id: &str) -> Result<(), CoreError>;
}

/// 설정 백업 저장소
#[async_trait]
pub trait BackupStore: Send + Sync {
    async fn save_backup(&self, backup: &SettingsBackup) -> Result<(), CoreError>;

    async fn get_backup(&self, backup_id: &str) -> Result<Option<SettingsBackup>, CoreError>;

    /// 사용자 백업 목록 (최신순)
    async fn list_backups(&self, user_id: &str) -> Result<Vec<SettingsBackup>, CoreError>;

    async fn delete_backup(&self, backup_id: &str) -> Result<(), CoreError>;
}
