//! # eunio-settings
//!
//! 사용자 설정 서브시스템의 애플리케이션 서비스.
//!
//! ## 모듈
//! - [`manager`]: 설정 관리자 (원자적 변경, 변경 스트림, 동기화, 부수 효과)
//! - [`unit_system`]: 단위 체계 캐시 + 로케일 기본값
//! - [`backup`]: 내보내기/가져오기, 스냅샷 백업과 복원
//! - [`notification_bridge`]: 알림 선호 → 플랫폼 예약 명령 번역

pub mod backup;
pub mod manager;
pub mod notification_bridge;
pub mod unit_system;

#[cfg(test)]
mod test_support;

pub use backup::BackupManager;
pub use manager::{ManagedUnitPreferences, SettingsManager, SideEffectWarning, UpdateOutcome};
pub use notification_bridge::NotificationBridge;
pub use unit_system::{UnitPreferencesStore, UnitSystemManager};
