//! # eunio-storage
//!
//! 로컬 저장소 어댑터.
//! SQLite 기반 사용자 설정 저장, 설정 백업 스냅샷,
//! 로컬/원격 복제본을 묶는 동기화 Repository를 제공한다.
//!
//! ## 모듈
//! - `sqlite`: 설정/백업 저장소 (SettingsStore, BackupStore 구현)
//! - `synced`: last-write-wins 동기화 Repository (SettingsRepository 구현)
//! - `migration`: 스키마 마이그레이션

pub mod migration;
pub mod sqlite;
pub mod synced;

pub use sqlite::SqliteStorage;
pub use synced::{RetryPolicy, SyncedSettingsRepository};
