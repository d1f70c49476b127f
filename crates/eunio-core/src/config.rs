//! 애플리케이션 설정 구조체.
//!
//! 로컬 저장소 경로, 원격 동기화, 영속성 타임아웃, 백업 보존 개수 등
//! 런타임 설정을 정의한다. `ConfigManager`가 JSON 파일에서 로드한다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 로컬 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 원격 동기화 설정
    #[serde(default)]
    pub sync: SyncConfig,
    /// 설정 저장 경로 타임아웃
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// 백업 보존 설정
    #[serde(default)]
    pub backup: BackupConfig,
}

// ============================================================
// 로컬 저장소
// ============================================================

/// 로컬 저장소 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite DB 파일 경로 (None이면 플랫폼 기본 경로)
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

// ============================================================
// 원격 동기화
// ============================================================

/// 원격 문서 저장소 동기화 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// 원격 저장소 URL (None이면 로컬 전용)
    #[serde(default)]
    pub server_url: Option<String>,
    /// Bearer 토큰
    #[serde(default)]
    pub api_token: Option<String>,
    /// 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// 동기화 재시도 횟수
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 첫 재시도 대기 (밀리초), 이후 2배씩 증가
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// 재시도 대기 상한 (밀리초)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            api_token: None,
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl SyncConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

// ============================================================
// 영속성
// ============================================================

/// 설정 저장 경로 설정: 단일 시도, 재시도 없음
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// 저장/조회 타임아웃 (밀리초)
    #[serde(default = "default_persistence_timeout_ms")]
    pub timeout_ms: u64,
    /// 동기화 전체 타임아웃 (밀리초, 재시도 포함)
    #[serde(default = "default_sync_timeout_ms")]
    pub sync_timeout_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_persistence_timeout_ms(),
            sync_timeout_ms: default_sync_timeout_ms(),
        }
    }
}

impl PersistenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_timeout_ms)
    }
}

fn default_persistence_timeout_ms() -> u64 {
    5_000
}

fn default_sync_timeout_ms() -> u64 {
    60_000
}

// ============================================================
// 백업
// ============================================================

/// 백업 보존 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// 사용자별로 남길 최신 백업 개수
    #[serde(default = "default_retention_count")]
    pub retention_count: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            retention_count: default_retention_count(),
        }
    }
}

fn default_retention_count() -> usize {
    5
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self::default()
    }
}
