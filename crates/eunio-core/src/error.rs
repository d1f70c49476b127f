//! Eunio 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 자체 실패를 `CoreError`로 매핑해서 반환한다.

use std::fmt;

use thiserror::Error;

/// 단일 필드 검증 위반
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// 위반 필드 경로 (예: "cyclePreferences.averageCycleLength")
    pub field: String,
    /// 위반 사유
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 입력값 검증 실패: 발견된 모든 위반을 담는다
    #[error("유효성 검증 실패, {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// 로컬/원격 저장소 실패
    #[error("저장소 에러: {0}")]
    Persistence(String),

    /// 작업 타임아웃
    #[error("{operation} 타임아웃: {timeout_ms}ms 초과")]
    Timeout {
        /// 타임아웃된 작업 이름
        operation: String,
        /// 초과된 타임아웃 (밀리초)
        timeout_ms: u64,
    },

    /// 알림 예약/취소 실패
    #[error("알림 에러: {0}")]
    Notification(String),

    /// 플랫폼 알림 권한 거부
    #[error("알림 권한 거부: {0}")]
    PermissionDenied(String),

    /// 일부 알림 유형만 예약 실패 (나머지는 예약됨)
    #[error("알림 일부 예약 실패: {}", .failed.join(", "))]
    PartialSchedule {
        /// 예약에 실패한 알림 유형
        failed: Vec<String>,
    },

    /// 원격 동기화 실패
    #[error("동기화 에러: {0}")]
    Sync(String),

    /// 원격과 로컬 변경 충돌
    #[error("동기화 충돌: {0}")]
    Conflict(String),

    /// 내보내기/가져오기 페이로드 오류
    #[error("내보내기 형식 에러: {0}")]
    Export(String),

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "UserSettings", "SettingsBackup")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 인증 실패 (원격 저장소 토큰 오류 등)
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// Rate Limit 초과 (429)
    #[error("요청 한도 초과, {retry_after_secs}초 후 재시도")]
    RateLimit {
        /// 재시도 대기 시간 (초)
        retry_after_secs: u64,
    },

    /// 서비스 일시 불가 (503)
    #[error("서비스 일시 불가: {0}")]
    ServiceUnavailable(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 단일 위반으로 검증 에러 생성
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldViolation::new(field, message)])
    }

    /// 검증 위반 목록 (검증 에러가 아니면 빈 슬라이스)
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Validation(violations) => violations,
            _ => &[],
        }
    }

    /// 원격 호출 재시도 가능 여부
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::ServiceUnavailable(_)
                | Self::RateLimit { .. }
                | Self::Timeout { .. }
        )
    }
}
