//! 인증 세션 / 사용자 프로필 포트.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::units::UnitSystem;

/// 현재 로그인 사용자 제공자: 인증 서브시스템은 사용자 ID만 넘겨준다
pub trait SessionProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// 고정 사용자 세션 (세션당 하나의 관리자를 만들 때 사용)
#[derive(Debug, Clone)]
pub struct StaticSession {
    user_id: Option<String>,
}

impl StaticSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// 로그아웃 상태
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }
}

impl SessionProvider for StaticSession {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}

/// 사용자 프로필 레코드 (단위 체계 미러링 대상)
#[async_trait]
pub trait UserProfileStore: Send + Sync {
    async fn update_unit_system(&self, user_id: &str, system: UnitSystem) -> Result<(), CoreError>;
}
