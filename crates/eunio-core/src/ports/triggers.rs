//! 주기/예측 재계산 트리거 포트.
//!
//! 설정 관리자는 예측 서브시스템 전체가 아니라 이 단일 메서드 trait에만 의존한다.

use async_trait::async_trait;

use crate::error::CoreError;

/// 주기 지표 재계산
#[async_trait]
pub trait CycleMetricsTrigger: Send + Sync {
    async fn recalculate_cycle_metrics(&self, user_id: &str) -> Result<(), CoreError>;
}

/// 배란/생리 예측 갱신
#[async_trait]
pub trait PredictionTrigger: Send + Sync {
    async fn update_prediction_with_current_data(&self, user_id: &str) -> Result<(), CoreError>;
}
