//! Eunio 설정 도메인 모델.
//!
//! 6개 선호 그룹 값 객체와 집계 루트 `UserSettings`를 정의한다.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현하며,
//! 내보내기 형식과 동일한 camelCase 필드명을 사용한다.

pub mod backup;
pub mod notification;
pub mod preferences;
pub mod settings;
pub mod units;
