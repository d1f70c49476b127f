//! # eunio-app
//!
//! 설정 서브시스템 호스트.
//! 플랫폼 어댑터와 DI 와이어링을 제공하고, `eunio` 바이너리가 이를 사용해 CLI 명령을 실행한다.

pub mod platform;
pub mod wiring;
