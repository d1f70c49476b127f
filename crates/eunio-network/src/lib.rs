//! # eunio-network
//!
//! 원격 설정 저장소 네트워크 어댑터.
//! 사용자별 설정 문서를 REST로 조회/업로드/삭제하고,
//! 요청 결과로 온라인/오프라인 상태를 추적한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use eunio_network::{ConnectivityManager, HttpRemoteStore};
//!
//! let connectivity = Arc::new(ConnectivityManager::default());
//! let remote = HttpRemoteStore::new("https://sync.example.com", timeout)?
//!     .with_connectivity(connectivity.clone());
//! ```

pub mod connectivity;
pub mod http_remote;

pub use connectivity::ConnectivityManager;
pub use http_remote::HttpRemoteStore;
