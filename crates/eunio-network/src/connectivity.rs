//! 원격 저장소 연결 상태 추적.
//!
//! `HttpRemoteStore`의 요청 결과로 온라인/오프라인을 판정하고,
//! 상태 전환을 `watch::Receiver<bool>`로 내보낸다.
//! 설정 관리자는 이 수신기로 연결 복구 시 동기화를 시작한다.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// 기본 오프라인 전환 임계값 (연속 실패 횟수)
const DEFAULT_OFFLINE_THRESHOLD: u64 = 3;

/// 연결 상태 관리자
pub struct ConnectivityManager {
    /// 연속 실패 횟수
    failure_count: AtomicU64,
    /// 온라인 상태 브로드캐스트 (true = 온라인)
    online_tx: watch::Sender<bool>,
    /// 오프라인 전환 임계값
    offline_threshold: u64,
    /// 강제 오프라인 모드
    force_offline: AtomicBool,
}

impl ConnectivityManager {
    /// `offline_threshold`: 이 횟수만큼 연속 실패하면 오프라인 전환
    pub fn new(offline_threshold: u64) -> Self {
        let (online_tx, _) = watch::channel(true);
        Self {
            failure_count: AtomicU64::new(0),
            online_tx,
            offline_threshold: offline_threshold.max(1),
            force_offline: AtomicBool::new(false),
        }
    }

    /// 강제 오프라인 모드 설정 (해제 시에는 다음 성공 요청에서 온라인 복귀)
    pub fn set_force_offline(&self, force: bool) {
        self.force_offline.store(force, Ordering::Relaxed);
        if force {
            self.set_online(false);
            info!("강제 오프라인 모드 활성화");
        }
    }

    pub fn is_online(&self) -> bool {
        !self.force_offline.load(Ordering::Relaxed) && *self.online_tx.borrow()
    }

    /// 온라인 상태 수신기 (현재 값 포함)
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.online_tx.subscribe()
    }

    /// 요청 성공 기록: 실패 카운터 리셋, 필요 시 온라인 전환
    pub fn record_success(&self) {
        if self.force_offline.load(Ordering::Relaxed) {
            return;
        }

        self.failure_count.store(0, Ordering::Relaxed);
        if self.set_online(true) {
            info!("원격 저장소 연결 복구됨 - 온라인");
        }
    }

    /// 요청 실패 기록: 임계값 도달 시 오프라인 전환
    pub fn record_failure(&self) {
        if self.force_offline.load(Ordering::Relaxed) {
            return;
        }

        let count = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("연결 실패 기록 (연속 {count}회)");

        if count >= self.offline_threshold && self.set_online(false) {
            warn!("연속 {count}회 실패 - 오프라인 전환 (설정은 로컬에만 저장)");
        }
    }

    /// 값이 실제로 바뀐 경우에만 구독자에게 알림
    fn set_online(&self, online: bool) -> bool {
        self.online_tx.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        })
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }
}

impl Default for ConnectivityManager {
    fn default() -> Self {
        Self::new(DEFAULT_OFFLINE_THRESHOLD)
    }
}
