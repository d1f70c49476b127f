//! 단위 체계 관리자.
//!
//! 현재 사용자의 단위 체계(Metric/Imperial)를 캐시하고,
//! 로케일 기반 기본값과 사용자가 직접 고른 값을 구분해서 다룬다.
//! 조회는 실패하지 않으며, 알 수 없으면 Metric으로 떨어진다.

use std::sync::Arc;

use async_trait::async_trait;
use eunio_core::error::CoreError;
use eunio_core::models::units::{UnitPreferences, UnitSystem};
use eunio_core::ports::session::{SessionProvider, UserProfileStore};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

/// Imperial 단위를 기본으로 쓰는 국가 (ISO 3166-1 alpha-2)
pub const IMPERIAL_COUNTRIES: [&str; 7] = ["US", "LR", "MM", "BS", "BZ", "KY", "PW"];

/// 국가 코드의 기본 단위 체계 (대소문자 무시, 목록 외에는 Metric)
pub fn default_system_for_country(country_code: &str) -> UnitSystem {
    let code = country_code.trim();
    if IMPERIAL_COUNTRIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(code))
    {
        UnitSystem::Imperial
    } else {
        UnitSystem::Metric
    }
}

/// 단위 선호 저장 포트.
///
/// 앱에서는 `ManagedUnitPreferences`가 구현하며, 저장은 설정 관리자의 쓰기 경로를 거친다.
#[async_trait]
pub trait UnitPreferencesStore: Send + Sync {
    async fn load_unit_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<UnitPreferences>, CoreError>;

    async fn save_unit_preferences(
        &self,
        user_id: &str,
        preferences: UnitPreferences,
    ) -> Result<(), CoreError>;
}

/// 단위 체계 관리자
pub struct UnitSystemManager {
    session: Arc<dyn SessionProvider>,
    preferences: Arc<dyn UnitPreferencesStore>,
    profile: Option<Arc<dyn UserProfileStore>>,
    /// 확인된 단위 체계 캐시 (None = 아직 모름)
    cache: watch::Sender<Option<UnitSystem>>,
}

impl UnitSystemManager {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        preferences: Arc<dyn UnitPreferencesStore>,
    ) -> Self {
        let (cache, _) = watch::channel(None);
        Self {
            session,
            preferences,
            profile: None,
            cache,
        }
    }

    /// 단위 변경을 사용자 프로필에도 반영
    pub fn with_profile_store(mut self, profile: Arc<dyn UserProfileStore>) -> Self {
        self.profile = Some(profile);
        self
    }

    /// 로그인 사용자 id. 없으면 검증 에러 (저장 시도 전)
    fn require_user(&self) -> Result<String, CoreError> {
        self.session
            .current_user_id()
            .ok_or_else(|| CoreError::validation("userId", "로그인한 사용자가 없습니다"))
    }

    /// 현재 단위 체계. 사용자 없음/저장소 실패/미설정이면 Metric.
    pub async fn get_current_unit_system(&self) -> UnitSystem {
        let cached = *self.cache.borrow();
        if let Some(system) = cached {
            return system;
        }

        let Some(user_id) = self.session.current_user_id() else {
            debug!("로그인 사용자 없음, Metric 사용");
            return UnitSystem::Metric;
        };

        match self.preferences.load_unit_preferences(&user_id).await {
            Ok(Some(prefs)) => {
                let system = prefs.system();
                self.apply_cached(system);
                system
            }
            Ok(None) => UnitSystem::Metric,
            Err(e) => {
                warn!("단위 선호 조회 실패, Metric 사용: {e}");
                UnitSystem::Metric
            }
        }
    }

    /// 단위 체계 저장. 프로필 반영은 실패해도 무시한다.
    pub async fn set_unit_system(
        &self,
        system: UnitSystem,
        is_manually_set: bool,
    ) -> Result<(), CoreError> {
        let user_id = self.require_user()?;

        let preferences = UnitPreferences::for_system(system, is_manually_set);
        self.preferences
            .save_unit_preferences(&user_id, preferences)
            .await?;
        self.mirror_to_profile(&user_id, system).await;
        self.apply_cached(system);

        info!("단위 체계 변경: {system} (manual={is_manually_set})");
        Ok(())
    }

    /// 로케일 기본값 적용. 사용자가 직접 고른 단위는 유지하며, 실패 시 Metric.
    pub async fn initialize_from_locale(&self, country_code: &str) -> UnitSystem {
        match self.try_initialize_from_locale(country_code).await {
            Ok(system) => system,
            Err(e) => {
                warn!("로케일 단위 초기화 실패 ({country_code}), Metric 사용: {e}");
                UnitSystem::Metric
            }
        }
    }

    async fn try_initialize_from_locale(
        &self,
        country_code: &str,
    ) -> Result<UnitSystem, CoreError> {
        let user_id = self.require_user()?;

        if let Some(prefs) = self.preferences.load_unit_preferences(&user_id).await? {
            if prefs.is_manually_set {
                let system = prefs.system();
                debug!("직접 선택한 단위 유지: {system}");
                self.apply_cached(system);
                return Ok(system);
            }
        }

        let system = default_system_for_country(country_code);
        self.set_unit_system(system, false).await?;
        Ok(system)
    }

    /// 사용자 프로필 레코드에 단위 체계 반영 (best-effort)
    pub async fn mirror_to_profile(&self, user_id: &str, system: UnitSystem) {
        if let Some(profile) = &self.profile {
            if let Err(e) = profile.update_unit_system(user_id, system).await {
                warn!("프로필 단위 반영 실패 (무시): {e}");
            }
        }
    }

    /// 단위 체계 변경 스트림 (현재 값이 있으면 즉시 전달)
    pub fn observe_unit_system_changes(&self) -> impl Stream<Item = UnitSystem> + Send + 'static {
        WatchStream::new(self.cache.subscribe()).filter_map(|system| system)
    }

    /// 캐시 비우기 (로그아웃 등)
    pub fn clear_cache(&self) {
        self.cache.send_replace(None);
    }

    /// 이미 저장된 값을 캐시에만 반영 (값이 바뀔 때만 알림)
    pub fn apply_cached(&self, system: UnitSystem) {
        self.cache.send_if_modified(|current| {
            let changed = *current != Some(system);
            *current = Some(system);
            changed
        });
    }
}
