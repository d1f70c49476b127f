//! 원격 설정 저장소 HTTP 클라이언트.
//!
//! `SettingsStore` 포트 구현. `{base}/v1/users/{id}/settings` 문서를
//! GET/PUT/DELETE로 다룬다. 재시도는 호출자(`SyncedSettingsRepository`)가 담당한다.

use async_trait::async_trait;
use eunio_core::config::SyncConfig;
use eunio_core::error::CoreError;
use eunio_core::models::settings::UserSettings;
use eunio_core::ports::repository::SettingsStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::connectivity::ConnectivityManager;

/// Retry-After 헤더가 없을 때의 대기 시간 (초)
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// 원격 설정 저장소: `SettingsStore` 포트 구현
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: reqwest::Url,
    api_token: Option<String>,
    timeout: Duration,
    connectivity: Option<Arc<ConnectivityManager>>,
}

impl HttpRemoteStore {
    /// 새 원격 저장소 클라이언트 생성
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| CoreError::Config(format!("잘못된 서버 URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_token: None,
            timeout,
            connectivity: None,
        })
    }

    /// `SyncConfig`에서 생성 (server_url 미설정이면 None)
    pub fn from_config(config: &SyncConfig) -> Result<Option<Self>, CoreError> {
        let Some(url) = config.server_url.as_deref() else {
            return Ok(None);
        };
        let mut store = Self::new(url, config.request_timeout())?;
        store.api_token = config.api_token.clone();
        Ok(Some(store))
    }

    /// Bearer 토큰 설정
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// 요청 결과를 연결 상태 관리자에 기록
    pub fn with_connectivity(mut self, connectivity: Arc<ConnectivityManager>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    fn settings_url(&self, user_id: &str) -> Result<reqwest::Url, CoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CoreError::Config(format!("베이스 URL로 사용할 수 없음: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v1", "users", user_id, "settings"]);
        Ok(url)
    }

    fn request(
        &self,
        method: reqwest::Method,
        user_id: &str,
    ) -> Result<reqwest::RequestBuilder, CoreError> {
        let url = self.settings_url(user_id)?;
        let req = self.client.request(method, url);
        Ok(match &self.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    /// 전송 실패 매핑 + 연결 상태 기록
    async fn send(
        &self,
        operation: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, CoreError> {
        match req.send().await {
            Ok(resp) => {
                if let Some(c) = &self.connectivity {
                    c.record_success();
                }
                Ok(resp)
            }
            Err(e) => {
                if let Some(c) = &self.connectivity {
                    c.record_failure();
                }
                if e.is_timeout() {
                    Err(CoreError::Timeout {
                        operation: operation.to_string(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    })
                } else {
                    Err(CoreError::Network(format!("{operation} 요청 실패: {e}")))
                }
            }
        }
    }

    /// 응답 상태 코드 확인 및 에러 매핑
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, CoreError> {
        let status = resp.status();

        if status.is_success() {
            return Ok(resp);
        }

        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

        let text = resp.text().await.unwrap_or_else(|e| {
            warn!("응답 본문 읽기 실패: {e}");
            String::new()
        });

        match status.as_u16() {
            401 | 403 => Err(CoreError::Auth(format!("인증 실패 ({status}): {text}"))),
            409 => Err(CoreError::Conflict(text)),
            429 => Err(CoreError::RateLimit {
                retry_after_secs: retry_after,
            }),
            502..=504 => Err(CoreError::ServiceUnavailable(text)),
            _ => Err(CoreError::Sync(format!("원격 저장소 에러 ({status}): {text}"))),
        }
    }
}

#[async_trait]
impl SettingsStore for HttpRemoteStore {
    async fn load(&self, user_id: &str) -> Result<Option<UserSettings>, CoreError> {
        debug!("원격 설정 조회: user={user_id}");

        let req = self.request(reqwest::Method::GET, user_id)?;
        let resp = self.send("원격 설정 조회", req).await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("원격 설정 없음: user={user_id}");
            return Ok(None);
        }

        let resp = Self::check_response(resp).await?;
        let body = resp
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("응답 본문 읽기 실패: {e}")))?;

        let settings: UserSettings = serde_json::from_str(&body)
            .map_err(|e| CoreError::Sync(format!("원격 설정 파싱 실패: {e}")))?;
        Ok(Some(settings))
    }

    async fn store(&self, settings: &UserSettings) -> Result<(), CoreError> {
        debug!(
            "원격 설정 업로드: user={} v{}",
            settings.user_id, settings.version
        );

        let req = self
            .request(reqwest::Method::PUT, &settings.user_id)?
            .json(settings);
        let resp = self.send("원격 설정 업로드", req).await?;
        Self::check_response(resp).await?;
        Ok(())
    }

    async fn remove(&self, user_id: &str) -> Result<(), CoreError> {
        debug!("원격 설정 삭제: user={user_id}");

        let req = self.request(reqwest::Method::DELETE, user_id)?;
        let resp = self.send("원격 설정 삭제", req).await?;

        // 이미 없는 문서 삭제는 성공으로 간주
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check_response(resp).await?;
        Ok(())
    }
}
