//! 주기/개인정보/화면/동기화 선호 그룹.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FieldViolation;

// ============================================================
// 주기 선호
// ============================================================

/// 평균 주기 길이 허용 범위 (일)
pub const CYCLE_LENGTH_RANGE: RangeInclusive<u32> = 21..=45;
/// 황체기 길이 허용 범위 (일)
pub const LUTEAL_PHASE_RANGE: RangeInclusive<u32> = 10..=16;
/// 생리 기간 허용 범위 (일)
pub const PERIOD_DURATION_RANGE: RangeInclusive<u32> = 1..=8;

/// 주기 선호 그룹
///
/// 범위를 벗어난 값은 보정하지 않고 거부한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CyclePreferences {
    pub average_cycle_length: u32,
    pub average_luteal_phase_length: u32,
    pub period_duration: u32,
    pub is_customized: bool,
}

impl Default for CyclePreferences {
    fn default() -> Self {
        Self {
            average_cycle_length: 28,
            average_luteal_phase_length: 14,
            period_duration: 5,
            is_customized: false,
        }
    }
}

fn check_range(
    field: &str,
    value: u32,
    range: &RangeInclusive<u32>,
    violations: &mut Vec<FieldViolation>,
) {
    if !range.contains(&value) {
        violations.push(FieldViolation::new(
            format!("cyclePreferences.{field}"),
            format!(
                "{}~{}일 범위여야 합니다 (입력: {value})",
                range.start(),
                range.end()
            ),
        ));
    }
}

impl CyclePreferences {
    pub fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        check_range(
            "averageCycleLength",
            self.average_cycle_length,
            &CYCLE_LENGTH_RANGE,
            &mut violations,
        );
        check_range(
            "averageLutealPhaseLength",
            self.average_luteal_phase_length,
            &LUTEAL_PHASE_RANGE,
            &mut violations,
        );
        check_range(
            "periodDuration",
            self.period_duration,
            &PERIOD_DURATION_RANGE,
            &mut violations,
        );
        violations
    }
}

// ============================================================
// 개인정보 선호
// ============================================================

/// 개인정보 선호 그룹: 서로 독립적인 토글
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyPreferences {
    pub data_sharing_enabled: bool,
    pub anonymous_analytics_enabled: bool,
    pub crash_reporting_enabled: bool,
    pub research_participation_enabled: bool,
}

impl Default for PrivacyPreferences {
    fn default() -> Self {
        Self {
            data_sharing_enabled: false,
            anonymous_analytics_enabled: false,
            crash_reporting_enabled: true,
            research_participation_enabled: false,
        }
    }
}

impl PrivacyPreferences {
    pub fn validate(&self) -> Vec<FieldViolation> {
        Vec::new()
    }
}

// ============================================================
// 화면 선호
// ============================================================

/// 글자 크기 배율 최소값
pub const MIN_TEXT_SIZE_SCALE: f64 = 0.8;
/// 글자 크기 배율 최대값
pub const MAX_TEXT_SIZE_SCALE: f64 = 2.0;

/// 햅틱 강도
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HapticIntensity {
    Disabled,
    Light,
    #[default]
    Medium,
    Strong,
}

/// 화면 선호 그룹
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPreferences {
    pub text_size_scale: f64,
    pub high_contrast_mode: bool,
    pub haptic_feedback_enabled: bool,
    pub haptic_intensity: HapticIntensity,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            text_size_scale: 1.0,
            high_contrast_mode: false,
            haptic_feedback_enabled: true,
            haptic_intensity: HapticIntensity::Medium,
        }
    }
}

impl DisplayPreferences {
    pub fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();

        // NaN은 범위 비교에서 항상 false
        if !(MIN_TEXT_SIZE_SCALE..=MAX_TEXT_SIZE_SCALE).contains(&self.text_size_scale) {
            violations.push(FieldViolation::new(
                "displayPreferences.textSizeScale",
                format!(
                    "{MIN_TEXT_SIZE_SCALE}~{MAX_TEXT_SIZE_SCALE} 범위여야 합니다 (입력: {})",
                    self.text_size_scale
                ),
            ));
        }

        // 햅틱이 꺼져 있으면 강도도 Disabled (켜진 경우는 어떤 강도든 허용)
        if !self.haptic_feedback_enabled && self.haptic_intensity != HapticIntensity::Disabled {
            violations.push(FieldViolation::new(
                "displayPreferences.hapticIntensity",
                "햅틱 피드백이 꺼져 있으면 강도는 DISABLED여야 합니다",
            ));
        }

        violations
    }
}

// ============================================================
// 동기화 선호
// ============================================================

/// 동기화 선호 그룹
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPreferences {
    pub auto_sync_enabled: bool,
    pub wifi_only_sync: bool,
    pub cloud_backup_enabled: bool,
    /// 마지막 성공 동기화 시각
    pub last_sync_time: Option<DateTime<Utc>>,
}

impl Default for SyncPreferences {
    fn default() -> Self {
        Self {
            auto_sync_enabled: true,
            wifi_only_sync: false,
            cloud_backup_enabled: true,
            last_sync_time: None,
        }
    }
}

impl SyncPreferences {
    pub fn validate(&self) -> Vec<FieldViolation> {
        Vec::new()
    }
}
