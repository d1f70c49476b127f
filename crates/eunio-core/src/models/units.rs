//! 측정 단위 선호.

use serde::{Deserialize, Serialize};

use crate::error::FieldViolation;

/// 체온 단위
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

/// 체중 단위
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeightUnit {
    #[default]
    Kilograms,
    Pounds,
}

/// 단위 체계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// 체계에 대응하는 (체온, 체중) 단위 쌍
    pub fn units(self) -> (TemperatureUnit, WeightUnit) {
        match self {
            UnitSystem::Metric => (TemperatureUnit::Celsius, WeightUnit::Kilograms),
            UnitSystem::Imperial => (TemperatureUnit::Fahrenheit, WeightUnit::Pounds),
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitSystem::Metric => write!(f, "metric"),
            UnitSystem::Imperial => write!(f, "imperial"),
        }
    }
}

impl std::str::FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            other => Err(format!("알 수 없는 단위 체계: {other}")),
        }
    }
}

/// 단위 선호 그룹
///
/// `is_manually_set`이 false인 동안에는 로케일 기본값으로 덮어쓸 수 있다.
/// 사용자가 직접 고른 값(true)은 자동으로 덮어쓰지 않는다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitPreferences {
    pub temperature_unit: TemperatureUnit,
    pub weight_unit: WeightUnit,
    pub is_manually_set: bool,
}

impl UnitPreferences {
    /// 단위 체계로부터 선호 생성
    pub fn for_system(system: UnitSystem, is_manually_set: bool) -> Self {
        let (temperature_unit, weight_unit) = system.units();
        Self {
            temperature_unit,
            weight_unit,
            is_manually_set,
        }
    }

    /// 현재 단위 체계 (체온 단위 기준)
    pub fn system(&self) -> UnitSystem {
        match self.temperature_unit {
            TemperatureUnit::Celsius => UnitSystem::Metric,
            TemperatureUnit::Fahrenheit => UnitSystem::Imperial,
        }
    }

    /// 단위 조합은 모두 유효하다
    pub fn validate(&self) -> Vec<FieldViolation> {
        Vec::new()
    }
}
