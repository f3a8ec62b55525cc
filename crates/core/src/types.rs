//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입

use std::fmt;

use serde::{Deserialize, Serialize};

/// 식별 신뢰도
///
/// 증거 분석 레이어가 의존성으로부터 CPE를 유도할 때 산정한 확신 수준입니다.
/// `Ord` 구현으로 신뢰도 비교가 가능합니다 (`Low < Medium < High < Highest`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Confidence {
    /// 낮음 — 파일명 등 약한 증거에서 유도됨
    Low,
    /// 중간
    #[default]
    Medium,
    /// 높음
    High,
    /// 최고 — 매니페스트 좌표 등 결정적 증거
    Highest,
}

impl Confidence {
    /// 문자열에서 신뢰도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "highest" => Some(Self::Highest),
            _ => None,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Highest => write!(f, "Highest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_ordering() {
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
        assert!(Confidence::High < Confidence::Highest);
    }

    #[test]
    fn confidence_default_is_medium() {
        assert_eq!(Confidence::default(), Confidence::Medium);
    }

    #[test]
    fn confidence_from_str_loose() {
        assert_eq!(Confidence::from_str_loose("HIGHEST"), Some(Confidence::Highest));
        assert_eq!(Confidence::from_str_loose("med"), Some(Confidence::Medium));
        assert_eq!(Confidence::from_str_loose("unknown"), None);
    }

    #[test]
    fn confidence_serialize_roundtrip() {
        let json = serde_json::to_string(&Confidence::High).unwrap();
        let parsed: Confidence = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Confidence::High);
    }
}
