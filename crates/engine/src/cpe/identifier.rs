//! 증거 기반 CPE 식별자
//!
//! 상위 분석기 레이어가 vendor/product/version 증거에서 도출한 CPE에
//! 신뢰도와 출처를 덧붙인 타입입니다. 동등성과 순서는 속성 튜플만으로
//! 판정합니다 — 신뢰도나 URL이 달라도 같은 튜플이면 같은 식별자입니다.
//! 표시 정렬에서 튜플이 같은 항목의 타이브레이크가 필요하면
//! [`CpeIdentifier::display_cmp`]를 사용합니다.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use matchlock_core::types::Confidence;

use super::Cpe;

/// CPE 식별자 + 신뢰도 + 출처
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpeIdentifier {
    cpe: Cpe,
    confidence: Confidence,
    url: Option<String>,
    note: Option<String>,
}

impl CpeIdentifier {
    pub fn new(cpe: Cpe, confidence: Confidence) -> Self {
        Self {
            cpe,
            confidence,
            url: None,
            note: None,
        }
    }

    /// 출처 URL을 설정합니다.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// 자유 텍스트 메모를 설정합니다.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn cpe(&self) -> &Cpe {
        &self.cpe
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// 표시용 정렬: 튜플 → URL → 신뢰도 순 비교.
    ///
    /// `Ord`와 달리 메타데이터까지 본 순서이므로 리포트 출력의
    /// 안정 정렬에만 사용합니다.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.cpe
            .cmp(&other.cpe)
            .then_with(|| self.url.cmp(&other.url))
            .then_with(|| self.confidence.cmp(&other.confidence))
    }
}

impl PartialEq for CpeIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.cpe == other.cpe
    }
}

impl Eq for CpeIdentifier {}

impl PartialOrd for CpeIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CpeIdentifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cpe.cmp(&other.cpe)
    }
}

impl Hash for CpeIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cpe.hash(state);
    }
}

impl fmt::Display for CpeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.cpe.to_canonical(), self.confidence)
    }
}
