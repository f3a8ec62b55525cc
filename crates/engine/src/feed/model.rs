//! 피드 문서의 serde 스키마
//!
//! 피드 파일의 와이어 형식 그대로를 받는 수동적(transient) 타입입니다.
//! 여기서는 구조만 해석하고, CPE 파싱·검증·평탄화는 [`super::node`]와
//! [`super`]의 몫입니다. 알 수 없는 필드는 무시합니다 — 피드 스키마는
//! 버전마다 부가 필드가 늘어납니다.

use serde::Deserialize;

/// 피드 엔트리 하나 (`CVE-YYYY-NNNN...` 식별자 단위)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawEntry {
    pub id: String,
    #[serde(default)]
    pub weaknesses: Vec<RawWeakness>,
    #[serde(default)]
    pub configurations: RawConfigurations,
}

/// 언어 태그가 붙은 약점 분류 항목
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawWeakness {
    #[serde(default)]
    pub lang: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawConfigurations {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
}

/// AND/OR 구성 트리의 노드
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawNode {
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub children: Vec<RawNode>,
    #[serde(default, rename = "cpeMatch")]
    pub cpe_match: Vec<RawPredicate>,
}

/// 리프 매치 술어
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawPredicate {
    #[serde(default)]
    pub cpe23_uri: Option<String>,
    #[serde(default)]
    pub cpe22_uri: Option<String>,
    #[serde(default)]
    pub version_start_including: Option<String>,
    #[serde(default)]
    pub version_start_excluding: Option<String>,
    #[serde(default)]
    pub version_end_including: Option<String>,
    #[serde(default)]
    pub version_end_excluding: Option<String>,
    #[serde(default = "default_vulnerable")]
    pub vulnerable: bool,
}

fn default_vulnerable() -> bool {
    true
}
