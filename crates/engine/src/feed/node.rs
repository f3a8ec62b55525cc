//! AND/OR 구성 트리와 평탄화
//!
//! 피드의 구성 섹션은 리프 매치 술어 위에 AND/OR 불리언 트리를
//! 얹습니다. 여기서는 트리를 태그드 유니언으로 표현하고, 깊이 우선
//! 순회로 모든 리프 술어를 수집해 평탄화합니다.
//!
//! 평탄화는 AND/OR 구분을 의도적으로 버립니다. 매칭 엔진은 평탄화된
//! 집합을 "하나라도 일치하면 매칭"으로 취급하므로, AND 전용 구성에서는
//! 과잉 매칭할 수 있는 보수적 근사입니다. 전체 불리언 평가로 "고치지"
//! 않습니다.

use super::model::{RawNode, RawPredicate};

/// 리프 매치 술어 — 후보 CPE 문자열과 버전 경계
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPredicate {
    pub cpe23_uri: Option<String>,
    pub cpe22_uri: Option<String>,
    pub version_start_including: Option<String>,
    pub version_start_excluding: Option<String>,
    pub version_end_including: Option<String>,
    pub version_end_excluding: Option<String>,
    pub vulnerable: bool,
}

impl From<RawPredicate> for MatchPredicate {
    fn from(raw: RawPredicate) -> Self {
        Self {
            cpe23_uri: raw.cpe23_uri,
            cpe22_uri: raw.cpe22_uri,
            version_start_including: raw.version_start_including,
            version_start_excluding: raw.version_start_excluding,
            version_end_including: raw.version_end_including,
            version_end_excluding: raw.version_end_excluding,
            vulnerable: raw.vulnerable,
        }
    }
}

/// 구성 트리 노드
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigNode {
    /// 리프 술어 묶음
    Leaf(Vec<MatchPredicate>),
    /// 모든 자식이 참이어야 하는 노드
    And(Vec<ConfigNode>),
    /// 자식 중 하나만 참이면 되는 노드
    Or(Vec<ConfigNode>),
}

impl ConfigNode {
    /// 깊이 우선 순회로 모든 리프 술어를 수집합니다.
    pub fn flatten(&self) -> Vec<&MatchPredicate> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a MatchPredicate>) {
        match self {
            Self::Leaf(predicates) => out.extend(predicates.iter()),
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect(out);
                }
            }
        }
    }
}

impl From<RawNode> for ConfigNode {
    /// 와이어 노드를 태그드 유니언으로 변환합니다.
    ///
    /// 피드에는 자식과 술어를 동시에 가진 노드가 실제로 존재합니다.
    /// 이 경우 술어 묶음을 리프 자식으로 앞에 끼워 넣습니다.
    fn from(raw: RawNode) -> Self {
        let predicates: Vec<MatchPredicate> =
            raw.cpe_match.into_iter().map(MatchPredicate::from).collect();

        if raw.children.is_empty() {
            return Self::Leaf(predicates);
        }

        let mut children: Vec<ConfigNode> = Vec::with_capacity(raw.children.len() + 1);
        if !predicates.is_empty() {
            children.push(Self::Leaf(predicates));
        }
        children.extend(raw.children.into_iter().map(ConfigNode::from));

        match raw.operator.as_deref() {
            Some(op) if op.eq_ignore_ascii_case("and") => Self::And(children),
            _ => Self::Or(children),
        }
    }
}
