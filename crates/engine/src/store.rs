//! 취약점 저장소 쓰기 계약
//!
//! 피드 파서의 쓰기 경로는 [`VulnerabilityStore::upsert_vulnerability`]
//! 하나로 수렴합니다. 구현체는 취약점 ID별 단일-라이터를 보장해야
//! 합니다 — 겹치는 피드를 연달아 파싱해도 부분 업데이트가 교차하지
//! 않고, 마지막 쓰기가 이기는(last-writer-wins) 결정적 결과가 나와야
//! 합니다.
//!
//! [`MemoryStore`]는 참조 구현입니다. 전체 데이터셋을 메모리에 들고
//! 있어도 되는 테스트·단일 실행 시나리오용이며, 순회는 ID 오름차순과
//! 레코드 전순서로 결정적입니다.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use tracing::debug;

use matchlock_core::error::DatabaseError;

use crate::cpe::Cpe;
use crate::matcher;
use crate::vuln::VulnerableSoftware;

/// 취약점 저장소 쓰기 계약
///
/// `upsert_vulnerability`는 엔트리 하나의 전체 레코드 집합과 약점
/// 분류를 한 번의 호출로 교체합니다. 같은 ID에 대한 동시 호출은
/// 구현체가 직렬화합니다.
pub trait VulnerabilityStore: Send + Sync {
    fn upsert_vulnerability(
        &self,
        id: &str,
        records: Vec<VulnerableSoftware>,
        weaknesses: Vec<String>,
    ) -> Result<(), DatabaseError>;
}

/// 저장된 취약점 하나 — 정렬된 레코드와 중복 제거된 약점 분류
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVulnerability {
    /// 전순서로 정렬된 취약 소프트웨어 레코드
    pub records: Vec<VulnerableSoftware>,
    /// 정렬·중복 제거된 CWE 식별자
    pub weaknesses: Vec<String>,
}

/// 인메모리 참조 저장소
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, StoredVulnerability>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// ID로 저장된 취약점을 조회합니다.
    pub fn get(&self, id: &str) -> Result<Option<StoredVulnerability>, DatabaseError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| DatabaseError::Query(format!("store lock poisoned: {e}")))?;
        Ok(entries.get(id).cloned())
    }

    /// 저장된 모든 취약점 ID를 오름차순으로 반환합니다.
    pub fn ids(&self) -> Result<Vec<String>, DatabaseError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| DatabaseError::Query(format!("store lock poisoned: {e}")))?;
        Ok(entries.keys().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 쿼리 CPE가 매칭하는 취약점 ID와 매칭된 레코드를 반환합니다.
    ///
    /// 읽기 경로: 매칭 판정 자체는 [`matcher`]의 순수 함수에
    /// 위임합니다. 결과는 ID 오름차순입니다.
    pub fn find_matches(
        &self,
        query: &Cpe,
    ) -> Result<Vec<(String, Vec<VulnerableSoftware>)>, DatabaseError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| DatabaseError::Query(format!("store lock poisoned: {e}")))?;
        let mut out = Vec::new();
        for (id, stored) in entries.iter() {
            let hits: Vec<VulnerableSoftware> = matcher::evaluate(query, &stored.records)
                .into_iter()
                .cloned()
                .collect();
            if !hits.is_empty() {
                out.push((id.clone(), hits));
            }
        }
        Ok(out)
    }
}

impl VulnerabilityStore for MemoryStore {
    fn upsert_vulnerability(
        &self,
        id: &str,
        mut records: Vec<VulnerableSoftware>,
        weaknesses: Vec<String>,
    ) -> Result<(), DatabaseError> {
        // 결정적 순회를 위해 저장 전에 정규화
        records.sort();
        let weaknesses: Vec<String> = weaknesses
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut entries = self.entries.write().map_err(|e| DatabaseError::Upsert {
            id: id.to_owned(),
            reason: format!("store lock poisoned: {e}"),
        })?;
        debug!(
            id,
            records = records.len(),
            weaknesses = weaknesses.len(),
            "upserting vulnerability"
        );
        entries.insert(id.to_owned(), StoredVulnerability { records, weaknesses });
        Ok(())
    }
}
