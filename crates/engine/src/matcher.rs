//! 매칭 엔진
//!
//! 쿼리 CPE가 저장된 취약 소프트웨어 레코드에 해당하는지 판정하는
//! 순수 함수들입니다. 저장소 접근이나 쓰기가 없으므로 제한 없이
//! 동시 호출해도 안전합니다.
//!
//! # 매칭 규칙
//!
//! - **속성 매칭**: 후보의 비-ANY/비-NA 속성은 쿼리의 대응 속성과
//!   일치해야 합니다. ANY는 어느 쪽이든 모든 값과 매칭, NA는 NA끼리만
//!   매칭합니다. 후보 리터럴의 선행/후행 와일드카드(`*`, `?`)를
//!   지원합니다.
//! - **범위 매칭**: 후보가 경계를 하나라도 선언하면 쿼리의 버전이
//!   선언된 모든 경계를 [`compare_versions`] 기준으로 만족해야 하며,
//!   경계가 없으면 후보 자신의 version 속성과 정확히 매칭해야 합니다.

use std::cmp::Ordering;

use metrics::counter;
use tracing::trace;

use matchlock_core::metrics::MATCHER_CANDIDATES_EVALUATED_TOTAL;

use crate::cpe::{Attribute, Cpe, Part};
use crate::vuln::version::compare_versions;
use crate::vuln::VulnerableSoftware;

/// 쿼리가 매칭하는 모든 후보를 입력 순서대로 반환합니다.
///
/// 표시 순서가 필요하면 호출자가 [`VulnerableSoftware`]의 `Ord`로
/// 재정렬합니다.
pub fn evaluate<'a>(query: &Cpe, candidates: &'a [VulnerableSoftware]) -> Vec<&'a VulnerableSoftware> {
    counter!(MATCHER_CANDIDATES_EVALUATED_TOTAL).increment(candidates.len() as u64);
    candidates
        .iter()
        .filter(|candidate| {
            let hit = matches(query, candidate);
            if hit {
                trace!(candidate = %candidate, "query matched vulnerable software record");
            }
            hit
        })
        .collect()
}

/// 쿼리 CPE가 후보 레코드 하나에 매칭하는지 판정합니다.
pub fn matches(query: &Cpe, candidate: &VulnerableSoftware) -> bool {
    let c = candidate.cpe();
    if !part_matches(c.part(), query.part()) {
        return false;
    }

    // version(인덱스 2)은 범위 로직이 대신 판정
    let c_components = c.components();
    let q_components = query.components();
    for (i, (cand, qry)) in c_components.iter().zip(q_components.iter()).enumerate() {
        if i == 2 {
            continue;
        }
        if !attribute_matches(cand, qry) {
            return false;
        }
    }

    if candidate.has_range() {
        range_matches(query.version(), candidate)
    } else {
        attribute_matches(c.version(), query.version())
    }
}

fn part_matches(candidate: Part, query: Part) -> bool {
    candidate == Part::Any || query == Part::Any || candidate == query
}

/// 단일 속성 매칭. ANY는 모든 값, NA는 NA끼리만.
fn attribute_matches(candidate: &Attribute, query: &Attribute) -> bool {
    match (candidate, query) {
        (Attribute::Any, _) | (_, Attribute::Any) => true,
        (Attribute::Na, Attribute::Na) => true,
        (Attribute::Na, _) | (_, Attribute::Na) => false,
        (Attribute::Value(c), Attribute::Value(q)) => wildcard_matches(c, q),
    }
}

/// 후보 리터럴의 선행/후행 와일드카드를 해석해 쿼리 리터럴과
/// 비교합니다. `*`는 임의 길이, `?`는 0~1 문자입니다.
fn wildcard_matches(candidate_wf: &str, query_wf: &str) -> bool {
    let (lead, core_wf, trail) = split_wildcards(candidate_wf);
    let core = unescape(core_wf);
    let query = unescape(query_wf);

    if lead == Wildcard::None && trail == Wildcard::None {
        return core == query;
    }

    // core가 쿼리 안에서 차지할 위치를 와일드카드 종류에 맞춰 검사
    let qlen = query.chars().count();
    let clen = core.chars().count();
    if clen > qlen {
        return false;
    }

    match (lead, trail) {
        (Wildcard::None, _) => {
            query.starts_with(&core) && trail.admits(qlen - clen)
        }
        (_, Wildcard::None) => {
            query.ends_with(&core) && lead.admits(qlen - clen)
        }
        (_, _) => {
            // 양쪽 와일드카드: core가 부분 문자열이면서 남는 길이가 허용 범위
            query.contains(&core)
                && match (lead.max_len(), trail.max_len()) {
                    (Some(a), Some(b)) => qlen - clen <= a + b,
                    _ => true,
                }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wildcard {
    None,
    /// `*` — 임의 길이
    Star,
    /// `?` n개 — 최대 n 문자
    Question(usize),
}

impl Wildcard {
    fn admits(self, extra: usize) -> bool {
        match self {
            Self::None => extra == 0,
            Self::Star => true,
            Self::Question(n) => extra <= n,
        }
    }

    fn max_len(self) -> Option<usize> {
        match self {
            Self::None => Some(0),
            Self::Star => None,
            Self::Question(n) => Some(n),
        }
    }
}

/// well-formed 리터럴을 (선행 와일드카드, 본문, 후행 와일드카드)로
/// 분해합니다. 본문의 이스케이프는 보존됩니다.
fn split_wildcards(wf: &str) -> (Wildcard, &str, Wildcard) {
    let bytes = wf.as_bytes();

    let (lead, start) = if bytes.first() == Some(&b'*') {
        (Wildcard::Star, 1)
    } else {
        let mut n = 0;
        while bytes.get(n) == Some(&b'?') {
            n += 1;
        }
        let lead = if n > 0 { Wildcard::Question(n) } else { Wildcard::None };
        (lead, n)
    };

    let mut end = bytes.len();
    let trail = if end > start && bytes[end - 1] == b'*' && !is_escaped(bytes, end - 1) {
        end -= 1;
        Wildcard::Star
    } else {
        let mut n = 0;
        while end > start && bytes[end - 1] == b'?' && !is_escaped(bytes, end - 1) {
            end -= 1;
            n += 1;
        }
        if n > 0 { Wildcard::Question(n) } else { Wildcard::None }
    };

    (lead, &wf[start..end], trail)
}

/// `bytes[i]` 앞의 연속 백슬래시 개수가 홀수면 이스케이프된 문자입니다.
fn is_escaped(bytes: &[u8], i: usize) -> bool {
    let mut count = 0;
    let mut j = i;
    while j > 0 && bytes[j - 1] == b'\\' {
        count += 1;
        j -= 1;
    }
    count % 2 == 1
}

/// well-formed 리터럴에서 백슬래시 이스케이프를 풀어 논리 값을 얻습니다.
fn unescape(wf: &str) -> String {
    let mut out = String::with_capacity(wf.len());
    let mut escaped = false;
    for ch in wf.chars() {
        if escaped {
            out.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else {
            out.push(ch);
        }
    }
    out
}

/// 쿼리 버전이 선언된 모든 경계를 만족하는지 검사합니다.
/// 쿼리 버전이 구체적 값이 아니면 범위 판정은 실패합니다.
fn range_matches(query_version: &Attribute, candidate: &VulnerableSoftware) -> bool {
    let Attribute::Value(version_wf) = query_version else {
        return false;
    };
    let version = unescape(version_wf);

    if let Some(b) = candidate.version_start_including() {
        if compare_versions(&version, b) == Ordering::Less {
            return false;
        }
    }
    if let Some(b) = candidate.version_start_excluding() {
        if compare_versions(&version, b) != Ordering::Greater {
            return false;
        }
    }
    if let Some(b) = candidate.version_end_including() {
        if compare_versions(&version, b) == Ordering::Greater {
            return false;
        }
    }
    if let Some(b) = candidate.version_end_excluding() {
        if compare_versions(&version, b) != Ordering::Less {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpe::builder::CpeBuilder;
    use crate::vuln::VulnerableSoftwareBuilder;

    fn query(vendor: &str, product: &str, version: &str) -> Cpe {
        CpeBuilder::new()
            .part(Part::Application)
            .vendor(vendor)
            .product(product)
            .version(version)
            .build()
            .unwrap()
    }

    fn ranged(
        vendor: &str,
        product: &str,
        build: impl FnOnce(VulnerableSoftwareBuilder) -> VulnerableSoftwareBuilder,
    ) -> VulnerableSoftware {
        let cpe = CpeBuilder::new()
            .part(Part::Application)
            .vendor(vendor)
            .product(product)
            .build()
            .unwrap();
        build(VulnerableSoftwareBuilder::new(cpe)).build().unwrap()
    }

    #[test]
    fn exact_instance_matches_same_version_only() {
        let cpe = query("apache", "struts", "2.3.1");
        let candidate = VulnerableSoftwareBuilder::new(cpe.clone()).build().unwrap();
        assert!(matches(&cpe, &candidate));
        assert!(!matches(&query("apache", "struts", "2.3.2"), &candidate));
    }

    #[test]
    fn range_inclusive_start_exclusive_end() {
        let candidate = ranged("apache", "struts", |b| {
            b.version_start_including("2.0").version_end_excluding("3.0")
        });
        assert!(matches(&query("apache", "struts", "2.0"), &candidate));
        assert!(matches(&query("apache", "struts", "2.5"), &candidate));
        assert!(!matches(&query("apache", "struts", "3.0"), &candidate));
        assert!(!matches(&query("apache", "struts", "1.9"), &candidate));
    }

    #[test]
    fn range_exclusive_start() {
        let candidate = ranged("apache", "struts", |b| b.version_start_excluding("2.0"));
        assert!(!matches(&query("apache", "struts", "2.0"), &candidate));
        assert!(matches(&query("apache", "struts", "2.0.1"), &candidate));
    }

    #[test]
    fn range_inclusive_end() {
        let candidate = ranged("apache", "struts", |b| b.version_end_including("2.0"));
        assert!(matches(&query("apache", "struts", "2.0"), &candidate));
        assert!(matches(&query("apache", "struts", "1.9"), &candidate));
        assert!(!matches(&query("apache", "struts", "2.0.1"), &candidate));
    }

    #[test]
    fn range_requires_concrete_query_version() {
        let candidate = ranged("apache", "struts", |b| b.version_end_excluding("3.0"));
        let any_version = CpeBuilder::new()
            .part(Part::Application)
            .vendor("apache")
            .product("struts")
            .build()
            .unwrap();
        assert!(!matches(&any_version, &candidate));
    }

    #[test]
    fn vendor_mismatch_fails() {
        let candidate = ranged("apache", "struts", |b| b.version_end_excluding("3.0"));
        assert!(!matches(&query("oracle", "struts", "2.5"), &candidate));
    }

    #[test]
    fn any_candidate_attribute_matches_all() {
        let candidate = ranged("apache", "struts", |b| b.version_end_excluding("3.0"));
        // 후보 update는 ANY — 쿼리 update가 무엇이든 매칭
        let q = CpeBuilder::new()
            .part(Part::Application)
            .vendor("apache")
            .product("struts")
            .version("2.5")
            .update("beta1")
            .build()
            .unwrap();
        assert!(matches(&q, &candidate));
    }

    #[test]
    fn na_matches_only_na() {
        let cpe = CpeBuilder::new()
            .part(Part::Application)
            .vendor("apache")
            .product("struts")
            .version("2.5")
            .update("-")
            .build()
            .unwrap();
        let candidate = VulnerableSoftwareBuilder::new(cpe).build().unwrap();

        let q_na = CpeBuilder::new()
            .part(Part::Application)
            .vendor("apache")
            .product("struts")
            .version("2.5")
            .update("-")
            .build()
            .unwrap();
        assert!(matches(&q_na, &candidate));

        let q_value = CpeBuilder::new()
            .part(Part::Application)
            .vendor("apache")
            .product("struts")
            .version("2.5")
            .update("sp1")
            .build()
            .unwrap();
        assert!(!matches(&q_value, &candidate));
    }

    #[test]
    fn trailing_star_wildcard() {
        let cpe = CpeBuilder::new()
            .part(Part::Application)
            .vendor("microsoft")
            .product("internet_explorer*")
            .version("8.0")
            .build()
            .unwrap();
        let candidate = VulnerableSoftwareBuilder::new(cpe).build().unwrap();
        assert!(matches(
            &query("microsoft", "internet_explorer_beta", "8.0"),
            &candidate
        ));
        assert!(!matches(&query("microsoft", "edge", "8.0"), &candidate));
    }

    #[test]
    fn leading_star_wildcard() {
        let cpe = CpeBuilder::new()
            .part(Part::Application)
            .vendor("acme")
            .product("*server")
            .version("1.0")
            .build()
            .unwrap();
        let candidate = VulnerableSoftwareBuilder::new(cpe).build().unwrap();
        assert!(matches(&query("acme", "web_server", "1.0"), &candidate));
        assert!(!matches(&query("acme", "server_pro", "1.0"), &candidate));
    }

    #[test]
    fn question_wildcard_is_zero_or_one() {
        let cpe = CpeBuilder::new()
            .part(Part::Application)
            .vendor("acme")
            .product("server?")
            .version("1.0")
            .build()
            .unwrap();
        let candidate = VulnerableSoftwareBuilder::new(cpe).build().unwrap();
        assert!(matches(&query("acme", "server", "1.0"), &candidate));
        assert!(matches(&query("acme", "server2", "1.0"), &candidate));
        assert!(!matches(&query("acme", "server22", "1.0"), &candidate));
    }

    #[test]
    fn part_mismatch_fails() {
        let cpe = CpeBuilder::new()
            .part(Part::OperatingSystem)
            .vendor("linux")
            .product("linux_kernel")
            .version("5.15")
            .build()
            .unwrap();
        let candidate = VulnerableSoftwareBuilder::new(cpe).build().unwrap();
        assert!(!matches(&query("linux", "linux_kernel", "5.15"), &candidate));
    }

    #[test]
    fn evaluate_preserves_input_order() {
        let a = ranged("apache", "struts", |b| b.version_end_excluding("3.0"));
        let b = ranged("apache", "tomcat", |b| b.version_end_excluding("10.0"));
        let c = ranged("apache", "struts", |b| b.version_end_excluding("2.6"));
        let candidates = vec![a.clone(), b, c.clone()];

        let hits = evaluate(&query("apache", "struts", "2.5"), &candidates);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0], &a);
        assert_eq!(hits[1], &c);
    }
}
