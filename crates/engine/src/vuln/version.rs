//! 컴포넌트 단위 버전 비교
//!
//! SemVer가 아닙니다. `.` `-` `_`로 분할한 컴포넌트를 왼쪽부터
//! 비교하며, 양쪽이 모두 숫자면 수치 비교, 아니면 사전식 비교입니다.
//! 짧은 쪽은 빈 컴포넌트로 패딩된 것으로 취급하고, 빈 컴포넌트는
//! 어떤 비어 있지 않은 컴포넌트보다 먼저 정렬됩니다. 따라서
//! `1.9 < 1.10`, `2.0 < 2.0.1`, 그리고 `1.0 < 1.0.0`입니다.

use std::cmp::Ordering;

/// 두 버전 문자열을 비교합니다.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let lhs: Vec<&str> = split_components(left);
    let rhs: Vec<&str> = split_components(right);
    let len = lhs.len().max(rhs.len());

    for i in 0..len {
        let l = lhs.get(i).copied().unwrap_or("");
        let r = rhs.get(i).copied().unwrap_or("");
        let ord = compare_component(l, r);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn split_components(version: &str) -> Vec<&str> {
    version.split(['.', '-', '_']).collect()
}

fn compare_component(l: &str, r: &str) -> Ordering {
    // 빈 컴포넌트(패딩 포함)는 항상 먼저
    match (l.is_empty(), r.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }

    if is_numeric(l) && is_numeric(r) {
        compare_numeric(l, r)
    } else {
        l.cmp(r)
    }
}

fn is_numeric(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// 임의 길이 숫자열의 수치 비교. 선행 0을 제거한 뒤 자릿수, 그다음
/// 사전식으로 비교하므로 정수 오버플로가 없습니다.
fn compare_numeric(l: &str, r: &str) -> Ordering {
    let l = l.trim_start_matches('0');
    let r = r.trim_start_matches('0');
    l.len().cmp(&r.len()).then_with(|| l.cmp(r))
}
